use std::borrow::Cow;

use serde::Serialize;

// Column order of each table. Must match the column order of the downstream SQL tables.
pub const NODE_FIELDS: [&str; 8] = ["id", "lat", "lon", "user", "uid", "version", "changeset", "timestamp"];
pub const NODE_TAGS_FIELDS: [&str; 4] = ["id", "key", "value", "type"];
pub const WAY_FIELDS: [&str; 6] = ["id", "user", "uid", "version", "changeset", "timestamp"];
pub const WAY_TAGS_FIELDS: [&str; 4] = ["id", "key", "value", "type"];
pub const WAY_NODES_FIELDS: [&str; 3] = ["id", "node_id", "position"];

/// A record that can be written as one row of an output table.
pub trait TableRow {
    fn fields(&self) -> Vec<Cow<'_, str>>;
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub id: String,
    pub lat: String,
    pub lon: String,
    pub user: String,
    pub uid: String,
    pub version: String,
    pub changeset: String,
    pub timestamp: String,
}

impl TableRow for NodeRecord {
    fn fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            self.id.as_str().into(),
            self.lat.as_str().into(),
            self.lon.as_str().into(),
            self.user.as_str().into(),
            self.uid.as_str().into(),
            self.version.as_str().into(),
            self.changeset.as_str().into(),
            self.timestamp.as_str().into(),
        ]
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct WayRecord {
    pub id: String,
    pub user: String,
    pub uid: String,
    pub version: String,
    pub changeset: String,
    pub timestamp: String,
}

impl TableRow for WayRecord {
    fn fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            self.id.as_str().into(),
            self.user.as_str().into(),
            self.uid.as_str().into(),
            self.version.as_str().into(),
            self.changeset.as_str().into(),
            self.timestamp.as_str().into(),
        ]
    }
}

/// One key/value annotation of a node or way. `id` is the owner's id.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub id: String,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub tag_type: String,
}

impl TableRow for TagRecord {
    fn fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            self.id.as_str().into(),
            self.key.as_str().into(),
            self.value.as_str().into(),
            self.tag_type.as_str().into(),
        ]
    }
}

/// Reference from a way to one of its nodes. Positions of a way are 0..n in document order.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct WayNodeRecord {
    pub id: String,
    pub node_id: String,
    pub position: usize,
}

impl TableRow for WayNodeRecord {
    fn fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            self.id.as_str().into(),
            self.node_id.as_str().into(),
            self.position.to_string().into(),
        ]
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ShapedNode {
    pub node: NodeRecord,
    pub node_tags: Vec<TagRecord>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ShapedWay {
    pub way: WayRecord,
    pub way_nodes: Vec<WayNodeRecord>,
    pub way_tags: Vec<TagRecord>,
}

/// All records produced from a single node or way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapedElement {
    Node(ShapedNode),
    Way(ShapedWay),
}

impl ShapedElement {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ShapedElement::Node(_) => "node",
            ShapedElement::Way(_) => "way",
        }
    }
}
