//! Reshapes one node or way into the records of the five output tables.

use regex::Regex;

use crate::data::osm::{Child, Element, ElementKind};
use crate::data::records::{
    NodeRecord, ShapedElement, ShapedNode, ShapedWay, TagRecord, WayNodeRecord, WayRecord,
};
use crate::errors::{Error, Result};

pub const DEFAULT_TAG_TYPE: &str = "regular";

const LOWER_COLON: &str = r"^([a-z]|_)+:([a-z]|_)+";
const PROBLEM_CHARS: &str = r#"[=\+/&<>;'"\?%#$@,\. \t\r\n]"#;

/// How a raw tag key ends up in the tag tables.
#[derive(Debug, PartialEq, Eq)]
pub enum TagKey<'a> {
    /// Key contains a character that can't go into a column, the tag is left out.
    Dropped,
    /// `addr:street` style key, split on the first colon.
    Typed { tag_type: &'a str, key: &'a str },
    Plain(&'a str),
}

#[derive(Debug, Clone)]
pub struct Shaper {
    lower_colon: Regex,
    problem_chars: Regex,
    default_tag_type: String,
}

impl Shaper {
    pub fn new(default_tag_type: &str) -> Result<Shaper> {
        Ok(Shaper {
            lower_colon: Regex::new(LOWER_COLON)?,
            problem_chars: Regex::new(PROBLEM_CHARS)?,
            default_tag_type: default_tag_type.to_string(),
        })
    }

    pub fn classify_key<'a>(&self, raw: &'a str) -> TagKey<'a> {
        if self.problem_chars.is_match(raw) {
            return TagKey::Dropped;
        }
        if self.lower_colon.is_match(raw) {
            if let Some((tag_type, key)) = raw.split_once(':') {
                return TagKey::Typed { tag_type, key };
            }
        }
        TagKey::Plain(raw)
    }

    /// Shapes a node or a way. Relations yield `None`.
    pub fn shape(&self, element: &Element) -> Result<Option<ShapedElement>> {
        match element.kind {
            ElementKind::Node => Ok(Some(ShapedElement::Node(self.shape_node(element)?))),
            ElementKind::Way => Ok(Some(ShapedElement::Way(self.shape_way(element)?))),
            ElementKind::Relation => Ok(None),
        }
    }

    fn shape_node(&self, element: &Element) -> Result<ShapedNode> {
        let node = NodeRecord {
            id: required(element, "id")?,
            lat: required(element, "lat")?,
            lon: required(element, "lon")?,
            user: required(element, "user")?,
            uid: required(element, "uid")?,
            version: required(element, "version")?,
            changeset: required(element, "changeset")?,
            timestamp: required(element, "timestamp")?,
        };
        let node_tags = self.tag_records(element, &node.id)?;

        Ok(ShapedNode { node, node_tags })
    }

    fn shape_way(&self, element: &Element) -> Result<ShapedWay> {
        let way = WayRecord {
            id: required(element, "id")?,
            user: required(element, "user")?,
            uid: required(element, "uid")?,
            version: required(element, "version")?,
            changeset: required(element, "changeset")?,
            timestamp: required(element, "timestamp")?,
        };
        let way_tags = self.tag_records(element, &way.id)?;

        let way_nodes = element.node_refs()
            .enumerate()
            .map(|(position, nd)| -> Result<WayNodeRecord> {
                Ok(WayNodeRecord {
                    id: way.id.clone(),
                    node_id: required_child(element, &way.id, nd, "ref")?,
                    position,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ShapedWay { way, way_nodes, way_tags })
    }

    fn tag_records(&self, element: &Element, owner_id: &str) -> Result<Vec<TagRecord>> {
        let mut tags = Vec::new();
        for child in element.tags() {
            let raw_key = required_child(element, owner_id, child, "k")?;
            let (tag_type, key) = match self.classify_key(&raw_key) {
                TagKey::Dropped => continue,
                TagKey::Typed { tag_type, key } => (tag_type.to_string(), key.to_string()),
                TagKey::Plain(key) => (self.default_tag_type.clone(), key.to_string()),
            };
            tags.push(TagRecord {
                id: owner_id.to_string(),
                key,
                value: required_child(element, owner_id, child, "v")?,
                tag_type,
            });
        }
        Ok(tags)
    }
}

fn required(element: &Element, field: &str) -> Result<String> {
    element.attributes.get(field)
        .map(str::to_string)
        .ok_or_else(|| Error::missing_field(element.kind.as_str(), element.id(), field))
}

fn required_child(element: &Element, owner_id: &str, child: &Child, field: &str) -> Result<String> {
    child.attributes.get(field)
        .map(str::to_string)
        .ok_or_else(|| {
            let owner = format!("<{}> of {}", child.name, element.kind.as_str());
            Error::missing_field(&owner, Some(owner_id), field)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::osm::Attributes;
    use crate::errors::ErrorKind;

    const AUDIT: [(&str, &str); 5] = [
        ("user", "mapper"),
        ("uid", "42"),
        ("version", "3"),
        ("changeset", "1001"),
        ("timestamp", "2017-05-01T12:00:00Z"),
    ];

    fn child(name: &str, attributes: &[(&str, &str)]) -> Child {
        Child {
            name: name.to_string(),
            attributes: attributes.iter().copied().collect(),
        }
    }

    fn tag(k: &str, v: &str) -> Child {
        child("tag", &[("k", k), ("v", v)])
    }

    fn nd(node_ref: &str) -> Child {
        child("nd", &[("ref", node_ref)])
    }

    fn node(id: &str, children: Vec<Child>) -> Element {
        let mut attributes: Attributes = [("id", id), ("lat", "0.0"), ("lon", "0.0")].into_iter().collect();
        for (k, v) in AUDIT {
            attributes.push(k.to_string(), v.to_string());
        }
        Element { kind: ElementKind::Node, attributes, children }
    }

    fn way(id: &str, children: Vec<Child>) -> Element {
        let mut attributes: Attributes = [("id", id)].into_iter().collect();
        for (k, v) in AUDIT {
            attributes.push(k.to_string(), v.to_string());
        }
        Element { kind: ElementKind::Way, attributes, children }
    }

    fn shaper() -> Shaper {
        Shaper::new(DEFAULT_TAG_TYPE).unwrap()
    }

    fn shaped_node(element: &Element) -> ShapedNode {
        match shaper().shape(element).unwrap() {
            Some(ShapedElement::Node(shaped)) => shaped,
            other => panic!("expected a node, got {:?}", other),
        }
    }

    fn shaped_way(element: &Element) -> ShapedWay {
        match shaper().shape(element).unwrap() {
            Some(ShapedElement::Way(shaped)) => shaped,
            other => panic!("expected a way, got {:?}", other),
        }
    }

    #[test]
    fn node_with_address_tag() {
        let shaped = shaped_node(&node("1", vec![tag("addr:street", "Main St")]));

        assert_eq!(shaped.node, NodeRecord {
            id: "1".to_string(),
            lat: "0.0".to_string(),
            lon: "0.0".to_string(),
            user: "mapper".to_string(),
            uid: "42".to_string(),
            version: "3".to_string(),
            changeset: "1001".to_string(),
            timestamp: "2017-05-01T12:00:00Z".to_string(),
        });
        assert_eq!(shaped.node_tags, vec![TagRecord {
            id: "1".to_string(),
            key: "street".to_string(),
            value: "Main St".to_string(),
            tag_type: "addr".to_string(),
        }]);
    }

    #[test]
    fn way_positions_ignore_interleaved_tags() {
        let shaped = shaped_way(&way("5", vec![nd("10"), tag("highway", "residential"), nd("11")]));

        assert_eq!(shaped.way.id, "5");
        assert_eq!(shaped.way_nodes, vec![
            WayNodeRecord { id: "5".to_string(), node_id: "10".to_string(), position: 0 },
            WayNodeRecord { id: "5".to_string(), node_id: "11".to_string(), position: 1 },
        ]);
        assert_eq!(shaped.way_tags, vec![TagRecord {
            id: "5".to_string(),
            key: "highway".to_string(),
            value: "residential".to_string(),
            tag_type: "regular".to_string(),
        }]);
    }

    #[test]
    fn long_ways_keep_contiguous_positions() {
        let mut children = Vec::new();
        for i in 0..50 {
            children.push(nd(&(100 + i).to_string()));
            if i % 7 == 0 {
                children.push(tag("note", "x"));
            }
        }
        let shaped = shaped_way(&way("8", children));

        let positions: Vec<usize> = shaped.way_nodes.iter().map(|r| r.position).collect();
        assert_eq!(positions, (0..50).collect::<Vec<_>>());
        assert_eq!(shaped.way_nodes[49].node_id, "149");
        assert!(shaped.way_nodes.iter().all(|r| r.id == "8"));
    }

    #[test]
    fn keys_with_problem_chars_are_dropped() {
        let children = vec![
            tag("name", "ok"),
            tag("fixme?", "x"),
            tag("addr street", "x"),
            tag("a.b", "x"),
            tag("a,b", "x"),
            tag("url=", "x"),
            tag("note\t", "x"),
        ];
        let shaped = shaped_node(&node("3", children));
        let keys: Vec<&str> = shaped.node_tags.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["name"]);
    }

    #[test]
    fn key_classification() {
        let shaper = shaper();
        assert_eq!(shaper.classify_key("name"), TagKey::Plain("name"));
        assert_eq!(
            shaper.classify_key("addr:street"),
            TagKey::Typed { tag_type: "addr", key: "street" }
        );
        // Only the first colon splits.
        assert_eq!(
            shaper.classify_key("addr:street:name"),
            TagKey::Typed { tag_type: "addr", key: "street:name" }
        );
        assert_eq!(
            shaper.classify_key("gnis:feature_id"),
            TagKey::Typed { tag_type: "gnis", key: "feature_id" }
        );
        // Upper case or digits don't match the lower-colon pattern.
        assert_eq!(shaper.classify_key("Name:en"), TagKey::Plain("Name:en"));
        assert_eq!(shaper.classify_key("tiger:name_base_1"), TagKey::Typed { tag_type: "tiger", key: "name_base_1" });
        assert_eq!(shaper.classify_key("2:foo"), TagKey::Plain("2:foo"));
        assert_eq!(shaper.classify_key("addr@home"), TagKey::Dropped);
    }

    #[test]
    fn custom_default_tag_type() {
        let shaper = Shaper::new("plain").unwrap();
        let shaped = match shaper.shape(&node("1", vec![tag("amenity", "cafe")])).unwrap() {
            Some(ShapedElement::Node(shaped)) => shaped,
            other => panic!("expected a node, got {:?}", other),
        };
        assert_eq!(shaped.node_tags[0].tag_type, "plain");
    }

    #[test]
    fn missing_attribute_fails() {
        let mut element = way("5", vec![]);
        element.attributes = [("id", "5"), ("user", "a")].into_iter().collect();

        let err = shaper().shape(&element).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingField);
        assert!(err.message.contains("way 5"));
        assert!(err.message.contains("'uid'"));
    }

    #[test]
    fn node_without_coordinates_fails() {
        let mut element = node("4", vec![]);
        element.attributes = [("id", "4")].into_iter().collect();
        let err = shaper().shape(&element).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingField);
        assert!(err.message.contains("'lat'"));
    }

    #[test]
    fn child_without_ref_fails() {
        let err = shaper().shape(&way("5", vec![child("nd", &[])])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingField);
        assert!(err.message.contains("'ref'"));
    }

    #[test]
    fn relations_are_not_shaped() {
        let element = Element {
            kind: ElementKind::Relation,
            attributes: [("id", "9")].into_iter().collect(),
            children: vec![tag("type", "route")],
        };
        assert_eq!(shaper().shape(&element).unwrap(), None);
    }

    #[test]
    fn shaping_is_deterministic() {
        let element = way("5", vec![nd("10"), tag("name:en", "High Street"), tag("highway", "primary"), nd("11")]);
        let shaper = shaper();
        let first = shaper.shape(&element).unwrap();
        let second = shaper.shape(&element).unwrap();
        assert_eq!(first, second);
    }
}
