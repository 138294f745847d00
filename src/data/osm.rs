/// Top-level element kinds of an .osm document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub fn from_name(name: &[u8]) -> Option<ElementKind> {
        match name {
            b"node" => Some(ElementKind::Node),
            b"way" => Some(ElementKind::Way),
            b"relation" => Some(ElementKind::Relation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

/// Attributes of a markup item in document order, values already unescaped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Attributes(Vec::new())
    }

    pub fn push(&mut self, key: String, value: String) {
        self.0.push((key, value));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Attributes(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A direct child of a node or way, e.g. `<tag k=".." v=".."/>` or `<nd ref=".."/>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Child {
    pub name: String,
    pub attributes: Attributes,
}

impl Child {
    pub fn is_tag(&self) -> bool {
        self.name == "tag"
    }

    pub fn is_node_ref(&self) -> bool {
        self.name == "nd"
    }
}

/// One top-level element as read from the stream. Owns everything it references so
/// the reader's buffers can be reused for the next element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: ElementKind,
    pub attributes: Attributes,
    pub children: Vec<Child>,
}

impl Element {
    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id")
    }

    pub fn tags(&self) -> impl Iterator<Item = &Child> {
        self.children.iter().filter(|child| child.is_tag())
    }

    pub fn node_refs(&self) -> impl Iterator<Item = &Child> {
        self.children.iter().filter(|child| child.is_node_ref())
    }
}
