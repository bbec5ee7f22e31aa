//! Intermediate value produced by the structural reader.
//!
//! A `Node` only records shape: scalars stay as raw text until a binder
//! coerces them into a target type.

use std::fmt;

/// Synthetic key under which a mapping block stores a bare scalar item.
pub const SCALAR_KEY: &str = "";

/// A shape-tagged intermediate value.
#[derive(Clone, PartialEq, Eq)]
pub enum Node {
    /// Raw, unparsed scalar text.
    Scalar(String),
    /// Ordered key/value associations with distinct keys.
    Mapping(Mapping),
    /// Ordered items.
    Sequence(Vec<Node>),
}

impl Node {
    /// Shape name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Scalar(_) => "scalar",
            Node::Mapping(_) => "mapping",
            Node::Sequence(_) => "sequence",
        }
    }

    /// Returns the text if this is a `Scalar`.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a reference to the mapping if this is a `Mapping`.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the items if this is a `Sequence`.
    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Scalar(s) => write!(f, "{:?}", s),
            Node::Mapping(m) => fmt::Debug::fmt(m, f),
            Node::Sequence(items) => f.debug_list().entries(items).finish(),
        }
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Scalar(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Scalar(s)
    }
}

impl From<Mapping> for Node {
    fn from(m: Mapping) -> Self {
        Node::Mapping(m)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Sequence(items)
    }
}

/// Insertion-ordered mapping with unique keys.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    entries: Vec<(String, Node)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Entries in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Insert a new key. Returns `false`, leaving the mapping untouched, if
    /// the key is already present.
    pub fn insert(&mut self, key: impl Into<String>, value: Node) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.entries.push((key, value));
        true
    }

    /// The bare scalar item stored under the synthetic key, when that is the
    /// only entry.
    pub fn lone_scalar(&self) -> Option<&str> {
        match self.entries.as_slice() {
            [(key, Node::Scalar(text))] if key == SCALAR_KEY => Some(text),
            _ => None,
        }
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl<K: Into<String>> FromIterator<(K, Node)> for Mapping {
    /// Later duplicates are ignored.
    fn from_iter<I: IntoIterator<Item = (K, Node)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}
