//! Intermediate representation types.
//!
//! Recognition produces an ordered stream of typed lexemes. Each node owns a
//! copy of the canonical bytes it matched, so the canonical buffer an
//! admission ran over can be released without invalidating the IR handed to
//! the caller.

use serde::{Deserialize, Serialize};

use registry::PatternKind;

/// Kind of a recognized lexeme.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum IrKind {
    /// The protocol header with its version.
    ProtocolMessage,
    /// The validated security token.
    SecurityContext,
    /// The payload body.
    PayloadBlock,
    /// The schema reference.
    SchemaValidation,
    /// The trailing audit marker.
    AuditRecord,
    /// Marker node at a rejection point.
    ErrorCondition,
}

impl IrKind {
    /// IR kind emitted when a pattern of `kind` matches, if any.
    ///
    /// Structural kinds (version validation, payload framing, boundaries)
    /// emit nothing: their effect is the state change itself.
    pub fn from_pattern(kind: PatternKind) -> Option<IrKind> {
        match kind {
            PatternKind::ProtocolHeader => Some(IrKind::ProtocolMessage),
            PatternKind::SecurityToken => Some(IrKind::SecurityContext),
            PatternKind::DataPayload => Some(IrKind::PayloadBlock),
            PatternKind::SchemaReference => Some(IrKind::SchemaValidation),
            PatternKind::AuditMarker => Some(IrKind::AuditRecord),
            _ => None,
        }
    }
}

/// One recognized lexeme.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IrNode {
    /// What the lexeme means.
    pub kind: IrKind,
    /// Owned copy of the canonical bytes that matched.
    #[serde(with = "serde_bytes_vec")]
    pub content: Vec<u8>,
    /// State whose pattern produced this node.
    pub source_state: u16,
    /// Governance cost charged for the producing transition.
    pub cost: f64,
}

/// Ordered sequence of IR nodes, owned by the caller of the admission entry
/// point. Emission order equals byte-position order of the matches; dropping
/// the stream drops every node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IrStream {
    nodes: Vec<IrNode>,
}

impl IrStream {
    /// An empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, node: IrNode) {
        self.nodes.push(node);
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no node was emitted.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Borrow the nodes in emission order.
    pub fn nodes(&self) -> &[IrNode] {
        &self.nodes
    }

    /// Kinds in emission order; convenient for assertions and logs.
    pub fn kinds(&self) -> Vec<IrKind> {
        self.nodes.iter().map(|n| n.kind).collect()
    }

    /// Consume the stream, returning the owned nodes.
    pub fn into_nodes(self) -> Vec<IrNode> {
        self.nodes
    }

    /// Iterate over the nodes in emission order.
    pub fn iter(&self) -> std::slice::Iter<'_, IrNode> {
        self.nodes.iter()
    }
}

impl IntoIterator for IrStream {
    type Item = IrNode;
    type IntoIter = std::vec::IntoIter<IrNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a IrStream {
    type Item = &'a IrNode;
    type IntoIter = std::slice::Iter<'a, IrNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

mod serde_bytes_vec {
    //! Serialize lexeme bytes as a string when they are UTF-8, falling back
    //! to a byte array otherwise. Keeps exported IR human-readable without
    //! corrupting binary payload segments.

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Raw(Vec<u8>),
    }

    pub(super) fn serialize<S>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match std::str::from_utf8(value) {
            Ok(text) => Repr::Text(text.to_owned()).serialize(serializer),
            Err(_) => Repr::Raw(value.to_vec()).serialize(serializer),
        }
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => Ok(text.into_bytes()),
            Repr::Raw(raw) => Ok(raw),
        }
    }
}
