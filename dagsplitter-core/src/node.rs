use crate::cid::Cid;

/// The kind embedded in a structured node's header.
///
/// Only the first four variants are handled by the size oracle; `Metadata`
/// and `Symlink` exist so callers can construct and recognize them, but the
/// oracle always rejects them (see [`crate::oracle::SizeOracle::subtree_size`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    RawLeaf,
    Directory,
    HamtShard,
    Metadata,
    Symlink,
}

/// A named edge from a parent node to a child, carrying the child's CID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub name: String,
    pub target: Cid,
}

impl Link {
    pub fn new(name: impl Into<String>, target: Cid) -> Self {
        Link {
            name: name.into(),
            target,
        }
    }
}

/// An opaque byte payload with no outgoing links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNode {
    pub payload: Vec<u8>,
}

impl RawNode {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        RawNode {
            payload: payload.into(),
        }
    }
}

/// A typed node with outgoing links and a precomputed encoded length.
///
/// `subtree_size` is the aggregate byte size declared in the structured
/// format's own header for the kinds that carry one (`File`, `RawLeaf`,
/// `Directory`, `HamtShard`); it is `None` for `Metadata` and `Symlink`,
/// which the format never equips with that field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredNode {
    pub kind: NodeKind,
    pub encoded_len: u64,
    pub subtree_size: Option<u64>,
    pub links: Vec<Link>,
}

/// The in-memory, decoded form of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Raw(RawNode),
    Structured(StructuredNode),
}

impl Node {
    pub fn links(&self) -> &[Link] {
        match self {
            Node::Raw(_) => &[],
            Node::Structured(s) => &s.links,
        }
    }
}
