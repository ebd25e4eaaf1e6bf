//! Core DAG splitting algorithm: size oracle, box packer, DAG walker, and
//! the archive-emission link filter. Everything else in this workspace is an
//! external collaborator to this crate.

pub mod archive;
pub mod cancel;
pub mod cid;
pub mod config;
pub mod error;
pub mod node;
pub mod oracle;
pub mod packer;
pub mod store;
pub mod walker;

pub use cancel::CancelToken;
pub use cid::Cid;
pub use config::{Config, TraversalOrder};
pub use error::{Result, SplitError};
pub use node::{Link, Node, NodeKind, RawNode, StructuredNode};
pub use oracle::SizeOracle;
pub use packer::{BoxPacker, DagBox};
pub use store::BlockStore;
pub use walker::DagWalker;
