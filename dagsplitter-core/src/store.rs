use crate::cancel::CancelToken;
use crate::cid::Cid;
use crate::error::Result;
use crate::node::Node;

/// The block-fetching collaborator. The core only needs `get`; `links` is a
/// convenience some stores can answer without decoding the whole node, used
/// by the archive-emission adapter rather than the walker itself.
pub trait BlockStore {
    fn get(&self, cid: &Cid, cancel: &CancelToken) -> Result<Node>;
}
