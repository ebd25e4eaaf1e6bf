//! Block-fetching collaborators: a plain in-memory store for tests and small
//! DAGs, a directory-backed store for standalone runs, and an
//! access-counting wrapper around any [`BlockStore`].

mod block_file;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use log::trace;

use dagsplitter_core::cancel::CancelToken;
use dagsplitter_core::cid::Cid;
use dagsplitter_core::error::{Result, SplitError};
use dagsplitter_core::node::Node;
use dagsplitter_core::store::BlockStore;

pub use block_file::FileBlockStore;

/// A `BlockStore` backed by a plain `HashMap`, built up with [`InMemoryBlockStore::insert`]
/// before splitting. Useful for tests and for DAGs small enough to hold
/// entirely in memory; production callers will more likely wrap a real
/// content-addressed backend in their own `BlockStore` impl.
#[derive(Debug, Default)]
pub struct InMemoryBlockStore {
    blocks: RwLock<HashMap<Cid, Node>>,
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        InMemoryBlockStore {
            blocks: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, cid: Cid, node: Node) {
        trace!("inserting block {}", cid);
        self.blocks
            .write()
            .expect("in-memory block store lock poisoned")
            .insert(cid, node);
    }

    pub fn len(&self) -> usize {
        self.blocks
            .read()
            .expect("in-memory block store lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlockStore for InMemoryBlockStore {
    fn get(&self, cid: &Cid, _cancel: &CancelToken) -> Result<Node> {
        self.blocks
            .read()
            .expect("in-memory block store lock poisoned")
            .get(cid)
            .cloned()
            .ok_or_else(|| SplitError::FetchFailure {
                cid: cid.to_string(),
                source: anyhow::anyhow!("block not present in in-memory store"),
            })
    }
}

/// The number of `get` calls a [`CountingBlockStore`] has observed. Not
/// consulted by the core splitting algorithm; purely diagnostic.
#[derive(Debug, Default)]
pub struct AccessCounts {
    gets: AtomicU64,
}

impl AccessCounts {
    pub fn gets(&self) -> u64 {
        self.gets.load(Ordering::Relaxed)
    }
}

/// Wraps any `BlockStore` and counts how many times `get` is called, without
/// changing its behavior. Useful for profiling how much duplicate fetching a
/// particular DAG shape causes.
pub struct CountingBlockStore<S> {
    inner: S,
    counts: AccessCounts,
}

impl<S: BlockStore> CountingBlockStore<S> {
    pub fn new(inner: S) -> Self {
        CountingBlockStore {
            inner,
            counts: AccessCounts::default(),
        }
    }

    pub fn counts(&self) -> &AccessCounts {
        &self.counts
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: BlockStore> BlockStore for CountingBlockStore<S> {
    fn get(&self, cid: &Cid, cancel: &CancelToken) -> Result<Node> {
        self.counts.gets.fetch_add(1, Ordering::Relaxed);
        self.inner.get(cid, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagsplitter_core::node::RawNode;
    use pretty_assertions::assert_eq;

    fn leaf(id: u8, len: usize) -> (Cid, Node) {
        (Cid::new(0x55, vec![id]), Node::Raw(RawNode::new(vec![0u8; len])))
    }

    #[test]
    fn fetches_what_was_inserted() {
        let store = InMemoryBlockStore::new();
        let (cid, node) = leaf(1, 10);
        store.insert(cid.clone(), node.clone());

        let fetched = store.get(&cid, &CancelToken::new()).unwrap();
        assert_eq!(fetched, node);
    }

    #[test]
    fn missing_block_is_a_fetch_failure() {
        let store = InMemoryBlockStore::new();
        let (cid, _) = leaf(1, 10);
        assert!(matches!(
            store.get(&cid, &CancelToken::new()),
            Err(SplitError::FetchFailure { .. })
        ));
    }

    #[test]
    fn counting_wrapper_tallies_gets_without_changing_results() {
        let inner = InMemoryBlockStore::new();
        let (cid, node) = leaf(1, 10);
        inner.insert(cid.clone(), node.clone());
        let wrapped = CountingBlockStore::new(inner);

        assert_eq!(wrapped.counts().gets(), 0);
        let fetched = wrapped.get(&cid, &CancelToken::new()).unwrap();
        assert_eq!(fetched, node);
        assert_eq!(wrapped.counts().gets(), 1);
        wrapped.get(&cid, &CancelToken::new()).unwrap();
        assert_eq!(wrapped.counts().gets(), 2);
    }
}
