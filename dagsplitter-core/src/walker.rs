use std::collections::HashSet;

use log::{debug, trace};

use crate::cancel::CancelToken;
use crate::cid::Cid;
use crate::config::Config;
use crate::error::Result;
use crate::node::Node;
use crate::oracle::SizeOracle;
use crate::packer::{BoxPacker, DagBox};
use crate::store::BlockStore;

/// Drives the depth-first traversal that decides where to cut the DAG.
///
/// The walker owns an explicit stack for each `walk_dag` call and a LIFO
/// queue of deferred future-box roots, and returns a proper
/// [`crate::error::SplitError`] from every step rather than aborting through
/// a panic.
pub struct DagWalker<'a, S: BlockStore> {
    store: &'a S,
    oracle: SizeOracle,
    packer: BoxPacker,
    min_subgraph_size: u64,
    cancel: CancelToken,
}

impl<'a, S: BlockStore> DagWalker<'a, S> {
    pub fn new(store: &'a S, config: Config, cancel: CancelToken) -> Self {
        DagWalker {
            store,
            oracle: SizeOracle::new(),
            packer: BoxPacker::new(config.box_max_size),
            min_subgraph_size: config.min_subgraph_size,
            cancel,
        }
    }

    /// Splits the DAG rooted at `initial_root`, returning the sealed boxes
    /// in the order they were sealed.
    pub fn split(mut self, initial_root: Cid) -> Result<Vec<DagBox>> {
        let mut pending_roots = vec![initial_root];

        while let Some(root) = pending_roots.pop() {
            let mark = pending_roots.len();
            debug!("walking box root {}", root);
            self.walk_dag(&root, &mut pending_roots)?;
            if pending_roots.len() > mark {
                trace!("at least one deferral under {}, sealing box", root);
                self.packer.new_box();
            }
        }

        Ok(self.packer.into_boxes())
    }

    /// Depth-first traversal starting at `root`. Children are pushed in
    /// reverse link order onto an explicit stack so the first link is
    /// visited first; a CID already visited within this call is skipped
    /// (cross-call deduplication is not required since content-addressed
    /// DAGs are acyclic).
    fn walk_dag(&mut self, root: &Cid, pending_roots: &mut Vec<Cid>) -> Result<()> {
        let mut visited: HashSet<Cid> = HashSet::new();
        let mut stack = vec![root.clone()];

        while let Some(cid) = stack.pop() {
            if !visited.insert(cid.clone()) {
                continue;
            }
            self.cancel.check()?;

            let node = self.store.get(&cid, &self.cancel)?;
            let descend = self.visit(&cid, &node, root, pending_roots)?;

            if descend {
                for link in node.links().iter().rev() {
                    stack.push(link.target.clone());
                }
            }
        }

        Ok(())
    }

    /// The per-node decision procedure: cases A, B1, B2 and C.
    fn visit(
        &mut self,
        cid: &Cid,
        node: &Node,
        call_root: &Cid,
        pending_roots: &mut Vec<Cid>,
    ) -> Result<bool> {
        let tree = self.oracle.subtree_size(node)?;

        // Case A: the whole subtree fits, take it all and prune here.
        if self.packer.fits(tree) {
            self.packer.add_size(tree);
            if cid == call_root {
                self.packer.pack_root(cid.clone());
            }
            return Ok(false);
        }

        // Case B: too big to fit, but large enough to be worth splitting.
        if tree > self.min_subgraph_size {
            let parent = self.oracle.single_node_size(node);

            // Case B1: the node itself fits (or the box is still empty, in
            // which case a single oversized node gets its own dedicated
            // over-budget box to guarantee progress).
            if self.packer.fits(parent) || self.packer.is_empty() {
                self.packer.add_size(parent);
                if cid == call_root {
                    self.packer.pack_root(cid.clone());
                }
                return Ok(true);
            }

            // Case B2: the node itself doesn't fit and the box isn't empty;
            // defer the whole sub-DAG to a future box.
            pending_roots.push(cid.clone());
            self.packer.add_external(cid.clone());
            return Ok(false);
        }

        // Case C: too big to fit, but below the split-worthiness threshold.
        // If the current box is still empty, deferring again would only
        // hand the same node back to an equally empty future box forever
        // (it is neither small enough to fit nor, by definition, worth
        // splitting) -- so an empty box takes it whole, oversized, the same
        // way a single node bigger than the budget does in case B1.
        if self.packer.is_empty() {
            self.packer.add_size(tree);
            if cid == call_root {
                self.packer.pack_root(cid.clone());
            }
            return Ok(false);
        }
        pending_roots.push(cid.clone());
        self.packer.add_external(cid.clone());
        Ok(false)
    }
}
