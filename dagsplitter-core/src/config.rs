use crate::error::{Result, SplitError};

/// `BreadthFirst` is declared but not implemented; requesting it is an
/// `InvalidConfiguration` failure, reported before traversal begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    DepthFirst,
    BreadthFirst,
}

/// Splitter configuration. Construct with [`Config::new`], which validates
/// eagerly so `InvalidConfiguration` is always raised before any block is
/// fetched.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub box_max_size: u64,
    pub min_subgraph_size: u64,
    pub traversal_order: TraversalOrder,
}

impl Config {
    pub fn new(
        box_max_size: u64,
        min_subgraph_size: u64,
        traversal_order: TraversalOrder,
    ) -> Result<Self> {
        if box_max_size == 0 {
            return Err(SplitError::InvalidConfiguration(
                "box_max_size must be greater than zero".into(),
            ));
        }
        if traversal_order == TraversalOrder::BreadthFirst {
            return Err(SplitError::InvalidConfiguration(
                "breadth-first traversal is reserved and not implemented".into(),
            ));
        }
        Ok(Config {
            box_max_size,
            min_subgraph_size,
            traversal_order,
        })
    }
}
