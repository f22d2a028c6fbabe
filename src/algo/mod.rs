//! Whole-graph transformations built on the store's concurrent primitives
//!
//! - **Moralization**: DAG -> undirected graph with all co-parents connected
//! - **Eviction**: batch vertex deletion split across a worker pool

mod evict;
mod moralize;

pub use evict::{evict, EvictionReport};
pub use moralize::{moralize, moralize_parallel, moralize_with};
