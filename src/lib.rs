//! topomorph - dynamic property graph store with parallel DAG moralization
//!
//! # Architecture
//!
//! - **Vertex arena**: id-indexed slots behind per-vertex `RwLock`s, tombstoned on delete
//! - **Dual adjacency**: out-edge slab with free list + predecessor links per vertex
//! - **Concurrent mutation**: edge insert/delete and vertex delete through `&self`
//! - **Partitioned workers**: contiguous chunks over a fixed rayon pool
//! - **IO**: CSV vertex/edge lists, mmap'd CSR snapshots, deletion id batches
//!
//! # Usage example
//!
//! ```
//! use topomorph::{moralize_with, PropertyGraph, ThreadCount};
//!
//! # fn main() -> topomorph::Result<()> {
//! let mut dag: PropertyGraph<u32, u32> = PropertyGraph::directed();
//! let (a, b, c) = (dag.add_vertex(0), dag.add_vertex(1), dag.add_vertex(2));
//! dag.add_edge(a, c);
//! dag.add_edge(b, c);
//!
//! let moral = moralize_with(&dag, ThreadCount::new(2)?)?;
//! assert!(moral.find_out_edge(a, b).is_some());
//! # Ok(())
//! # }
//! ```

pub mod algo;
pub mod config;
pub mod error;
pub mod graph;
pub mod kernel;
pub mod storage;

pub use algo::{evict, moralize, moralize_parallel, moralize_with, EvictionReport};
pub use config::BenchConfig;
pub use error::{GraphError, Result};
pub use graph::{Directedness, EdgeHandle, EdgeInsertion, PropertyGraph, ThreadCount, VertexId};
pub use storage::{export_csr, load_csr, CsrGraph};
