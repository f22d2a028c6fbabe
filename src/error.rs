//! Error types for graph store, loaders and partitioned algorithms

use std::path::PathBuf;
use thiserror::Error;

use crate::graph::VertexId;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{path:?}:{line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("{path:?}:{line}: duplicate vertex id {id}")]
    DuplicateVertex { path: PathBuf, line: u64, id: VertexId },

    #[error("{path:?}:{line}: edge references unknown vertex {id}")]
    UnknownVertex { path: PathBuf, line: u64, id: VertexId },

    #[error("Vertex already exists: {0}")]
    VertexExists(VertexId),

    #[error("Vertex id was deleted and cannot be reused: {0}")]
    VertexRetired(VertexId),

    #[error("Vertex id {id} exceeds limit {limit}")]
    VertexIdTooLarge { id: VertexId, limit: VertexId },

    #[error("Graph is not acyclic: cycle through vertex {vertex}")]
    Cycle { vertex: VertexId },

    #[error("Invalid CSR data: {0}")]
    InvalidCsr(String),

    #[error("Operation requires a directed graph")]
    NotDirected,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("ID batch file holds {found} ids, {requested} requested")]
    IdBatchShort { requested: usize, found: usize },
}
