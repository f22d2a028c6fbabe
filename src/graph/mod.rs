//! Graph store API: identities, handles and the concurrent property graph

pub mod generate;
pub mod partition;
mod slot;
pub mod store;
pub mod traversal;

pub use partition::ThreadCount;
pub use store::{EdgeRef, PredEdge, PropertyGraph, VertexRef};

/// Stable vertex identity. Allocation is monotonic, so a deleted id never
/// names a later vertex.
pub type VertexId = u64;

/// Construction-time edge semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directedness {
    /// `add_edge(u, v)` records `u -> v` plus a predecessor link at `v`
    Directed,
    /// `add_edge(u, v)` records both `u -> v` and `v -> u`
    Undirected,
}

/// Names one forward edge: the slot it occupies in its source's edge slab.
///
/// The generation guards against slot recycling: once the edge is deleted
/// the handle stops resolving, even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeHandle {
    source: VertexId,
    slot: u32,
    generation: u32,
}

impl EdgeHandle {
    pub(crate) fn new(source: VertexId, slot: u32, generation: u32) -> Self {
        Self { source, slot, generation }
    }

    pub fn source(&self) -> VertexId {
        self.source
    }

    pub(crate) fn slot(&self) -> u32 {
        self.slot
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

/// Outcome of an edge insertion. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsertion {
    /// A new edge was materialized
    Created(EdgeHandle),
    /// The ordered pair already had an edge; nothing changed
    Exists(EdgeHandle),
    /// One of the endpoints is not a live vertex; nothing changed
    MissingEndpoint,
}

impl EdgeInsertion {
    pub fn is_created(&self) -> bool {
        matches!(self, EdgeInsertion::Created(_))
    }

    /// Handle of the freshly created edge, if this call created one
    pub fn created(&self) -> Option<EdgeHandle> {
        match self {
            EdgeInsertion::Created(handle) => Some(*handle),
            _ => None,
        }
    }
}
