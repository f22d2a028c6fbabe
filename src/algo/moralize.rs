//! DAG moralization: drop edge directions and marry every pair of parents
//!
//! Phase 1 copies vertices (same ids, cloned properties) and edges into a new
//! undirected store. Phase 2 connects each unordered pair of predecessors of
//! every vertex. Only phase 2 runs in parallel; it needs nothing but `&`
//! access to both graphs, since edge insertion is atomic per pair.

use std::ops::Range;

use crate::error::{GraphError, Result};
use crate::graph::partition::run_partitioned;
use crate::graph::{Directedness, PropertyGraph, ThreadCount, VertexId};

/// Moralize on the calling thread
pub fn moralize<V, E>(dag: &PropertyGraph<V, E>) -> Result<PropertyGraph<V, E>>
where
    V: Clone,
    E: Clone + Default,
{
    let moral = copy_phase(dag)?;
    let married = marry_parents(dag, &moral, 0..dag.id_bound() as usize);
    log_result(&moral, married);
    Ok(moral)
}

/// Moralize with phase 2 split into `threads` contiguous chunks of the id space
pub fn moralize_parallel<V, E>(dag: &PropertyGraph<V, E>, threads: ThreadCount) -> Result<PropertyGraph<V, E>>
where
    V: Clone + Send + Sync,
    E: Clone + Default + Send + Sync,
{
    let moral = copy_phase(dag)?;
    let bound = dag.id_bound() as usize;

    let per_worker = run_partitioned(bound, threads, |worker, range| {
        let (start, end) = (range.start, range.end);
        let married = marry_parents(dag, &moral, range);
        tracing::debug!("Worker {} married {} parent pairs over ids {}..{}", worker, married, start, end);
        married
    })?;

    log_result(&moral, per_worker.iter().sum());
    Ok(moral)
}

/// Sequential path for one thread, partitioned otherwise
pub fn moralize_with<V, E>(dag: &PropertyGraph<V, E>, threads: ThreadCount) -> Result<PropertyGraph<V, E>>
where
    V: Clone + Send + Sync,
    E: Clone + Default + Send + Sync,
{
    if threads == ThreadCount::ONE {
        moralize(dag)
    } else {
        moralize_parallel(dag, threads)
    }
}

/// Undirected skeleton of `dag` with identical vertex ids and properties
fn copy_phase<V, E>(dag: &PropertyGraph<V, E>) -> Result<PropertyGraph<V, E>>
where
    V: Clone,
    E: Clone,
{
    if !dag.is_directed() {
        return Err(GraphError::NotDirected);
    }

    let mut moral = PropertyGraph::with_capacity(Directedness::Undirected, dag.id_bound() as usize);
    for vertex in dag.vertices() {
        moral.add_vertex_with_id(vertex.id(), vertex.property().clone())?;
    }
    for vertex in dag.vertices() {
        for edge in vertex.out_edges() {
            moral.add_edge_with_property(vertex.id(), edge.target(), edge.property().clone());
        }
    }

    tracing::debug!(
        "Copied skeleton: {} vertices, {} edge records",
        moral.num_vertices(),
        moral.num_edges()
    );
    Ok(moral)
}

/// Connect all predecessor pairs of every live vertex whose id is in `ids`.
/// Returns how many edges this call created.
fn marry_parents<V, E>(dag: &PropertyGraph<V, E>, moral: &PropertyGraph<V, E>, ids: Range<usize>) -> usize
where
    E: Clone + Default,
{
    let mut married = 0;
    let mut parents: Vec<VertexId> = Vec::new();

    for id in ids {
        let Some(vertex) = dag.find_vertex(id as VertexId) else {
            continue;
        };
        parents.clear();
        parents.extend(vertex.preds().map(|p| p.source()));
        drop(vertex);

        for (i, &a) in parents.iter().enumerate() {
            for &b in &parents[i + 1..] {
                if moral.find_out_edge(a, b).is_some() {
                    continue;
                }
                if moral.add_edge(a, b).is_created() {
                    married += 1;
                }
            }
        }
    }

    married
}

fn log_result<V, E>(moral: &PropertyGraph<V, E>, married: usize) {
    tracing::info!(
        "Moralized: {} vertices, {} edge records ({} added between parents)",
        moral.num_vertices(),
        moral.num_edges(),
        married
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undirected_input_rejected() {
        let graph: PropertyGraph<(), ()> = PropertyGraph::undirected();
        assert!(matches!(moralize(&graph), Err(GraphError::NotDirected)));
        assert!(matches!(
            moralize_parallel(&graph, ThreadCount::new(2).unwrap()),
            Err(GraphError::NotDirected)
        ));
    }

    #[test]
    fn test_properties_are_copied() {
        let mut dag: PropertyGraph<&str, u32> = PropertyGraph::directed();
        dag.add_vertex("a");
        dag.add_vertex("b");
        dag.add_edge_with_property(0, 1, 7);

        let moral = moralize(&dag).unwrap();
        assert_eq!(moral.directedness(), Directedness::Undirected);
        assert_eq!(moral.vertex_property(1), Some("b"));
        let back = moral.find_out_edge(1, 0).unwrap();
        assert_eq!(moral.edge_property(back), Some(7));
    }

    #[test]
    fn test_parent_pair_married_once() {
        // Two children share parents 0 and 1
        let mut dag: PropertyGraph<(), ()> = PropertyGraph::directed();
        for _ in 0..4 {
            dag.add_vertex(());
        }
        for child in [2, 3] {
            dag.add_edge(0, child);
            dag.add_edge(1, child);
        }

        let moral = moralize(&dag).unwrap();
        assert!(moral.find_out_edge(0, 1).is_some());
        assert_eq!(moral.num_edges(), 2 * 5);
    }
}
