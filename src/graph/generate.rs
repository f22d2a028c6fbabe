//! Seeded random graph construction for benchmarks and tests

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{PropertyGraph, VertexId};

pub const DEFAULT_SEED: u64 = 111;

/// `vertices` vertices (property = ordinal) and `edges` insertion attempts
/// between uniformly drawn endpoints. Attempts that hit an existing pair are
/// dropped; a created edge carries its attempt ordinal. Self-loops are possible.
pub fn random_graph(vertices: usize, edges: usize, seed: u64) -> PropertyGraph<u64, u64> {
    build(vertices, edges, seed, |rng, n| (rng.gen_range(0..n), rng.gen_range(0..n)))
}

/// Like `random_graph`, but every edge points from a lower to a higher id, so
/// the result is a DAG. Needs at least two vertices to produce any edge.
pub fn random_dag(vertices: usize, edges: usize, seed: u64) -> PropertyGraph<u64, u64> {
    if vertices < 2 {
        return build(vertices, 0, seed, |_, _| (0, 0));
    }
    build(vertices, edges, seed, |rng, n| {
        let a = rng.gen_range(0..n);
        let mut b = rng.gen_range(0..n - 1);
        if b >= a {
            b += 1;
        }
        (a.min(b), a.max(b))
    })
}

fn build<F>(vertices: usize, edges: usize, seed: u64, mut endpoints: F) -> PropertyGraph<u64, u64>
where
    F: FnMut(&mut ChaCha8Rng, VertexId) -> (VertexId, VertexId),
{
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut graph = PropertyGraph::with_capacity(super::Directedness::Directed, vertices);
    for i in 0..vertices {
        graph.add_vertex(i as u64);
    }
    if vertices == 0 {
        return graph;
    }

    let n = vertices as VertexId;
    for attempt in 0..edges {
        let (src, dst) = endpoints(&mut rng, n);
        graph.add_edge_with_property(src, dst, attempt as u64);
    }

    tracing::debug!(
        "Generated graph: {} vertices, {} edges from {} attempts",
        graph.num_vertices(),
        graph.num_edges(),
        edges
    );
    graph
}

/// Every id in `0..bound`, in seeded random order
pub fn shuffled_ids(bound: VertexId, seed: u64) -> Vec<VertexId> {
    let mut ids: Vec<VertexId> = (0..bound).collect();
    ids.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_list(graph: &PropertyGraph<u64, u64>) -> Vec<(u64, u64, u64)> {
        graph
            .vertices()
            .flat_map(|v| v.out_edges().map(|e| (e.source(), e.target(), *e.property())).collect::<Vec<_>>())
            .collect()
    }

    #[test]
    fn test_same_seed_same_graph() {
        let a = random_graph(50, 400, DEFAULT_SEED);
        let b = random_graph(50, 400, DEFAULT_SEED);
        assert_eq!(a.num_vertices(), 50);
        assert_eq!(edge_list(&a), edge_list(&b));
        assert!(a.num_edges() <= 400);
    }

    #[test]
    fn test_vertex_property_is_ordinal() {
        let graph = random_graph(10, 0, 7);
        for v in graph.vertices() {
            assert_eq!(*v.property(), v.id());
        }
    }

    #[test]
    fn test_random_dag_is_acyclic() {
        let graph = random_dag(200, 2000, 3);
        assert!(graph.num_edges() > 0);
        assert_eq!(graph.find_cycle(), None);
        for (src, dst, _) in edge_list(&graph) {
            assert!(src < dst);
        }
    }

    #[test]
    fn test_degenerate_sizes() {
        assert_eq!(random_graph(0, 100, 1).num_edges(), 0);
        assert_eq!(random_dag(1, 100, 1).num_edges(), 0);
    }

    #[test]
    fn test_shuffled_ids_is_permutation() {
        let mut ids = shuffled_ids(100, DEFAULT_SEED);
        assert_ne!(ids, (0..100).collect::<Vec<_>>());
        ids.sort_unstable();
        assert_eq!(ids, (0..100).collect::<Vec<_>>());
    }
}
