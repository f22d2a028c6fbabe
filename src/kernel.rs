//! Capability interfaces for external CSR kernels
//!
//! The crate does not compute centrality or triangle counts. It exports the
//! CSR arrays, hands them to a kernel together with a zeroed per-position
//! buffer, and writes the buffer back into vertex properties.

use crate::error::{GraphError, Result};
use crate::graph::{PropertyGraph, ThreadCount};
use crate::storage::CsrGraph;

/// Per-vertex signed 16-bit degree-style score
pub trait DegreeCentralityKernel {
    /// Fill `output[position]` for every CSR position. `output.len()` equals the vertex count.
    fn degree_centrality(
        &self,
        vertex_offsets: &[u64],
        edge_targets: &[u64],
        output: &mut [i16],
        threads: Option<ThreadCount>,
    ) -> Result<()>;
}

/// Global triangle count plus a per-vertex count
pub trait TriangleCountKernel {
    /// Fill `per_vertex[position]` and return the global count
    fn triangle_count(&self, vertex_offsets: &[u64], edge_targets: &[u64], per_vertex: &mut [u32]) -> Result<u32>;
}

/// Result of a triangle count run, indexed by CSR position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriangleCounts {
    pub total: u32,
    pub per_vertex: Vec<u32>,
}

pub fn run_degree_centrality<K>(kernel: &K, csr: &CsrGraph, threads: Option<ThreadCount>) -> Result<Vec<i16>>
where
    K: DegreeCentralityKernel + ?Sized,
{
    let mut output = vec![0i16; csr.num_vertices()];
    kernel.degree_centrality(csr.vertex_offsets(), csr.edge_targets(), &mut output, threads)?;
    Ok(output)
}

pub fn run_triangle_count<K>(kernel: &K, csr: &CsrGraph) -> Result<TriangleCounts>
where
    K: TriangleCountKernel + ?Sized,
{
    let mut per_vertex = vec![0u32; csr.num_vertices()];
    let total = kernel.triangle_count(csr.vertex_offsets(), csr.edge_targets(), &mut per_vertex)?;
    Ok(TriangleCounts { total, per_vertex })
}

/// Write `values[position]` into the vertex recorded at that CSR position.
/// Vertices deleted since the export are skipped; returns how many were written.
pub fn attach_vertex_values<V, E, T, F>(
    graph: &PropertyGraph<V, E>,
    csr: &CsrGraph,
    values: &[T],
    mut apply: F,
) -> Result<usize>
where
    T: Copy,
    F: FnMut(&mut V, T),
{
    if values.len() != csr.num_vertices() {
        return Err(GraphError::InvalidCsr(format!(
            "{} values for {} CSR vertices",
            values.len(),
            csr.num_vertices()
        )));
    }

    let written = csr
        .vertex_ids()
        .iter()
        .zip(values)
        .filter(|&(&id, &value)| graph.update_property(id, |property| apply(property, value)))
        .count();
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::export_csr;

    /// In-degree, saturated to i16
    struct InDegree;

    impl DegreeCentralityKernel for InDegree {
        fn degree_centrality(
            &self,
            _vertex_offsets: &[u64],
            edge_targets: &[u64],
            output: &mut [i16],
            _threads: Option<ThreadCount>,
        ) -> Result<()> {
            for &target in edge_targets {
                let slot = &mut output[target as usize];
                *slot = slot.saturating_add(1);
            }
            Ok(())
        }
    }

    /// Brute force over an undirected CSR (both directions present)
    struct BruteTriangles;

    impl TriangleCountKernel for BruteTriangles {
        fn triangle_count(&self, offsets: &[u64], targets: &[u64], per_vertex: &mut [u32]) -> Result<u32> {
            let n = per_vertex.len();
            let adjacent = |a: usize, b: usize| targets[offsets[a] as usize..offsets[a + 1] as usize].contains(&(b as u64));
            let mut total = 0;
            for a in 0..n {
                for b in a + 1..n {
                    for c in b + 1..n {
                        if adjacent(a, b) && adjacent(b, c) && adjacent(a, c) {
                            total += 1;
                            per_vertex[a] += 1;
                            per_vertex[b] += 1;
                            per_vertex[c] += 1;
                        }
                    }
                }
            }
            Ok(total)
        }
    }

    #[test]
    fn test_degree_centrality_write_back() {
        let mut graph: PropertyGraph<i16, ()> = PropertyGraph::directed();
        for _ in 0..4 {
            graph.add_vertex(-1);
        }
        graph.add_edge(0, 3);
        graph.add_edge(1, 3);
        graph.add_edge(3, 2);
        graph.delete_vertex(0);

        let csr = export_csr(&graph);
        let scores = run_degree_centrality(&InDegree, &csr, None).unwrap();
        assert_eq!(scores, vec![0, 1, 1]);

        let written = attach_vertex_values(&graph, &csr, &scores, |p, v| *p = v).unwrap();
        assert_eq!(written, 3);
        assert_eq!(graph.vertex_property(3), Some(1));
        assert_eq!(graph.vertex_property(1), Some(0));
    }

    #[test]
    fn test_triangle_count() {
        let mut graph: PropertyGraph<u32, ()> = PropertyGraph::undirected();
        for _ in 0..4 {
            graph.add_vertex(0);
        }
        for (a, b) in [(0, 1), (1, 2), (0, 2), (2, 3)] {
            graph.add_edge(a, b);
        }

        let csr = export_csr(&graph);
        let counts = run_triangle_count(&BruteTriangles, &csr).unwrap();
        assert_eq!(counts.total, 1);
        assert_eq!(counts.per_vertex, vec![1, 1, 1, 0]);

        attach_vertex_values(&graph, &csr, &counts.per_vertex, |p, v| *p = v).unwrap();
        assert_eq!(graph.vertex_property(2), Some(1));
    }

    #[test]
    fn test_attach_length_mismatch() {
        let mut graph: PropertyGraph<u32, ()> = PropertyGraph::directed();
        graph.add_vertex(0);
        let csr = export_csr(&graph);
        let err = attach_vertex_values(&graph, &csr, &[1u32, 2], |p, v| *p = v).unwrap_err();
        assert!(matches!(err, GraphError::InvalidCsr(_)));
    }

    #[test]
    fn test_attach_skips_vertices_deleted_after_export() {
        let mut graph: PropertyGraph<u32, ()> = PropertyGraph::directed();
        graph.add_vertex(0);
        graph.add_vertex(0);
        let csr = export_csr(&graph);
        graph.delete_vertex(0);

        let written = attach_vertex_values(&graph, &csr, &[5u32, 6], |p, v| *p = v).unwrap();
        assert_eq!(written, 1);
        assert_eq!(graph.vertex_property(1), Some(6));
    }
}
