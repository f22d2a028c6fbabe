//! Compressed sparse row snapshots
//!
//! On disk a CSR is two flat files of little-endian `u64`: vertex offsets
//! (`n + 1` entries) and edge targets (`offsets[n]` entries). Targets are
//! positions in `0..n`, not vertex ids.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use memmap2::Mmap;

use crate::error::{GraphError, Result};
use crate::graph::{PropertyGraph, VertexId};

/// Validated CSR arrays plus the position -> vertex id mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrGraph {
    vertex_offsets: Vec<u64>,
    edge_targets: Vec<u64>,
    vertex_ids: Vec<VertexId>,
}

impl CsrGraph {
    /// CSR whose positions are also the vertex ids (`0..n`)
    pub fn from_parts(vertex_offsets: Vec<u64>, edge_targets: Vec<u64>) -> Result<Self> {
        let n = vertex_offsets.len().saturating_sub(1) as VertexId;
        Self::with_vertex_ids(vertex_offsets, edge_targets, (0..n).collect())
    }

    pub fn with_vertex_ids(vertex_offsets: Vec<u64>, edge_targets: Vec<u64>, vertex_ids: Vec<VertexId>) -> Result<Self> {
        let csr = Self { vertex_offsets, edge_targets, vertex_ids };
        csr.validate()?;
        Ok(csr)
    }

    fn validate(&self) -> Result<()> {
        let Some((&first, _)) = self.vertex_offsets.split_first() else {
            return Err(GraphError::InvalidCsr("vertex offsets are empty".to_string()));
        };
        if first != 0 {
            return Err(GraphError::InvalidCsr(format!("first offset is {}, expected 0", first)));
        }
        if let Some(pos) = self.vertex_offsets.windows(2).position(|w| w[0] > w[1]) {
            return Err(GraphError::InvalidCsr(format!("offsets decrease at vertex {}", pos)));
        }

        let last = self.vertex_offsets[self.vertex_offsets.len() - 1];
        if last != self.edge_targets.len() as u64 {
            return Err(GraphError::InvalidCsr(format!(
                "last offset {} does not match {} edge targets",
                last,
                self.edge_targets.len()
            )));
        }

        let n = self.num_vertices() as u64;
        if let Some(&target) = self.edge_targets.iter().find(|&&t| t >= n) {
            return Err(GraphError::InvalidCsr(format!("edge target {} out of range for {} vertices", target, n)));
        }

        if self.vertex_ids.len() as u64 != n {
            return Err(GraphError::InvalidCsr(format!("{} vertex ids for {} vertices", self.vertex_ids.len(), n)));
        }
        if self.vertex_ids.windows(2).any(|w| w[0] >= w[1]) {
            return Err(GraphError::InvalidCsr("vertex ids are not strictly increasing".to_string()));
        }
        Ok(())
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_offsets.len() - 1
    }

    pub fn num_edges(&self) -> usize {
        self.edge_targets.len()
    }

    pub fn vertex_offsets(&self) -> &[u64] {
        &self.vertex_offsets
    }

    pub fn edge_targets(&self) -> &[u64] {
        &self.edge_targets
    }

    /// Vertex id at each position
    pub fn vertex_ids(&self) -> &[VertexId] {
        &self.vertex_ids
    }

    /// Target positions of the vertex at `position`
    pub fn neighbors(&self, position: usize) -> &[u64] {
        match (self.vertex_offsets.get(position), self.vertex_offsets.get(position + 1)) {
            (Some(&start), Some(&end)) => &self.edge_targets[start as usize..end as usize],
            _ => &[],
        }
    }

    pub fn into_parts(self) -> (Vec<u64>, Vec<u64>) {
        (self.vertex_offsets, self.edge_targets)
    }

    /// Map both files and decode them. Positions become the vertex ids.
    pub fn read_files(vertex_path: impl AsRef<Path>, edge_path: impl AsRef<Path>) -> Result<Self> {
        let offsets = read_u64_file(vertex_path.as_ref())?;
        let targets = read_u64_file(edge_path.as_ref())?;
        Self::from_parts(offsets, targets)
    }

    pub fn write_files(&self, vertex_path: impl AsRef<Path>, edge_path: impl AsRef<Path>) -> Result<()> {
        write_u64_file(vertex_path.as_ref(), &self.vertex_offsets)?;
        write_u64_file(edge_path.as_ref(), &self.edge_targets)?;
        tracing::info!(
            "Wrote CSR: {} vertices, {} edges to {:?}",
            self.num_vertices(),
            self.num_edges(),
            vertex_path.as_ref()
        );
        Ok(())
    }

    /// Build a directed store holding one vertex per position (under its
    /// recorded id) and one edge per target. Repeated pairs collapse to one edge.
    pub fn to_graph<V, E>(&self) -> Result<PropertyGraph<V, E>>
    where
        V: Default,
        E: Clone + Default,
    {
        let mut graph = PropertyGraph::directed();
        for &id in &self.vertex_ids {
            graph.add_vertex_with_id(id, V::default())?;
        }

        let mut duplicates = 0usize;
        for (position, &src) in self.vertex_ids.iter().enumerate() {
            for &target in self.neighbors(position) {
                let dst = self.vertex_ids[target as usize];
                if !graph.add_edge(src, dst).is_created() {
                    duplicates += 1;
                }
            }
        }

        if duplicates > 0 {
            tracing::warn!("CSR input held {} duplicate edges; collapsed", duplicates);
        }
        tracing::info!("Loaded CSR: {} vertices, {} edges", graph.num_vertices(), graph.num_edges());
        Ok(graph)
    }
}

/// Snapshot the store as CSR: live vertices in ascending id order, each
/// vertex's out-edges in iteration order. Call while no mutation is in flight.
pub fn export_csr<V, E>(graph: &PropertyGraph<V, E>) -> CsrGraph {
    let vertex_ids: Vec<VertexId> = graph.vertex_ids().collect();
    let mut vertex_offsets = Vec::with_capacity(vertex_ids.len() + 1);
    let mut edge_targets = Vec::with_capacity(graph.num_edges());
    vertex_offsets.push(0);

    for &id in &vertex_ids {
        if let Some(vertex) = graph.find_vertex(id) {
            edge_targets.extend(
                vertex
                    .out_edges()
                    .filter_map(|edge| vertex_ids.binary_search(&edge.target()).ok())
                    .map(|position| position as u64),
            );
        }
        vertex_offsets.push(edge_targets.len() as u64);
    }

    CsrGraph { vertex_offsets, edge_targets, vertex_ids }
}

/// Validate the arrays and build a directed store with vertices `0..n`
pub fn load_csr<V, E>(vertex_offsets: Vec<u64>, edge_targets: Vec<u64>) -> Result<PropertyGraph<V, E>>
where
    V: Default,
    E: Clone + Default,
{
    CsrGraph::from_parts(vertex_offsets, edge_targets)?.to_graph()
}

fn read_u64_file(path: &Path) -> Result<Vec<u64>> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(Vec::new());
    }
    if len % 8 != 0 {
        return Err(GraphError::InvalidCsr(format!(
            "{:?}: length {} is not a multiple of 8",
            path, len
        )));
    }

    let mmap = unsafe { Mmap::map(&file)? };
    Ok(mmap
        .chunks_exact(8)
        .map(|chunk| {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            u64::from_le_bytes(word)
        })
        .collect())
}

fn write_u64_file(path: &Path, values: &[u64]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for value in values {
        writer.write_all(&value.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}
