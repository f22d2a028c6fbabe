//! Benchmark run configuration (JSON)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::graph::generate::DEFAULT_SEED;
use crate::graph::{ThreadCount, VertexId};
use crate::storage::{
    CsvOptions, EdgeCsvOptions, EdgeLoadMode, EDGE_CSR, EDGE_CSV, ID_BATCH, VERTEX_CSR,
    VERTEX_CSV,
};

/// Settings shared by every driver workflow. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Directory holding vertex.csv, edge.csv, vertex.CSR, edge.CSR, id.rand
    pub dataset: PathBuf,
    pub separator: String,
    pub has_header: bool,
    pub threads: usize,
    /// Number of ids read from id.rand for eviction
    pub delete: usize,
    /// Random construction size
    pub vertices: usize,
    pub edges: usize,
    pub seed: u64,
    /// Skip vertex.csv and let edge rows create their endpoints
    pub edges_only: bool,
    /// Largest id the loaders accept; unset scales the limit with the file
    pub max_vertex_id: Option<VertexId>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("."),
            separator: ",".to_string(),
            has_header: true,
            threads: 1,
            delete: 10,
            vertices: 100,
            edges: 1000,
            seed: DEFAULT_SEED,
            edges_only: false,
            max_vertex_id: None,
        }
    }
}

impl BenchConfig {
    pub fn read_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.thread_count()?;
        self.separator_byte()?;
        Ok(())
    }

    pub fn thread_count(&self) -> Result<ThreadCount> {
        ThreadCount::new(self.threads)
    }

    /// The separator as a single ASCII byte
    pub fn separator_byte(&self) -> Result<u8> {
        match self.separator.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(GraphError::InvalidConfig(format!(
                "separator must be one ASCII character, got {:?}",
                self.separator
            ))),
        }
    }

    pub fn vertex_csv_options(&self) -> Result<CsvOptions> {
        Ok(CsvOptions {
            has_header: self.has_header,
            separator: self.separator_byte()?,
            id_column: 0,
            max_vertex_id: self.max_vertex_id,
        })
    }

    pub fn edge_csv_options(&self, dag_check: bool) -> Result<EdgeCsvOptions> {
        Ok(EdgeCsvOptions {
            has_header: self.has_header,
            separator: self.separator_byte()?,
            src_column: 0,
            dst_column: 1,
            dag_check,
            mode: if self.edges_only { EdgeLoadMode::CreateMissing } else { EdgeLoadMode::Strict },
            max_vertex_id: self.max_vertex_id,
        })
    }

    pub fn vertex_csv(&self) -> PathBuf {
        self.dataset.join(VERTEX_CSV)
    }

    pub fn edge_csv(&self) -> PathBuf {
        self.dataset.join(EDGE_CSV)
    }

    pub fn vertex_csr(&self) -> PathBuf {
        self.dataset.join(VERTEX_CSR)
    }

    pub fn edge_csr(&self) -> PathBuf {
        self.dataset.join(EDGE_CSR)
    }

    pub fn id_batch(&self) -> PathBuf {
        self.dataset.join(ID_BATCH)
    }
}
