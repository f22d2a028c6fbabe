//! Dataset IO: CSV edge lists, binary CSR snapshots, deletion id batches

pub mod csr;
pub mod csv;
pub mod id_batch;

pub use self::csr::{export_csr, load_csr, CsrGraph};
pub use self::csv::{
    load_edges_csv, load_vertices_csv, CsvOptions, EdgeCsvOptions, EdgeLoadMode, EdgeLoadReport,
    AUTO_ID_FLOOR, AUTO_ID_SPAN_PER_ID,
};
pub use self::id_batch::{read_id_batch, require_id_batch};

/// Default file names inside a dataset directory
pub const VERTEX_CSV: &str = "vertex.csv";
pub const EDGE_CSV: &str = "edge.csv";
pub const VERTEX_CSR: &str = "vertex.CSR";
pub const EDGE_CSR: &str = "edge.CSR";
pub const ID_BATCH: &str = "id.rand";
