//! CSV vertex / edge list loading
//!
//! Both loaders parse and validate the whole file before touching the store.
//! Lines starting with `#` and blank lines are ignored; fields are trimmed.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use ::csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::{GraphError, Result};
use crate::graph::{PropertyGraph, VertexId};

/// Without an explicit `max_vertex_id`, ids up to this value are always accepted.
pub const AUTO_ID_FLOOR: VertexId = 1 << 16;

/// Without an explicit `max_vertex_id`, each id a file may introduce widens the
/// accepted range by this many slots. The store is id-indexed, so one stray
/// huge id would otherwise allocate an arena far beyond the input.
pub const AUTO_ID_SPAN_PER_ID: VertexId = 64;

/// Options for `load_vertices_csv`
#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub has_header: bool,
    pub separator: u8,
    pub id_column: usize,
    /// Largest accepted id; `None` derives the limit from the row count
    pub max_vertex_id: Option<VertexId>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            separator: b',',
            id_column: 0,
            max_vertex_id: None,
        }
    }
}

/// What to do with an edge row whose endpoint is not a live vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeLoadMode {
    /// Fail the load with `UnknownVertex`
    #[default]
    Strict,
    /// Create the endpoint under that id with a default property
    CreateMissing,
}

/// Options for `load_edges_csv`
#[derive(Debug, Clone)]
pub struct EdgeCsvOptions {
    pub has_header: bool,
    pub separator: u8,
    pub src_column: usize,
    pub dst_column: usize,
    /// Reject the file if the loaded graph contains a directed cycle
    pub dag_check: bool,
    pub mode: EdgeLoadMode,
    /// Largest accepted id; `None` derives the limit from the row count
    pub max_vertex_id: Option<VertexId>,
}

impl Default for EdgeCsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            separator: b',',
            src_column: 0,
            dst_column: 1,
            dag_check: false,
            mode: EdgeLoadMode::Strict,
            max_vertex_id: None,
        }
    }
}

/// Counts from one edge file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeLoadReport {
    pub rows: usize,
    pub created: usize,
    /// Rows naming a pair that already had an edge
    pub duplicates: usize,
    /// Endpoints created by `EdgeLoadMode::CreateMissing`
    pub created_vertices: usize,
}

fn reader(path: &Path, has_header: bool, separator: u8) -> Result<::csv::Reader<File>> {
    let file = File::open(path)?;
    Ok(ReaderBuilder::new()
        .has_headers(has_header)
        .delimiter(separator)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file))
}

/// Each non-blank record with its 1-based line number
fn records(path: &Path, has_header: bool, separator: u8) -> Result<Vec<(u64, StringRecord)>> {
    let mut reader = reader(path, has_header, separator)?;
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line());
        rows.push((line, record));
    }
    Ok(rows)
}

/// Explicit limit, or one proportional to how many ids the file can introduce.
/// Ids the store already covers stay accepted.
fn id_limit(explicit: Option<VertexId>, introduced: usize, id_bound: VertexId) -> VertexId {
    explicit.unwrap_or_else(|| {
        let span = (introduced as VertexId).saturating_mul(AUTO_ID_SPAN_PER_ID);
        span.max(AUTO_ID_FLOOR).max(id_bound)
    })
}

fn check_limit(id: VertexId, limit: VertexId) -> Result<()> {
    if id > limit {
        return Err(GraphError::VertexIdTooLarge { id, limit });
    }
    Ok(())
}

fn parse_id(record: &StringRecord, column: usize, path: &Path, line: u64) -> Result<VertexId> {
    let raw = record.get(column).ok_or_else(|| GraphError::Malformed {
        path: path.to_path_buf(),
        line,
        reason: format!("missing column {}", column),
    })?;
    let id = raw.parse::<VertexId>().map_err(|e| GraphError::Malformed {
        path: path.to_path_buf(),
        line,
        reason: format!("column {}: {:?} is not a vertex id ({})", column, raw, e),
    })?;
    Ok(id)
}

/// Create one vertex (default property) per row, under the id in `id_column`.
///
/// Fails without mutating the store if any row is malformed, repeats an id
/// from earlier in the file, or names an id the store already has.
pub fn load_vertices_csv<V, E>(
    graph: &mut PropertyGraph<V, E>,
    path: impl AsRef<Path>,
    options: &CsvOptions,
) -> Result<usize>
where
    V: Default,
{
    let path = path.as_ref();
    let rows = records(path, options.has_header, options.separator)?;

    let parsed = rows
        .iter()
        .map(|(line, record)| -> Result<(u64, VertexId)> {
            Ok((*line, parse_id(record, options.id_column, path, *line)?))
        })
        .collect::<Result<Vec<_>>>()?;
    let limit = id_limit(options.max_vertex_id, parsed.len(), graph.id_bound());

    let mut seen: HashMap<VertexId, u64> = HashMap::with_capacity(parsed.len());
    let mut ids = Vec::with_capacity(parsed.len());
    for &(line, id) in &parsed {
        check_limit(id, limit)?;
        if seen.insert(id, line).is_some() {
            return Err(GraphError::DuplicateVertex { path: path.to_path_buf(), line, id });
        }
        match graph.claimable(id) {
            Ok(()) => {}
            Err(GraphError::VertexExists(_)) => {
                return Err(GraphError::DuplicateVertex { path: path.to_path_buf(), line, id });
            }
            Err(e) => return Err(e),
        }
        ids.push(id);
    }

    for &id in &ids {
        graph.add_vertex_with_id(id, V::default())?;
    }

    tracing::info!("Loaded {} vertices from {:?}", ids.len(), path);
    Ok(ids.len())
}

/// Insert one edge per row, `src_column -> dst_column`, with a default property.
///
/// Rows are parsed and endpoints resolved before the first insertion. A row
/// repeating an existing pair is dropped and counted. With `dag_check` the
/// store is scanned for a cycle after insertion; on `Cycle` the edges are
/// already in place and the store should be discarded.
pub fn load_edges_csv<V, E>(
    graph: &mut PropertyGraph<V, E>,
    path: impl AsRef<Path>,
    options: &EdgeCsvOptions,
) -> Result<EdgeLoadReport>
where
    V: Default,
    E: Clone + Default,
{
    let path = path.as_ref();
    if options.dag_check && !graph.is_directed() {
        return Err(GraphError::NotDirected);
    }

    let rows = records(path, options.has_header, options.separator)?;
    let parsed = rows
        .iter()
        .map(|(line, record)| -> Result<(u64, VertexId, VertexId)> {
            let src = parse_id(record, options.src_column, path, *line)?;
            let dst = parse_id(record, options.dst_column, path, *line)?;
            Ok((*line, src, dst))
        })
        .collect::<Result<Vec<_>>>()?;
    let limit = id_limit(options.max_vertex_id, parsed.len() * 2, graph.id_bound());

    let mut pairs = Vec::with_capacity(parsed.len());
    let mut missing: Vec<VertexId> = Vec::new();

    for &(line, src, dst) in &parsed {
        check_limit(src, limit)?;
        check_limit(dst, limit)?;
        for id in [src, dst] {
            if graph.contains_vertex(id) {
                continue;
            }
            match options.mode {
                EdgeLoadMode::Strict => {
                    return Err(GraphError::UnknownVertex { path: path.to_path_buf(), line, id });
                }
                EdgeLoadMode::CreateMissing => {
                    graph.claimable(id)?;
                    missing.push(id);
                }
            }
        }
        pairs.push((src, dst));
    }

    missing.sort_unstable();
    missing.dedup();
    for &id in &missing {
        graph.add_vertex_with_id(id, V::default())?;
    }

    let mut report = EdgeLoadReport {
        rows: pairs.len(),
        created_vertices: missing.len(),
        ..Default::default()
    };
    for (src, dst) in pairs {
        if graph.add_edge(src, dst).is_created() {
            report.created += 1;
        } else {
            report.duplicates += 1;
        }
    }

    if report.duplicates > 0 {
        tracing::warn!("{:?}: dropped {} duplicate edge rows", path, report.duplicates);
    }
    tracing::info!(
        "Loaded {} edges from {:?} ({} rows, {} new endpoints)",
        report.created,
        path,
        report.rows,
        report.created_vertices
    );

    if options.dag_check {
        if let Some(vertex) = graph.find_cycle() {
            return Err(GraphError::Cycle { vertex });
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_vertices_with_header_and_comments() {
        let file = csv_file("id,name\n# comment\n3,c\n\n1,a\n 2 ,b\n");
        let mut graph: PropertyGraph<u8, ()> = PropertyGraph::directed();

        let loaded = load_vertices_csv(&mut graph, file.path(), &CsvOptions::default()).unwrap();
        assert_eq!(loaded, 3);
        assert_eq!(graph.vertex_ids().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(!graph.contains_vertex(0));
    }

    #[test]
    fn test_load_vertices_custom_separator_and_column() {
        let file = csv_file("x;7\ny;9\n");
        let mut graph: PropertyGraph<(), ()> = PropertyGraph::directed();
        let options = CsvOptions { has_header: false, separator: b';', id_column: 1, ..Default::default() };

        load_vertices_csv(&mut graph, file.path(), &options).unwrap();
        assert_eq!(graph.vertex_ids().collect::<Vec<_>>(), vec![7, 9]);
    }

    #[test]
    fn test_duplicate_vertex_leaves_store_untouched() {
        let file = csv_file("id\n0\n1\n0\n");
        let mut graph: PropertyGraph<(), ()> = PropertyGraph::directed();

        let err = load_vertices_csv(&mut graph, file.path(), &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateVertex { line: 4, id: 0, .. }));
        assert_eq!(graph.num_vertices(), 0);
    }

    #[test]
    fn test_vertex_already_in_store() {
        let file = csv_file("5\n");
        let mut graph: PropertyGraph<(), ()> = PropertyGraph::directed();
        graph.add_vertex_with_id(5, ()).unwrap();
        let options = CsvOptions { has_header: false, ..Default::default() };

        let err = load_vertices_csv(&mut graph, file.path(), &options).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateVertex { id: 5, .. }));
    }

    #[test]
    fn test_malformed_vertex_row_reports_line() {
        let file = csv_file("id\n0\nabc\n");
        let mut graph: PropertyGraph<(), ()> = PropertyGraph::directed();

        let err = load_vertices_csv(&mut graph, file.path(), &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, GraphError::Malformed { line: 3, .. }));
        assert_eq!(graph.num_vertices(), 0);
    }

    #[test]
    fn test_vertex_id_limit() {
        let file = csv_file("99999\n");
        let mut graph: PropertyGraph<(), ()> = PropertyGraph::directed();
        let options = CsvOptions { has_header: false, max_vertex_id: Some(1000), ..Default::default() };

        let err = load_vertices_csv(&mut graph, file.path(), &options).unwrap_err();
        assert!(matches!(err, GraphError::VertexIdTooLarge { id: 99999, limit: 1000 }));
    }

    #[test]
    fn test_sparse_high_id_rejected_by_default() {
        let file = csv_file("id\n0\n4000000000\n");
        let mut graph: PropertyGraph<u64, u64> = PropertyGraph::directed();

        let err = load_vertices_csv(&mut graph, file.path(), &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, GraphError::VertexIdTooLarge { id: 4000000000, limit: AUTO_ID_FLOOR }));
        assert_eq!(graph.num_vertices(), 0);
        assert_eq!(graph.id_bound(), 0);
    }

    #[test]
    fn test_default_limit_grows_with_rows() {
        let rows: String = (0..2000).map(|i| format!("{}\n", i * 50)).collect();
        let file = csv_file(&rows);
        let mut graph: PropertyGraph<(), ()> = PropertyGraph::directed();
        let options = CsvOptions { has_header: false, ..Default::default() };

        assert_eq!(load_vertices_csv(&mut graph, file.path(), &options).unwrap(), 2000);
        assert!(graph.contains_vertex(99950));
    }

    #[test]
    fn test_sparse_endpoint_rejected_by_default() {
        let file = csv_file("0,1\n1,9000000000\n");
        let mut graph: PropertyGraph<(), ()> = PropertyGraph::directed();
        let options = EdgeCsvOptions { has_header: false, mode: EdgeLoadMode::CreateMissing, ..Default::default() };

        let err = load_edges_csv(&mut graph, file.path(), &options).unwrap_err();
        assert!(matches!(err, GraphError::VertexIdTooLarge { id: 9000000000, .. }));
        assert_eq!(graph.num_vertices(), 0);
    }

    #[test]
    fn test_default_limit_covers_existing_ids() {
        let mut graph: PropertyGraph<(), ()> = PropertyGraph::directed();
        graph.add_vertex_with_id(0, ()).unwrap();
        graph.add_vertex_with_id(100_000, ()).unwrap();
        let file = csv_file("0,100000\n");
        let options = EdgeCsvOptions { has_header: false, ..Default::default() };

        let report = load_edges_csv(&mut graph, file.path(), &options).unwrap();
        assert_eq!(report.created, 1);
    }

    #[test]
    fn test_load_edges_counts_duplicates() {
        let mut graph: PropertyGraph<(), u32> = PropertyGraph::directed();
        for _ in 0..3 {
            graph.add_vertex(());
        }
        let file = csv_file("src,dst\n0,1\n1,2\n0,1\n");

        let report = load_edges_csv(&mut graph, file.path(), &EdgeCsvOptions::default()).unwrap();
        assert_eq!(report.rows, 3);
        assert_eq!(report.created, 2);
        assert_eq!(report.duplicates, 1);
        assert_eq!(graph.num_edges(), 2);
    }

    #[test]
    fn test_edge_with_unknown_endpoint_strict() {
        let mut graph: PropertyGraph<(), ()> = PropertyGraph::directed();
        graph.add_vertex(());
        graph.add_vertex(());
        let file = csv_file("src,dst\n0,1\n1,8\n");

        let err = load_edges_csv(&mut graph, file.path(), &EdgeCsvOptions::default()).unwrap_err();
        assert!(matches!(err, GraphError::UnknownVertex { line: 3, id: 8, .. }));
        assert_eq!(graph.num_edges(), 0);
    }

    #[test]
    fn test_edges_create_missing_endpoints() {
        let mut graph: PropertyGraph<(), ()> = PropertyGraph::directed();
        let file = csv_file("4,2\n2,9\n");
        let options = EdgeCsvOptions {
            has_header: false,
            mode: EdgeLoadMode::CreateMissing,
            ..Default::default()
        };

        let report = load_edges_csv(&mut graph, file.path(), &options).unwrap();
        assert_eq!(report.created_vertices, 3);
        assert_eq!(graph.vertex_ids().collect::<Vec<_>>(), vec![2, 4, 9]);
        assert!(graph.find_out_edge(4, 2).is_some());
        assert!(graph.find_out_edge(2, 9).is_some());
    }

    #[test]
    fn test_dag_check_rejects_cycle() {
        let mut graph: PropertyGraph<(), ()> = PropertyGraph::directed();
        for _ in 0..3 {
            graph.add_vertex(());
        }
        let file = csv_file("0,1\n1,2\n2,0\n");
        let options = EdgeCsvOptions { has_header: false, dag_check: true, ..Default::default() };

        let err = load_edges_csv(&mut graph, file.path(), &options).unwrap_err();
        assert!(matches!(err, GraphError::Cycle { vertex } if vertex < 3));
    }

    #[test]
    fn test_dag_check_on_undirected_store() {
        let mut graph: PropertyGraph<(), ()> = PropertyGraph::undirected();
        let file = csv_file("0,1\n");
        let options = EdgeCsvOptions { has_header: false, dag_check: true, ..Default::default() };

        let err = load_edges_csv(&mut graph, file.path(), &options).unwrap_err();
        assert!(matches!(err, GraphError::NotDirected));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut graph: PropertyGraph<(), ()> = PropertyGraph::directed();
        let err = load_vertices_csv(&mut graph, "/nonexistent/vertex.csv", &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, GraphError::Io(_)));
    }
}
