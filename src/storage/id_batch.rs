//! Deletion id lists: one vertex id per line

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{GraphError, Result};
use crate::graph::VertexId;

/// Read at most `limit` ids from `path`. Blank lines and `#` lines are skipped.
pub fn read_id_batch(path: impl AsRef<Path>, limit: usize) -> Result<Vec<VertexId>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut ids = Vec::with_capacity(limit.min(1 << 20));

    for (index, line) in reader.lines().enumerate() {
        if ids.len() >= limit {
            break;
        }
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let id = text.parse::<VertexId>().map_err(|e| GraphError::Malformed {
            path: path.to_path_buf(),
            line: index as u64 + 1,
            reason: format!("{:?} is not a vertex id ({})", text, e),
        })?;
        ids.push(id);
    }

    tracing::debug!("Read {} ids from {:?}", ids.len(), path);
    Ok(ids)
}

/// Exactly `count` ids, or `IdBatchShort` if the file runs out first
pub fn require_id_batch(path: impl AsRef<Path>, count: usize) -> Result<Vec<VertexId>> {
    let ids = read_id_batch(path, count)?;
    if ids.len() < count {
        return Err(GraphError::IdBatchShort { requested: count, found: ids.len() });
    }
    Ok(ids)
}
