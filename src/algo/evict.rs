//! Partitioned batch vertex deletion

use std::iter::Sum;
use std::ops::Add;

use crate::error::Result;
use crate::graph::partition::run_partitioned;
use crate::graph::{PropertyGraph, ThreadCount, VertexId};

/// Per-batch deletion counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvictionReport {
    pub deleted: usize,
    /// Ids that were not live when their worker reached them
    pub missing: usize,
    /// Ids never attempted because the store was already empty
    pub skipped: usize,
}

impl EvictionReport {
    pub fn attempted(&self) -> usize {
        self.deleted + self.missing
    }
}

impl Add for EvictionReport {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            deleted: self.deleted + other.deleted,
            missing: self.missing + other.missing,
            skipped: self.skipped + other.skipped,
        }
    }
}

impl Sum for EvictionReport {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Delete every vertex named in `ids`. The list is cut into `threads`
/// contiguous chunks; each worker deletes its chunk in order and stops once
/// the store has no live vertices left. Absent ids are counted, not errors.
pub fn evict<V, E>(graph: &PropertyGraph<V, E>, ids: &[VertexId], threads: ThreadCount) -> Result<EvictionReport>
where
    V: Send + Sync,
    E: Send + Sync,
{
    let per_worker = run_partitioned(ids.len(), threads, |worker, range| {
        let chunk = &ids[range];
        let mut report = EvictionReport::default();

        for (done, &id) in chunk.iter().enumerate() {
            if graph.num_vertices() == 0 {
                report.skipped = chunk.len() - done;
                break;
            }
            if graph.delete_vertex(id) {
                report.deleted += 1;
            } else {
                report.missing += 1;
            }
        }

        tracing::debug!(
            "Worker {} evicted {} of {} ids ({} missing, {} skipped)",
            worker,
            report.deleted,
            chunk.len(),
            report.missing,
            report.skipped
        );
        report
    })?;

    let report: EvictionReport = per_worker.into_iter().sum();
    tracing::info!(
        "Evicted {} vertices ({} missing, {} skipped); {} vertices, {} edges remain",
        report.deleted,
        report.missing,
        report.skipped,
        graph.num_vertices(),
        graph.num_edges()
    );
    Ok(report)
}
