//! Static contiguous partitioning over a fixed-size worker pool

use std::fmt;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::str::FromStr;

use rayon::ThreadPoolBuilder;

use crate::error::{GraphError, Result};

/// Validated worker count (at least one)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadCount(NonZeroUsize);

impl ThreadCount {
    pub const ONE: ThreadCount = ThreadCount(NonZeroUsize::MIN);

    pub fn new(threads: usize) -> Result<Self> {
        NonZeroUsize::new(threads)
            .map(Self)
            .ok_or_else(|| GraphError::InvalidConfig("thread count must be at least 1".to_string()))
    }

    /// Hardware parallelism, or one thread if it cannot be queried
    pub fn available() -> Self {
        std::thread::available_parallelism().map(Self).unwrap_or(Self::ONE)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for ThreadCount {
    fn default() -> Self {
        Self::ONE
    }
}

/// A positive integer, or `auto` for `ThreadCount::available`
impl FromStr for ThreadCount {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::available());
        }
        let threads = s
            .parse::<usize>()
            .map_err(|e| GraphError::InvalidConfig(format!("thread count {:?}: {}", s, e)))?;
        Self::new(threads)
    }
}

impl fmt::Display for ThreadCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `ceil(len / threads)`
pub fn chunk_size(len: usize, threads: ThreadCount) -> usize {
    len.div_ceil(threads.get())
}

/// Half-open slice of `0..len` owned by worker `index`. Trailing workers may get an empty range.
pub fn chunk_range(len: usize, threads: ThreadCount, index: usize) -> Range<usize> {
    let chunk = chunk_size(len, threads);
    let start = index.saturating_mul(chunk).min(len);
    let end = start.saturating_add(chunk).min(len);
    start..end
}

/// Run `body(worker, range)` once on each of `threads` workers, where `range`
/// is that worker's chunk of `0..len`. Returns per-worker results in worker order
/// once every worker has finished.
///
/// A single thread runs inline on the caller.
pub fn run_partitioned<T, F>(len: usize, threads: ThreadCount, body: F) -> Result<Vec<T>>
where
    F: Fn(usize, Range<usize>) -> T + Sync,
    T: Send,
{
    if threads.get() == 1 {
        return Ok(vec![body(0, 0..len)]);
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(threads.get())
        .thread_name(|i| format!("topomorph-worker-{}", i))
        .build()?;

    Ok(pool.broadcast(|ctx| body(ctx.index(), chunk_range(len, threads, ctx.index()))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_thread_count_rejects_zero() {
        assert!(matches!(ThreadCount::new(0), Err(GraphError::InvalidConfig(_))));
        assert_eq!(ThreadCount::new(3).unwrap().get(), 3);
        assert_eq!(ThreadCount::default(), ThreadCount::ONE);
    }

    #[test]
    fn test_thread_count_from_str() {
        assert_eq!("4".parse::<ThreadCount>().unwrap().get(), 4);
        assert_eq!("auto".parse::<ThreadCount>().unwrap(), ThreadCount::available());
        assert!(ThreadCount::available().get() >= 1);
        for bad in ["0", "-1", "many", ""] {
            assert!(matches!(bad.parse::<ThreadCount>(), Err(GraphError::InvalidConfig(_))), "{:?}", bad);
        }
    }

    #[test]
    fn test_chunks_cover_range_exactly_once() {
        for len in [0usize, 1, 7, 10, 64, 101] {
            for threads in 1..=9 {
                let threads = ThreadCount::new(threads).unwrap();
                let mut covered = Vec::new();
                for t in 0..threads.get() {
                    covered.extend(chunk_range(len, threads, t));
                }
                assert_eq!(covered, (0..len).collect::<Vec<_>>(), "len={} threads={}", len, threads);
            }
        }
    }

    #[test]
    fn test_more_threads_than_items() {
        let threads = ThreadCount::new(8).unwrap();
        assert_eq!(chunk_range(3, threads, 0), 0..1);
        assert_eq!(chunk_range(3, threads, 2), 2..3);
        assert!(chunk_range(3, threads, 5).is_empty());
    }

    #[test]
    fn test_run_partitioned_visits_every_index() {
        let seen = AtomicUsize::new(0);
        let threads = ThreadCount::new(4).unwrap();
        let per_worker = run_partitioned(10, threads, |_, range| {
            seen.fetch_add(range.len(), Ordering::Relaxed);
            range.len()
        })
        .unwrap();

        assert_eq!(per_worker, vec![3, 3, 3, 1]);
        assert_eq!(seen.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn test_run_partitioned_single_thread_inline() {
        let results = run_partitioned(5, ThreadCount::ONE, |worker, range| (worker, range)).unwrap();
        assert_eq!(results, vec![(0, 0..5)]);
    }
}
