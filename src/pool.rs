//! The parallel probe-finding worker pool: an explicit open/find/close
//! lifecycle built on a `rayon` thread pool, plus a scoped convenience
//! layer of free functions on top for callers that only ever need one pool
//! open at a time.
//!
//! Unlike a hidden global singleton created on first use, the convenience
//! layer here is a plain, explicitly-named `open`/`find`/`close` triple
//! backed by one process-wide slot — opening twice or finding before
//! opening are both reported as errors, not silently papered over.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::cover::{longest_cover, CoverFn};
use crate::error::{CoreError, Result};
use crate::probe::Probe;
use crate::shared_index::{SharedKmerIndex, SharedPosting};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

pub struct ProbeFindingPool {
    thread_pool: ThreadPool,
    index: Arc<SharedKmerIndex>,
    cover_fn: CoverFn,
}

impl ProbeFindingPool {
    /// Opens a pool over an already-frozen `index` and a `cover_fn` from
    /// [`crate::cover::make_cover_fn`], so one index can be reused across
    /// several pool opens with different predicates or worker counts.
    pub fn open(
        index: Arc<SharedKmerIndex>,
        cover_fn: CoverFn,
        n_workers: Option<usize>,
        use_native_dict: bool,
    ) -> Result<ProbeFindingPool> {
        let n_threads = match n_workers {
            None | Some(0) => num_cpus::get(),
            Some(n) => n,
        };
        if use_native_dict != index.is_native() {
            warn!(
                "use_native_dict={use_native_dict} does not match the frozen index's actual storage mode"
            );
        }
        info!("opening probe-finding pool: {n_threads} workers");
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()
            .map_err(|e| CoreError::WorkerFault(e.to_string()))?;

        Ok(ProbeFindingPool {
            thread_pool,
            index,
            cover_fn,
        })
    }

    pub fn find(&self, sequence: &str) -> Result<HashMap<Probe, Vec<Range>>> {
        let k = self.index.k();
        if k == 0 || sequence.len() < k {
            return Ok(HashMap::new());
        }
        let n_positions = sequence.len() - k + 1;
        let n_workers = self.thread_pool.current_num_threads().max(1);
        let chunk_len = n_positions.div_ceil(n_workers).max(1);

        let starts: Vec<usize> = (0..n_positions).step_by(chunk_len).collect();
        let index = Arc::clone(&self.index);
        let params = self.cover_fn;

        let partials: Vec<Vec<(Probe, Range)>> = self.thread_pool.install(|| {
            starts
                .par_iter()
                .map(|&chunk_start| {
                    let chunk_end = (chunk_start + chunk_len).min(n_positions);
                    search_positions(&index, &params, sequence, chunk_start, chunk_end)
                })
                .collect()
        });

        let mut merged: HashMap<Probe, Vec<Range>> = HashMap::new();
        for part in partials {
            for (probe, range) in part {
                merged.entry(probe).or_default().push(range);
            }
        }
        for ranges in merged.values_mut() {
            ranges.sort();
            ranges.dedup();
        }
        Ok(merged)
    }

    pub fn close(self) {
        debug!("closing probe-finding pool");
    }
}

fn search_positions(
    index: &SharedKmerIndex,
    params: &CoverFn,
    sequence: &str,
    start: usize,
    end: usize,
) -> Vec<(Probe, Range)> {
    let k = index.k();
    let mut hits = Vec::new();
    for seq_pos in start..end {
        let kmer = &sequence[seq_pos..seq_pos + k];
        let Some(posting) = index.get(kmer) else {
            continue;
        };
        let SharedPosting::ProbesWithPositions(entries) = posting else {
            continue;
        };
        for (probe, probe_offset) in entries {
            let offset = seq_pos as isize - probe_offset as isize;
            if let Some((cov_start, cov_end)) =
                longest_cover(probe.as_str(), sequence, offset, params)
            {
                hits.push((
                    probe.clone(),
                    Range {
                        start: cov_start,
                        end: cov_end,
                    },
                ));
            }
        }
    }
    hits
}

static POOL: OnceLock<Mutex<Option<ProbeFindingPool>>> = OnceLock::new();

fn pool_slot() -> &'static Mutex<Option<ProbeFindingPool>> {
    POOL.get_or_init(|| Mutex::new(None))
}

/// Errors with [`CoreError::PoolAlreadyOpen`] if a pool is already open.
pub fn open_probe_finding_pool(
    index: Arc<SharedKmerIndex>,
    cover_fn: CoverFn,
    n_workers: Option<usize>,
    use_native_dict: bool,
) -> Result<()> {
    let mut slot = pool_slot().lock().unwrap();
    if slot.is_some() {
        return Err(CoreError::PoolAlreadyOpen);
    }
    *slot = Some(ProbeFindingPool::open(
        index,
        cover_fn,
        n_workers,
        use_native_dict,
    )?);
    Ok(())
}

pub fn find_probe_covers_in_sequence(sequence: &str) -> Result<HashMap<Probe, Vec<Range>>> {
    let slot = pool_slot().lock().unwrap();
    let pool = slot.as_ref().ok_or(CoreError::PoolNotOpen)?;
    pool.find(sequence)
}

pub fn close_probe_finding_pool() -> Result<()> {
    let mut slot = pool_slot().lock().unwrap();
    if slot.take().is_none() {
        return Err(CoreError::PoolNotOpen);
    }
    Ok(())
}
