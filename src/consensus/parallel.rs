// Multi-threaded nonce search over partitioned ranges

use crate::consensus::pow::{
    CancelToken, DEFAULT_PROGRESS_INTERVAL, Miner, MiningOutcome, NonceRange, Progress, Solution,
};
use crate::consensus::Target;
use crate::core::BlockHeader;
use crate::error::Result;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Splits the nonce range across worker threads.
///
/// Every worker mines its own copy of the header over a contiguous slice of
/// the range. A worker that finds a solution cancels the workers above it,
/// so the reported nonce is always the lowest winning nonce in the range,
/// the same one a single [`Miner`] would return.
#[derive(Debug, Clone)]
pub struct ParallelMiner {
    workers: usize,
    range: NonceRange,
    progress_interval: u64,
    cancel: Option<CancelToken>,
}

impl ParallelMiner {
    /// Create a miner with `workers` threads; 0 uses every logical CPU
    pub fn new(workers: usize) -> Self {
        let workers = if workers == 0 { num_cpus::get() } else { workers };
        Self {
            workers,
            range: NonceRange::full(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            cancel: None,
        }
    }

    pub fn with_range(mut self, range: NonceRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn mine(&self, header: &mut BlockHeader) -> Result<MiningOutcome> {
        self.mine_with(header, &|_: &Progress| {})
    }

    /// Mine `header`, passing combined progress of all workers to `observer`.
    ///
    /// Attempts in the outcome are summed over every worker.
    pub fn mine_with<O>(&self, header: &mut BlockHeader, observer: &O) -> Result<MiningOutcome>
    where
        O: Fn(&Progress) + Sync,
    {
        let target = Target::from_compact(header.bits)?;
        let chunks = self.range.split(self.workers);
        let parent = self.cancel.clone().unwrap_or_default();
        let tokens: Vec<CancelToken> = chunks.iter().map(|_| parent.child()).collect();

        let template = header.clone();
        let total_attempts = AtomicU64::new(0);
        let start_time = Instant::now();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(chunks.len())
            .build()?;

        log::debug!("Searching {} nonces with {} workers", self.range.len(), chunks.len());

        let results: Vec<(MiningOutcome, Option<u32>)> = pool.install(|| {
            chunks
                .par_iter()
                .enumerate()
                .map(|(index, chunk)| {
                    let mut local = template.clone();
                    let miner = Miner::new()
                        .with_range(*chunk)
                        .with_progress_interval(self.progress_interval)
                        .with_cancel_token(tokens[index].clone());

                    let mut report = |progress: &Progress| {
                        let attempts = total_attempts
                            .fetch_add(self.progress_interval, Ordering::Relaxed)
                            + self.progress_interval;
                        observer(&Progress {
                            attempts,
                            nonce: progress.nonce,
                            elapsed: start_time.elapsed(),
                        });
                    };

                    let outcome = miner.mine_to_target(&mut local, &target, &mut report);
                    if let MiningOutcome::Found(solution) = &outcome {
                        log::debug!("Worker {} found nonce {}", index, solution.nonce);
                        // Higher slices can only hold higher nonces
                        for token in &tokens[index + 1..] {
                            token.cancel();
                        }
                    }

                    let last_nonce = (outcome.attempts() > 0).then_some(local.nonce);
                    (outcome, last_nonce)
                })
                .collect()
        });

        let attempts: u64 = results.iter().map(|(outcome, _)| outcome.attempts()).sum();

        let winner = results
            .iter()
            .filter_map(|(outcome, _)| outcome.solution())
            .min_by_key(|solution| solution.nonce);

        if let Some(solution) = winner {
            header.nonce = solution.nonce;
            return Ok(MiningOutcome::Found(Solution {
                nonce: solution.nonce,
                hash: solution.hash,
                attempts,
                duration: start_time.elapsed(),
            }));
        }

        if let Some(last) = results.iter().filter_map(|(_, nonce)| *nonce).max() {
            header.nonce = last;
        }

        let cancelled = results
            .iter()
            .any(|(outcome, _)| matches!(outcome, MiningOutcome::Cancelled { .. }));

        if cancelled {
            Ok(MiningOutcome::Cancelled { attempts })
        } else {
            Ok(MiningOutcome::Exhausted { attempts })
        }
    }
}
