// Proof of Work search

use crate::consensus::Target;
use crate::core::{BlockHeader, Hash256};
use crate::error::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How often (in attempts) the search polls its cancel token
pub const CANCEL_CHECK_INTERVAL: u64 = 4096;

/// Default number of attempts between progress reports
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 40_000;

/// Inclusive range of nonces to search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceRange {
    pub start: u32,
    pub end: u32,
}

impl NonceRange {
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidNonceRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The whole 32-bit nonce space, 0 through u32::MAX
    pub fn full() -> Self {
        Self { start: 0, end: u32::MAX }
    }

    /// Number of nonces in the range
    pub fn len(&self) -> u64 {
        u64::from(self.end - self.start) + 1
    }

    /// Split into at most `parts` contiguous, ascending, non-empty ranges
    pub fn split(&self, parts: usize) -> Vec<NonceRange> {
        let parts = (parts.max(1) as u64).min(self.len());
        let chunk = self.len() / parts;
        let remainder = self.len() % parts;

        let mut ranges = Vec::with_capacity(parts as usize);
        let mut start = u64::from(self.start);
        for i in 0..parts {
            let size = chunk + u64::from(i < remainder);
            let end = start + size - 1;
            ranges.push(NonceRange {
                start: start as u32,
                end: end as u32,
            });
            start = end + 1;
        }
        ranges
    }
}

impl Default for NonceRange {
    fn default() -> Self {
        Self::full()
    }
}

/// Shared flag used to abort a running search.
///
/// Clones observe the same flag. A child token is cancelled when either it
/// or any of its ancestors is.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    parent: Option<Box<CancelToken>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
            || self.parent.as_ref().is_some_and(|parent| parent.is_cancelled())
    }

    /// New token that also reports cancellation of `self`
    pub fn child(&self) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Box::new(self.clone())),
        }
    }
}

/// Snapshot handed to a [`ProgressObserver`]
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    /// Nonces hashed so far
    pub attempts: u64,
    /// Most recently tried nonce
    pub nonce: u32,
    pub elapsed: Duration,
}

impl Progress {
    /// Hashes per second; each attempt is one double SHA256
    pub fn hash_rate(&self) -> f64 {
        rate(self.attempts, self.elapsed)
    }
}

/// Receives periodic progress reports from a running search
pub trait ProgressObserver {
    fn on_progress(&mut self, progress: &Progress);
}

impl<F: FnMut(&Progress)> ProgressObserver for F {
    fn on_progress(&mut self, progress: &Progress) {
        self(progress)
    }
}

/// Observer that ignores progress
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _progress: &Progress) {}
}

/// Observer that writes progress lines to the log
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_progress(&mut self, progress: &Progress) {
        log::info!(
            "{} hashes performed (nonce {}, {:.1} KH/s)",
            progress.attempts,
            progress.nonce,
            progress.hash_rate() / 1000.0
        );
    }
}

/// A winning nonce and the hash it produced
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub nonce: u32,
    pub hash: Hash256,
    /// Number of attempts, including the winning one
    pub attempts: u64,
    pub duration: Duration,
}

impl Solution {
    /// Calculate hash rate (hashes per second)
    pub fn hash_rate(&self) -> f64 {
        rate(self.attempts, self.duration)
    }
}

/// How a search ended
#[derive(Debug, Clone, PartialEq)]
pub enum MiningOutcome {
    /// The header now carries a nonce that meets the target
    Found(Solution),
    /// Every nonce in the range was tried without success
    Exhausted { attempts: u64 },
    /// The cancel token fired before the search finished
    Cancelled { attempts: u64 },
}

impl MiningOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, MiningOutcome::Found(_))
    }

    pub fn solution(&self) -> Option<&Solution> {
        match self {
            MiningOutcome::Found(solution) => Some(solution),
            _ => None,
        }
    }

    pub fn attempts(&self) -> u64 {
        match self {
            MiningOutcome::Found(solution) => solution.attempts,
            MiningOutcome::Exhausted { attempts } | MiningOutcome::Cancelled { attempts } => {
                *attempts
            }
        }
    }
}

/// Single-threaded proof-of-work miner.
///
/// The miner borrows a header exclusively for the duration of a search and is
/// the only writer of its nonce. On every return the header holds the last
/// nonce that was hashed.
#[derive(Debug, Clone)]
pub struct Miner {
    range: NonceRange,
    progress_interval: u64,
    cancel: Option<CancelToken>,
}

impl Default for Miner {
    fn default() -> Self {
        Self::new()
    }
}

impl Miner {
    /// Miner over the full nonce space
    pub fn new() -> Self {
        Self {
            range: NonceRange::full(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            cancel: None,
        }
    }

    pub fn with_range(mut self, range: NonceRange) -> Self {
        self.range = range;
        self
    }

    /// Attempts between progress reports; 0 disables reporting
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn range(&self) -> NonceRange {
        self.range
    }

    /// Mine a header against the target encoded in its own bits field
    pub fn mine(&self, header: &mut BlockHeader) -> Result<MiningOutcome> {
        self.mine_with(header, &mut NoProgress)
    }

    /// Like [`Miner::mine`], reporting progress to `observer`
    pub fn mine_with<O>(&self, header: &mut BlockHeader, observer: &mut O) -> Result<MiningOutcome>
    where
        O: ProgressObserver + ?Sized,
    {
        let target = Target::from_compact(header.bits)?;
        Ok(self.mine_to_target(header, &target, observer))
    }

    /// Search the configured range for a nonce whose header hash meets `target`
    pub fn mine_to_target<O>(
        &self,
        header: &mut BlockHeader,
        target: &Target,
        observer: &mut O,
    ) -> MiningOutcome
    where
        O: ProgressObserver + ?Sized,
    {
        let start_time = Instant::now();
        let mut attempts = 0u64;

        // Inclusive iteration so the range end itself is always tried
        for nonce in self.range.start..=self.range.end {
            if attempts % CANCEL_CHECK_INTERVAL == 0 && self.is_cancelled() {
                log::debug!("Search cancelled after {} attempts", attempts);
                return MiningOutcome::Cancelled { attempts };
            }

            header.nonce = nonce;
            let hash = header.hash();
            attempts += 1;

            if target.is_met_by(&hash) {
                return MiningOutcome::Found(Solution {
                    nonce,
                    hash,
                    attempts,
                    duration: start_time.elapsed(),
                });
            }

            if self.progress_interval != 0 && attempts % self.progress_interval == 0 {
                observer.on_progress(&Progress {
                    attempts,
                    nonce,
                    elapsed: start_time.elapsed(),
                });
            }
        }

        MiningOutcome::Exhausted { attempts }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

/// Check that a header's hash meets the target in its bits field
pub fn check_proof_of_work(header: &BlockHeader) -> Result<bool> {
    let target = Target::from_compact(header.bits)?;
    Ok(target.is_met_by(&header.hash()))
}

fn rate(attempts: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { attempts as f64 / secs } else { 0.0 }
}
