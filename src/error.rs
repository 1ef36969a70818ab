// Error types shared across the crate

use thiserror::Error;

/// Result alias used throughout the miner
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing or running a search.
///
/// Running out of nonces or being cancelled are not errors; those are
/// reported through [`crate::consensus::MiningOutcome`].
#[derive(Error, Debug)]
pub enum Error {
    /// Compact bits with the sign bit set and a non-zero mantissa
    #[error("compact target {0:#010x} encodes a negative value")]
    NegativeTarget(u32),

    /// Compact bits whose value does not fit in 256 bits
    #[error("compact target {0:#010x} overflows 256 bits")]
    TargetOverflow(u32),

    /// Hash input with a length other than 32 bytes
    #[error("invalid hash length: expected 32, got {0}")]
    InvalidHashLength(usize),

    /// Malformed hex string
    #[error("invalid hex string: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Nonce range whose start lies above its end
    #[error("invalid nonce range: start {start} is greater than end {end}")]
    InvalidNonceRange { start: u32, end: u32 },

    /// Worker thread pool could not be created
    #[error("failed to start mining threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// JSON encoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
