// Difficulty targets and proof-of-work search

pub mod parallel;
pub mod pow;
pub mod target;

pub use parallel::ParallelMiner;
pub use pow::{
    check_proof_of_work, CancelToken, LogProgress, Miner, MiningOutcome, NoProgress, NonceRange,
    Progress, ProgressObserver, Solution,
};
pub use target::Target;
