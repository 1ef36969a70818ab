// Genesis block miner
// Builds a fixed genesis block and searches for a nonce that satisfies its
// proof-of-work target.

pub mod chainparams;
pub mod cli;
pub mod config;
pub mod consensus;
pub mod core;
pub mod error;

// Re-exports for convenience
pub use chainparams::{GenesisParams, Network};
pub use cli::{Cli, CliHandler};
pub use config::{MinerConfig, OutputFormat};
pub use consensus::{
    CancelToken, Miner, MiningOutcome, NonceRange, ParallelMiner, Progress, ProgressObserver,
    Solution, Target,
};
pub use crate::core::{Block, BlockHeader, Hash256, Transaction, TxInput, TxOutput};
pub use error::{Error, Result};
