// Run configuration assembled from command-line flags

use crate::chainparams::{GenesisParams, Network};
use crate::consensus::{NonceRange, Target};
use crate::core::Block;
use crate::error::Result;
use std::time::Duration;

/// How the mined block is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Everything needed for one mining run
#[derive(Debug, Clone)]
pub struct MinerConfig {
    pub network: Network,
    /// Replaces the preset timestamp
    pub timestamp: Option<u32>,
    /// Replaces the preset compact bits
    pub bits: Option<u32>,
    pub range: NonceRange,
    /// Worker threads; 0 uses every logical CPU
    pub threads: usize,
    /// Attempts between progress lines; 0 disables them
    pub progress_interval: u64,
    /// Give up after this long
    pub timeout: Option<Duration>,
    pub output: OutputFormat,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            network: Network::Demo,
            timestamp: None,
            bits: None,
            range: NonceRange::full(),
            threads: 1,
            progress_interval: crate::consensus::pow::DEFAULT_PROGRESS_INTERVAL,
            timeout: None,
            output: OutputFormat::Text,
        }
    }
}

impl MinerConfig {
    /// Preset values with overrides applied.
    ///
    /// Overriding a header field drops the published nonce and hash, since
    /// they no longer describe this header.
    pub fn genesis_params(&self) -> GenesisParams {
        let mut params = *self.network.params();
        if self.timestamp.is_some() || self.bits.is_some() {
            params.nonce = None;
            params.hash = None;
        }
        if let Some(timestamp) = self.timestamp {
            params.timestamp = timestamp;
        }
        if let Some(bits) = self.bits {
            params.bits = bits;
        }
        params
    }

    /// Build the unsolved genesis block, rejecting undecodable bits up front
    pub fn genesis_block(&self) -> Result<Block> {
        let params = self.genesis_params();
        Target::from_compact(params.bits)?;
        Ok(Block::genesis(&params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_defaults_mine_the_demo_block() {
        let config = MinerConfig::default();
        let block = config.genesis_block().unwrap();

        assert_eq!(block.header.timestamp, 0x4966bc61);
        assert_eq!(block.header.bits, 0x207fffff);
        assert_eq!(block.header.nonce, 0);
        assert_eq!(config.range, NonceRange::full());
    }

    #[test]
    fn test_overrides_clear_published_values() {
        let config = MinerConfig {
            network: Network::Main,
            timestamp: Some(1_700_000_000),
            ..MinerConfig::default()
        };
        let params = config.genesis_params();

        assert_eq!(params.timestamp, 1_700_000_000);
        assert_eq!(params.bits, 0x1d00ffff);
        assert!(params.nonce.is_none());
        assert!(params.hash.is_none());

        let untouched = MinerConfig {
            network: Network::Main,
            ..MinerConfig::default()
        };
        assert_eq!(untouched.genesis_params().nonce, Some(2083236893));
    }

    #[test]
    fn test_bad_bits_rejected() {
        let config = MinerConfig {
            bits: Some(0x23000001),
            ..MinerConfig::default()
        };
        assert!(matches!(config.genesis_block(), Err(Error::TargetOverflow(_))));
    }
}
