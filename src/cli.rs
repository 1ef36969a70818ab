// CLI commands

use clap::Parser;
use serde::Serialize;
use std::thread;
use std::time::{Duration, Instant};

use crate::chainparams::{GenesisParams, Network};
use crate::config::{MinerConfig, OutputFormat};
use crate::consensus::{
    CancelToken, LogProgress, Miner, MiningOutcome, NonceRange, ParallelMiner, Progress, Target,
};
use crate::core::{Block, BlockHeader, Hash256};
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(name = "genesis-miner")]
#[command(about = "Mine a genesis block by brute-forcing its header nonce", long_about = None)]
pub struct Cli {
    /// Genesis preset to mine
    #[arg(short, long, value_enum, default_value = "demo")]
    pub network: Network,

    /// Override the header timestamp (Unix seconds)
    #[arg(long)]
    pub timestamp: Option<u32>,

    /// Override the compact difficulty bits (hex, e.g. 0x1d00ffff)
    #[arg(long, value_parser = parse_bits)]
    pub bits: Option<u32>,

    /// First nonce to try
    #[arg(long, default_value_t = 0)]
    pub start_nonce: u32,

    /// Last nonce to try (inclusive)
    #[arg(long, default_value_t = u32::MAX)]
    pub end_nonce: u32,

    /// Worker threads (0 = all cores)
    #[arg(short, long, default_value_t = 1)]
    pub threads: usize,

    /// Attempts between progress lines (0 = silent)
    #[arg(long, default_value_t = crate::consensus::pow::DEFAULT_PROGRESS_INTERVAL)]
    pub progress_interval: u64,

    /// Stop searching after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Validate flags into a run configuration
    pub fn to_config(&self) -> Result<MinerConfig> {
        Ok(MinerConfig {
            network: self.network,
            timestamp: self.timestamp,
            bits: self.bits,
            range: NonceRange::new(self.start_nonce, self.end_nonce)?,
            threads: self.threads,
            progress_interval: self.progress_interval,
            timeout: self.timeout.map(Duration::from_secs),
            output: if self.json { OutputFormat::Json } else { OutputFormat::Text },
        })
    }
}

fn parse_bits(value: &str) -> std::result::Result<u32, String> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid compact bits '{}': {}", value, e))
}

/// Printable summary of a mining run
#[derive(Debug, Serialize)]
pub struct MiningReport {
    pub network: Network,
    pub status: &'static str,
    pub attempts: u64,
    pub elapsed_secs: f64,
    pub hash_rate: f64,
    pub target: String,
    /// Whether the mined hash equals the preset's published hash
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches_published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockReport>,
}

#[derive(Debug, Serialize)]
pub struct BlockReport {
    pub hash: Hash256,
    pub header: BlockHeader,
    pub transactions: Vec<Hash256>,
    pub header_hex: String,
    pub raw_hex: String,
}

impl BlockReport {
    pub fn new(block: &Block) -> Self {
        Self {
            hash: block.hash(),
            header: block.header.clone(),
            transactions: block.transactions.iter().map(|tx| tx.txid()).collect(),
            header_hex: hex::encode(block.header.serialize()),
            raw_hex: hex::encode(block.serialize()),
        }
    }
}

/// CLI handler
pub struct CliHandler {
    config: MinerConfig,
}

impl CliHandler {
    pub fn new(config: MinerConfig) -> Self {
        Self { config }
    }

    /// Mine the configured block and print it. Returns whether a nonce was found.
    pub fn handle(&self) -> Result<bool> {
        let params = self.config.genesis_params();
        let mut block = self.config.genesis_block()?;
        let target = Target::from_compact(block.header.bits)?;

        log::info!(
            "Mining {} genesis block (bits {:#010x}, {} leading zero bits)",
            params.name,
            block.header.bits,
            target.leading_zeros()
        );
        log::debug!("Target: {}", target);

        let cancel = CancelToken::new();
        if let Some(timeout) = self.config.timeout {
            let timer = cancel.clone();
            thread::spawn(move || {
                thread::sleep(timeout);
                timer.cancel();
            });
        }

        let start_time = Instant::now();
        let outcome = self.mine(&mut block.header, cancel)?;
        let elapsed = start_time.elapsed();

        match &outcome {
            MiningOutcome::Found(solution) => {
                log::info!("Valid nonce found: {}", solution.nonce);
                log::info!("Block header hash: {}", solution.hash);
            }
            MiningOutcome::Exhausted { attempts } => {
                log::warn!("Nonce range exhausted after {} attempts", attempts);
            }
            MiningOutcome::Cancelled { attempts } => {
                log::warn!("Search stopped after {} attempts", attempts);
            }
        }

        let report = build_report(self.config.network, &params, &block, &target, &outcome, elapsed);
        match self.config.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Text => print_report(&report, &block),
        }

        Ok(outcome.is_found())
    }

    fn mine(&self, header: &mut BlockHeader, cancel: CancelToken) -> Result<MiningOutcome> {
        let config = &self.config;
        if config.threads == 1 {
            return Miner::new()
                .with_range(config.range)
                .with_progress_interval(config.progress_interval)
                .with_cancel_token(cancel)
                .mine_with(header, &mut LogProgress);
        }

        let miner = ParallelMiner::new(config.threads)
            .with_range(config.range)
            .with_progress_interval(config.progress_interval)
            .with_cancel_token(cancel);
        log::info!("Using {} worker threads", miner.workers());

        miner.mine_with(header, &|progress: &Progress| {
            log::info!(
                "{} hashes performed ({:.1} KH/s)",
                progress.attempts,
                progress.hash_rate() / 1000.0
            );
        })
    }
}

fn build_report(
    network: Network,
    params: &GenesisParams,
    block: &Block,
    target: &Target,
    outcome: &MiningOutcome,
    elapsed: Duration,
) -> MiningReport {
    let secs = elapsed.as_secs_f64();
    let (status, block_report, matches_published) = match outcome {
        MiningOutcome::Found(solution) => {
            let matches = params.hash.map(|published| published == solution.hash.to_hex());
            ("found", Some(BlockReport::new(block)), matches)
        }
        MiningOutcome::Exhausted { .. } => ("exhausted", None, None),
        MiningOutcome::Cancelled { .. } => ("cancelled", None, None),
    };

    MiningReport {
        network,
        status,
        attempts: outcome.attempts(),
        elapsed_secs: secs,
        hash_rate: if secs > 0.0 { outcome.attempts() as f64 / secs } else { 0.0 },
        target: target.to_hex(),
        matches_published,
        block: block_report,
    }
}

/// Print block information
fn print_report(report: &MiningReport, block: &Block) {
    println!("Status: {}", report.status);
    println!("  Attempts: {}", report.attempts);
    println!("  Duration: {:.3}s", report.elapsed_secs);
    println!("  Hash rate: {:.2} H/s", report.hash_rate);

    if report.block.is_none() {
        println!("No valid nonce found for header with nonce {}", block.header.nonce);
        return;
    }

    println!("Genesis block:");
    println!("  Hash: {}", block.hash());
    println!("  Version: {}", block.header.version);
    println!("  Previous: {}", block.header.prev_block_hash);
    println!("  Merkle root: {}", block.header.merkle_root);
    println!("  Timestamp: {}", block.header.timestamp);
    println!("  Bits: {:#010x}", block.header.bits);
    println!("  Nonce: {}", block.header.nonce);
    println!("  Transactions: {}", block.transactions.len());

    for (i, tx) in block.transactions.iter().enumerate() {
        println!("    [{}] {}", i, tx.txid());
    }

    println!("  Header: {}", hex::encode(block.header.serialize()));
    println!("  Raw block: {}", hex::encode(block.serialize()));

    match report.matches_published {
        Some(true) => println!("✓ Hash matches the published genesis block"),
        Some(false) => println!("✗ Hash differs from the published genesis block"),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bits() {
        assert_eq!(parse_bits("0x1d00ffff"), Ok(0x1d00ffff));
        assert_eq!(parse_bits("207fffff"), Ok(0x207fffff));
        assert!(parse_bits("0xzz").is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["genesis-miner"]).unwrap();
        let config = cli.to_config().unwrap();

        assert_eq!(config.network, Network::Demo);
        assert_eq!(config.range, NonceRange::full());
        assert_eq!(config.threads, 1);
        assert_eq!(config.output, OutputFormat::Text);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "genesis-miner",
            "--network",
            "regtest",
            "--bits",
            "0x1d00ffff",
            "--start-nonce",
            "10",
            "--end-nonce",
            "20",
            "--threads",
            "0",
            "--timeout",
            "5",
            "--json",
        ])
        .unwrap();
        let config = cli.to_config().unwrap();

        assert_eq!(config.network, Network::Regtest);
        assert_eq!(config.bits, Some(0x1d00ffff));
        assert_eq!(config.range, NonceRange::new(10, 20).unwrap());
        assert_eq!(config.threads, 0);
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.output, OutputFormat::Json);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let cli = Cli::try_parse_from(["genesis-miner", "--start-nonce", "9", "--end-nonce", "3"])
            .unwrap();
        assert!(cli.to_config().is_err());
    }

    #[test]
    fn test_regtest_run_reports_published_hash() {
        let config = MinerConfig {
            network: Network::Regtest,
            progress_interval: 0,
            ..MinerConfig::default()
        };
        let params = config.genesis_params();
        let mut block = config.genesis_block().unwrap();
        let target = Target::from_compact(block.header.bits).unwrap();

        let outcome = Miner::new().mine(&mut block.header).unwrap();
        let report = build_report(
            Network::Regtest,
            &params,
            &block,
            &target,
            &outcome,
            Duration::from_millis(1),
        );

        assert_eq!(report.status, "found");
        assert_eq!(report.network, Network::Regtest);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["block"]["hash"], serde_json::json!(block.hash().to_hex()));
        assert_eq!(json["block"]["header"]["bits"], serde_json::json!(0x207fffff));
        assert_eq!(json["network"], serde_json::json!("regtest"));
    }

    #[test]
    fn test_handler_reports_exhaustion() {
        let config = MinerConfig {
            network: Network::Main,
            range: NonceRange::new(0, 99).unwrap(),
            progress_interval: 0,
            ..MinerConfig::default()
        };
        assert!(!CliHandler::new(config).handle().unwrap());
    }
}
