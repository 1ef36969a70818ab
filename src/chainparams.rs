// Genesis block fixtures

use crate::core::{Block, BlockHeader, Hash256, Transaction, TxOutput};
use clap::ValueEnum;
use serde::Serialize;

/// Headline embedded in the genesis coinbase
pub const GENESIS_MESSAGE: &[u8] =
    b"The Times 03/Jan/2009 Chancellor on brink of second bailout for banks";

/// Genesis coinbase reward (50 BTC in satoshis)
pub const GENESIS_REWARD: u64 = 5_000_000_000;

/// Uncompressed public key paid by the genesis coinbase
const GENESIS_OUTPUT_KEY: [u8; 65] = [
    0x04, 0x67, 0x8a, 0xfd, 0xb0, 0xfe, 0x55, 0x48, 0x27, 0x19, 0x67, 0xf1, 0xa6, 0x71, 0x30,
    0xb7, 0x10, 0x5c, 0xd6, 0xa8, 0x28, 0xe0, 0x39, 0x09, 0xa6, 0x79, 0x62, 0xe0, 0xea, 0x1f,
    0x61, 0xde, 0xb6, 0x49, 0xf6, 0xbc, 0x3f, 0x4c, 0xef, 0x38, 0xc4, 0xf3, 0x55, 0x04, 0xe5,
    0x1e, 0xc1, 0x12, 0xde, 0x5c, 0x38, 0x4d, 0xf7, 0xba, 0x0b, 0x8d, 0x57, 0x8a, 0x4c, 0x70,
    0x2b, 0x6b, 0xf1, 0x1d, 0x5f,
];

const OP_CHECKSIG: u8 = 0xac;

/// Genesis presets the miner knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Genesis coinbase with a 2009-01-08 timestamp and regtest difficulty
    Demo,
    /// Bitcoin main network genesis
    Main,
    /// Bitcoin testnet3 genesis
    Testnet,
    /// Bitcoin regression test genesis
    Regtest,
}

/// Static header values for one genesis preset
#[derive(Debug, Clone, Copy)]
pub struct GenesisParams {
    pub name: &'static str,
    pub version: i32,
    pub timestamp: u32,
    pub bits: u32,
    /// Published winning nonce, when one exists
    pub nonce: Option<u32>,
    /// Published block hash in display order
    pub hash: Option<&'static str>,
}

const GENESIS_TABLE: [GenesisParams; 4] = [
    GenesisParams {
        name: "demo",
        version: 1,
        timestamp: 0x4966bc61,
        bits: 0x207fffff,
        nonce: None,
        hash: None,
    },
    GenesisParams {
        name: "main",
        version: 1,
        timestamp: 1231006505,
        bits: 0x1d00ffff,
        nonce: Some(2083236893),
        hash: Some("000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"),
    },
    GenesisParams {
        name: "testnet",
        version: 1,
        timestamp: 1296688602,
        bits: 0x1d00ffff,
        nonce: Some(414098458),
        hash: Some("000000000933ea01ad0ee984209779baaec3ced90fa3f408719526f8d77f4943"),
    },
    GenesisParams {
        name: "regtest",
        version: 1,
        timestamp: 1296688602,
        bits: 0x207fffff,
        nonce: Some(2),
        hash: Some("0f9188f13cb7b2c71f2a335e3a4fc328bf5beb436012afca590b1a11466e2206"),
    },
];

impl Network {
    pub fn params(self) -> &'static GenesisParams {
        match self {
            Network::Demo => &GENESIS_TABLE[0],
            Network::Main => &GENESIS_TABLE[1],
            Network::Testnet => &GENESIS_TABLE[2],
            Network::Regtest => &GENESIS_TABLE[3],
        }
    }
}

/// The coinbase transaction shared by every genesis preset
pub fn genesis_coinbase() -> Transaction {
    // Push of the difficulty-one bits, push of 4, then the 69-byte headline
    let mut script_sig = vec![0x04, 0xff, 0xff, 0x00, 0x1d, 0x01, 0x04, GENESIS_MESSAGE.len() as u8];
    script_sig.extend_from_slice(GENESIS_MESSAGE);

    let mut script_pubkey = Vec::with_capacity(GENESIS_OUTPUT_KEY.len() + 2);
    script_pubkey.push(GENESIS_OUTPUT_KEY.len() as u8);
    script_pubkey.extend_from_slice(&GENESIS_OUTPUT_KEY);
    script_pubkey.push(OP_CHECKSIG);

    Transaction::coinbase(script_sig, TxOutput::new(GENESIS_REWARD, script_pubkey))
}

impl Block {
    /// Build the unsolved genesis block (nonce 0) for a preset
    pub fn genesis(params: &GenesisParams) -> Self {
        let coinbase = genesis_coinbase();
        let merkle_root = Self::calculate_merkle_root(std::slice::from_ref(&coinbase));

        let header = BlockHeader::new(
            params.version,
            Hash256::zero(),
            merkle_root,
            params.timestamp,
            params.bits,
            0,
        );

        Self::new(header, vec![coinbase])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_merkle_root() {
        let block = Block::genesis(Network::Main.params());
        assert_eq!(
            block.header.merkle_root.to_hex(),
            "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"
        );
        assert!(block.is_genesis());
        assert!(block.transactions[0].is_coinbase());
        assert_eq!(block.transactions[0].total_output_value(), GENESIS_REWARD);
    }

    #[test]
    fn test_genesis_coinbase_size() {
        // Published size of the genesis coinbase transaction
        assert_eq!(genesis_coinbase().serialize().len(), 204);
        assert_eq!(GENESIS_MESSAGE.len(), 0x45);
    }

    #[test]
    fn test_published_headers_hash_correctly() {
        for network in [Network::Main, Network::Testnet, Network::Regtest] {
            let params = network.params();
            let mut block = Block::genesis(params);
            block.header.nonce = params.nonce.unwrap();
            assert_eq!(block.hash().to_hex(), params.hash.unwrap(), "{}", params.name);
        }
    }

    #[test]
    fn test_main_genesis_block_size() {
        let mut block = Block::genesis(Network::Main.params());
        block.header.nonce = 2083236893;
        assert_eq!(block.serialize().len(), 285);
    }

    #[test]
    fn test_table_names_match_variants() {
        for network in Network::value_variants() {
            let name = network.to_possible_value().unwrap().get_name().to_string();
            assert_eq!(network.params().name, name);
        }
    }
}
