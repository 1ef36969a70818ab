// Block data structures

use crate::core::{Hash256, hash256, Transaction};
use super::serialize::write_varint;
use serde::Serialize;

/// Size of a serialized block header in bytes
pub const HEADER_SIZE: usize = 80;

/// Block header - 80 bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockHeader {
    /// Block version
    pub version: i32,
    /// Hash of the previous block
    pub prev_block_hash: Hash256,
    /// Merkle root of all transactions in the block
    pub merkle_root: Hash256,
    /// Block timestamp (Unix epoch seconds)
    pub timestamp: u32,
    /// Difficulty target (compact format)
    pub bits: u32,
    /// Nonce for proof-of-work
    pub nonce: u32,
}

impl BlockHeader {
    pub fn new(
        version: i32,
        prev_block_hash: Hash256,
        merkle_root: Hash256,
        timestamp: u32,
        bits: u32,
        nonce: u32,
    ) -> Self {
        Self {
            version,
            prev_block_hash,
            merkle_root,
            timestamp,
            bits,
            nonce,
        }
    }

    /// Double SHA256 of the serialized header
    pub fn hash(&self) -> Hash256 {
        hash256(&self.serialize())
    }

    /// Serialize the header into its fixed 80-byte form.
    ///
    /// Integers are little-endian, in the order version, previous hash,
    /// merkle root, timestamp, bits, nonce.
    pub fn serialize(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.version.to_le_bytes());
        buf[4..36].copy_from_slice(self.prev_block_hash.as_bytes());
        buf[36..68].copy_from_slice(self.merkle_root.as_bytes());
        buf[68..72].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[72..76].copy_from_slice(&self.bits.to_le_bytes());
        buf[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        buf
    }
}

/// Block - contains header and transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
        }
    }

    /// Calculate Merkle root from transactions
    pub fn calculate_merkle_root(transactions: &[Transaction]) -> Hash256 {
        if transactions.is_empty() {
            return Hash256::zero();
        }

        let mut hashes: Vec<Hash256> = transactions.iter().map(|tx| tx.txid()).collect();

        while hashes.len() > 1 {
            hashes = hashes
                .chunks(2)
                .map(|pair| {
                    // Odd levels pair the last hash with itself
                    let left = pair[0];
                    let right = pair.get(1).copied().unwrap_or(left);

                    let mut combined = [0u8; 64];
                    combined[..32].copy_from_slice(left.as_bytes());
                    combined[32..].copy_from_slice(right.as_bytes());
                    hash256(&combined)
                })
                .collect();
        }

        hashes[0]
    }

    pub fn hash(&self) -> Hash256 {
        self.header.hash()
    }

    pub fn is_genesis(&self) -> bool {
        self.header.prev_block_hash == Hash256::zero()
    }

    /// Serialize the full block (header, tx count, transactions)
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + 256);
        buf.extend_from_slice(&self.header.serialize());
        let _ = write_varint(&mut buf, self.transactions.len() as u64);
        for tx in &self.transactions {
            tx.write_to(&mut buf);
        }
        buf
    }
}
