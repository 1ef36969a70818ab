// Transaction data structures

use crate::core::{Hash256, hash256};
use super::serialize::{write_varint, write_var_bytes};

/// Outpoint index used by coinbase inputs
pub const COINBASE_INDEX: u32 = 0xffff_ffff;

/// Transaction input - references a previous transaction output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    /// Hash of the previous transaction
    pub prev_tx_hash: Hash256,
    /// Index of the output in the previous transaction
    pub prev_index: u32,
    /// Signature script (scriptSig)
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

impl TxInput {
    /// Create a coinbase input; coinbase inputs spend nothing
    pub fn coinbase(script_sig: Vec<u8>) -> Self {
        Self {
            prev_tx_hash: Hash256::zero(),
            prev_index: COINBASE_INDEX,
            script_sig,
            sequence: 0xffff_ffff,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.prev_tx_hash == Hash256::zero() && self.prev_index == COINBASE_INDEX
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.prev_tx_hash.as_bytes());
        buf.extend_from_slice(&self.prev_index.to_le_bytes());
        // Writing into a Vec cannot fail
        let _ = write_var_bytes(buf, &self.script_sig);
        buf.extend_from_slice(&self.sequence.to_le_bytes());
    }
}

/// Transaction output - specifies amount and recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    /// Amount in satoshis (1 BTC = 100,000,000 satoshis)
    pub value: u64,
    /// Public key script (scriptPubKey)
    pub script_pubkey: Vec<u8>,
}

impl TxOutput {
    pub fn new(value: u64, script_pubkey: Vec<u8>) -> Self {
        Self {
            value,
            script_pubkey,
        }
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value.to_le_bytes());
        let _ = write_var_bytes(buf, &self.script_pubkey);
    }
}

/// Transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    /// Lock time (block height or timestamp when tx becomes valid)
    pub lock_time: u32,
}

impl Transaction {
    /// Create a version 1 coinbase transaction with a single output
    pub fn coinbase(script_sig: Vec<u8>, output: TxOutput) -> Self {
        Self {
            version: 1,
            inputs: vec![TxInput::coinbase(script_sig)],
            outputs: vec![output],
            lock_time: 0,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_coinbase()
    }

    /// Transaction ID (double SHA256 of the serialized transaction)
    pub fn txid(&self) -> Hash256 {
        hash256(&self.serialize())
    }

    pub fn total_output_value(&self) -> u64 {
        self.outputs.iter().map(|out| out.value).sum()
    }

    /// Serialize in wire format
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_to(&mut buf);
        buf
    }

    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.version.to_le_bytes());

        let _ = write_varint(buf, self.inputs.len() as u64);
        for input in &self.inputs {
            input.write_to(buf);
        }

        let _ = write_varint(buf, self.outputs.len() as u64);
        for output in &self.outputs {
            output.write_to(buf);
        }

        buf.extend_from_slice(&self.lock_time.to_le_bytes());
    }
}
