//! Transaction wire decoding and proof-resolution attachments.
//!
//! A deliberately narrow transaction model: enough wire handling to decode a
//! raw transaction, recompute its ID, and re-encode it, plus the two
//! attachment points the resolver populates (a verified Merkle path on the
//! transaction, a resolved source transaction on each input). Script
//! contents are carried as opaque bytes.

use crate::chainhash::{sha256d, Hash};
use crate::error::WhatsOnChainError;
use crate::merkle_path::MerklePath;
use crate::util::{ByteReader, ByteWriter};

/// Default sequence number indicating a finalized input.
pub const DEFAULT_SEQUENCE_NUMBER: u32 = 0xFFFF_FFFF;

/// A single input in a BSV transaction.
///
/// References an output of a previous transaction by its transaction ID and
/// output index. After ancestor resolution, `source_transaction` holds the
/// fully resolved previous transaction.
#[derive(Clone, Debug)]
pub struct TransactionInput {
    /// Transaction ID of the output being spent.
    pub source_txid: Hash,
    /// Index of the output within the source transaction.
    pub source_tx_out_index: u32,
    /// Unlocking script (scriptSig) bytes; empty when unsigned.
    pub unlocking_script: Vec<u8>,
    /// Sequence number. Defaults to `0xFFFFFFFF` (finalized).
    pub sequence_number: u32,
    /// The resolved source transaction, attached during ancestor resolution.
    pub source_transaction: Option<Box<Transaction>>,
}

impl TransactionInput {
    /// Create an input spending the given output.
    pub fn new(source_txid: Hash, source_tx_out_index: u32) -> Self {
        TransactionInput {
            source_txid,
            source_tx_out_index,
            unlocking_script: Vec::new(),
            sequence_number: DEFAULT_SEQUENCE_NUMBER,
            source_transaction: None,
        }
    }

    fn read_from(reader: &mut ByteReader) -> Result<Self, WhatsOnChainError> {
        let txid_bytes = reader.read_bytes(32).map_err(|e| {
            WhatsOnChainError::InvalidTransaction(format!("reading source txid: {}", e))
        })?;
        let source_txid = Hash::from_bytes(txid_bytes)
            .map_err(|e| WhatsOnChainError::InvalidTransaction(format!("invalid txid: {}", e)))?;

        let source_tx_out_index = reader.read_u32_le().map_err(|e| {
            WhatsOnChainError::InvalidTransaction(format!("reading output index: {}", e))
        })?;

        let script_len = reader.read_varint().map_err(|e| {
            WhatsOnChainError::InvalidTransaction(format!("reading script length: {}", e))
        })?;
        let unlocking_script = reader
            .read_bytes(script_len as usize)
            .map_err(|e| {
                WhatsOnChainError::InvalidTransaction(format!("reading unlocking script: {}", e))
            })?
            .to_vec();

        let sequence_number = reader.read_u32_le().map_err(|e| {
            WhatsOnChainError::InvalidTransaction(format!("reading sequence number: {}", e))
        })?;

        Ok(TransactionInput {
            source_txid,
            source_tx_out_index,
            unlocking_script,
            sequence_number,
            source_transaction: None,
        })
    }

    fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_bytes(self.source_txid.as_bytes());
        writer.write_u32_le(self.source_tx_out_index);
        writer.write_varint(self.unlocking_script.len() as u64);
        writer.write_bytes(&self.unlocking_script);
        writer.write_u32_le(self.sequence_number);
    }
}

/// An output in a BSV transaction.
#[derive(Clone, Debug)]
pub struct TransactionOutput {
    /// Value in satoshis.
    pub satoshis: u64,
    /// Locking script bytes.
    pub locking_script: Vec<u8>,
}

impl TransactionOutput {
    fn read_from(reader: &mut ByteReader) -> Result<Self, WhatsOnChainError> {
        let satoshis = reader.read_u64_le().map_err(|e| {
            WhatsOnChainError::InvalidTransaction(format!("reading satoshis: {}", e))
        })?;
        let script_len = reader.read_varint().map_err(|e| {
            WhatsOnChainError::InvalidTransaction(format!("reading script length: {}", e))
        })?;
        let locking_script = reader
            .read_bytes(script_len as usize)
            .map_err(|e| {
                WhatsOnChainError::InvalidTransaction(format!("reading locking script: {}", e))
            })?
            .to_vec();
        Ok(TransactionOutput {
            satoshis,
            locking_script,
        })
    }

    fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_u64_le(self.satoshis);
        writer.write_varint(self.locking_script.len() as u64);
        writer.write_bytes(&self.locking_script);
    }
}

/// A BSV transaction with optional proof-resolution state attached.
///
/// `merkle_path` is populated once the transaction is proven to be mined;
/// it is not part of the wire encoding and does not affect the txid.
#[derive(Clone, Debug)]
pub struct Transaction {
    /// Transaction format version.
    pub version: u32,
    /// Ordered list of inputs.
    pub inputs: Vec<TransactionInput>,
    /// Ordered list of outputs.
    pub outputs: Vec<TransactionOutput>,
    /// Lock time.
    pub lock_time: u32,
    /// Verified Merkle path anchoring this transaction to a block, if any.
    pub merkle_path: Option<MerklePath>,
}

impl Transaction {
    /// Create a new empty transaction with version 1 and lock time 0.
    pub fn new() -> Self {
        Transaction {
            version: 1,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
            merkle_path: None,
        }
    }

    /// Parse a transaction from a hex-encoded string.
    pub fn from_hex(hex_str: &str) -> Result<Self, WhatsOnChainError> {
        let bytes = hex::decode(hex_str).map_err(|e| {
            WhatsOnChainError::InvalidTransaction(format!("invalid hex: {}", e))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Parse a transaction from raw bytes.
    ///
    /// The slice must contain exactly one complete transaction with no
    /// trailing data.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WhatsOnChainError> {
        let mut reader = ByteReader::new(bytes);

        let version = reader.read_u32_le().map_err(|e| {
            WhatsOnChainError::InvalidTransaction(format!("reading version: {}", e))
        })?;

        let input_count = reader.read_varint().map_err(|e| {
            WhatsOnChainError::InvalidTransaction(format!("reading input count: {}", e))
        })?;
        // Counts come off the wire unvalidated; never pre-allocate from them.
        // A lying count runs out of bytes on the first short read instead.
        let mut inputs = Vec::new();
        for _ in 0..input_count {
            inputs.push(TransactionInput::read_from(&mut reader)?);
        }

        let output_count = reader.read_varint().map_err(|e| {
            WhatsOnChainError::InvalidTransaction(format!("reading output count: {}", e))
        })?;
        let mut outputs = Vec::new();
        for _ in 0..output_count {
            outputs.push(TransactionOutput::read_from(&mut reader)?);
        }

        let lock_time = reader.read_u32_le().map_err(|e| {
            WhatsOnChainError::InvalidTransaction(format!("reading lock time: {}", e))
        })?;

        if reader.remaining() != 0 {
            return Err(WhatsOnChainError::InvalidTransaction(format!(
                "trailing {} bytes after transaction",
                reader.remaining()
            )));
        }

        Ok(Transaction {
            version,
            inputs,
            outputs,
            lock_time,
            merkle_path: None,
        })
    }

    /// Serialize to raw wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        writer.write_u32_le(self.version);
        writer.write_varint(self.inputs.len() as u64);
        for input in &self.inputs {
            input.write_to(&mut writer);
        }
        writer.write_varint(self.outputs.len() as u64);
        for output in &self.outputs {
            output.write_to(&mut writer);
        }
        writer.write_u32_le(self.lock_time);
        writer.into_bytes()
    }

    /// Serialize to a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Compute the transaction ID (double SHA-256 of the wire encoding).
    pub fn txid(&self) -> Hash {
        Hash::new(sha256d(&self.to_bytes()))
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}
