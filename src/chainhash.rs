//! Chain hash type for transaction and block identification.
//!
//! A `Hash` is a 32-byte value stored in internal (little-endian) order and
//! displayed as byte-reversed hex, matching Bitcoin's convention for
//! transaction IDs, block hashes, and Merkle roots.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::WhatsOnChainError;

/// Size of a Hash in bytes.
pub const HASH_SIZE: usize = 32;

/// A 32-byte hash used for transaction IDs, block hashes, and Merkle trees.
///
/// When displayed as a string, the bytes are reversed to match Bitcoin's
/// standard representation (little-endian internal, big-endian display).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// Create a Hash from a raw 32-byte array in internal byte order.
    pub fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    /// Create a Hash from a byte slice in internal byte order.
    ///
    /// The slice must be exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WhatsOnChainError> {
        if bytes.len() != HASH_SIZE {
            return Err(WhatsOnChainError::InvalidHash(format!(
                "invalid hash length of {}, want {}",
                bytes.len(),
                HASH_SIZE
            )));
        }
        let mut arr = [0u8; HASH_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Hash(arr))
    }

    /// Parse a Hash from a 64-character byte-reversed hex string
    /// (display order).
    pub fn from_hex(hex_str: &str) -> Result<Self, WhatsOnChainError> {
        if hex_str.len() != MAX_HASH_STRING_SIZE {
            return Err(WhatsOnChainError::InvalidHash(format!(
                "want {} hex characters, got {}",
                MAX_HASH_STRING_SIZE,
                hex_str.len()
            )));
        }
        let decoded = hex::decode(hex_str)?;
        let mut arr = [0u8; HASH_SIZE];
        for (dst, src) in arr.iter_mut().zip(decoded.iter().rev()) {
            *dst = *src;
        }
        Ok(Hash(arr))
    }

    /// Access the internal byte array.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }
}

/// Maximum hex string length for a Hash (64 hex characters).
pub const MAX_HASH_STRING_SIZE: usize = HASH_SIZE * 2;

/// Display the hash as byte-reversed hex (Bitcoin convention).
impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        write!(f, "{}", hex::encode(reversed))
    }
}

/// Parse a byte-reversed hex string into a Hash.
impl FromStr for Hash {
    type Err = WhatsOnChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

/// Serialize as a hex string in JSON.
impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Deserialize from a hex string in JSON.
impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Compute SHA-256 of the input data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute double SHA-256 (SHA-256d) of the input data.
///
/// This is the hash used for transaction IDs, block hashes, and Merkle
/// node combination.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}
