//! Merkle path (BUMP) types, parent hashing, and BRC-74 serialization.

use serde::{Deserialize, Serialize};

use crate::chainhash::{sha256d, Hash};
use crate::error::WhatsOnChainError;
use crate::util::{ByteReader, ByteWriter};

/// Deepest Merkle tree this crate accepts. A block of 2^64 transactions
/// would be needed to exceed it, and offsets are u64 anyway.
pub const MAX_TREE_HEIGHT: usize = 64;

/// Compute the Merkle tree parent of two child hashes.
///
/// The children are in internal (little-endian) byte order; the parent is
/// the double SHA-256 of their concatenation.
pub fn merkle_tree_parent(left: &Hash, right: &Hash) -> Hash {
    let mut concatenated = [0u8; 64];
    concatenated[..32].copy_from_slice(left.as_bytes());
    concatenated[32..].copy_from_slice(right.as_bytes());
    Hash::new(sha256d(&concatenated))
}

/// A single element in a Merkle path level.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathElement {
    /// Position offset within this tree level.
    pub offset: u64,
    /// Hash value at this position (absent when `duplicate` is set).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<Hash>,
    /// When `Some(true)`, this element is the subject transaction ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txid: Option<bool>,
    /// When `Some(true)`, the sibling is a duplicate of its pair (odd node
    /// count at this level); no hash is carried.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<bool>,
}

/// A BUMP Merkle path anchoring a transaction to a block.
///
/// Level 0 lists the subject leaf and its direct sibling; every level above
/// carries the single sibling needed to keep climbing toward the root.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerklePath {
    /// Height of the block the path is anchored to.
    pub block_height: u32,
    /// Path levels from leaf (index 0) to root.
    pub path: Vec<Vec<PathElement>>,
}

impl MerklePath {
    /// Create a new MerklePath.
    pub fn new(block_height: u32, path: Vec<Vec<PathElement>>) -> Self {
        MerklePath { block_height, path }
    }

    /// Parse a MerklePath from a hex string (BRC-74 binary format).
    pub fn from_hex(hex_data: &str) -> Result<Self, WhatsOnChainError> {
        Self::from_bytes(&hex::decode(hex_data)?)
    }

    /// Parse a MerklePath from BRC-74 binary data.
    pub fn from_bytes(data: &[u8]) -> Result<Self, WhatsOnChainError> {
        if data.len() < 37 {
            return Err(WhatsOnChainError::InvalidProof(
                "BUMP bytes do not contain enough data to be valid".to_string(),
            ));
        }
        let mut reader = ByteReader::new(data);

        let block_height = reader
            .read_varint()
            .map_err(|e| WhatsOnChainError::InvalidProof(format!("reading block height: {}", e)))?
            as u32;
        let tree_height = reader
            .read_u8()
            .map_err(|e| WhatsOnChainError::InvalidProof(format!("reading tree height: {}", e)))?;
        if tree_height as usize > MAX_TREE_HEIGHT {
            return Err(WhatsOnChainError::InvalidProof(format!(
                "tree height {} exceeds the maximum of {}",
                tree_height, MAX_TREE_HEIGHT
            )));
        }

        let mut path = Vec::with_capacity(tree_height as usize);
        for _ in 0..tree_height {
            let n_leaves = reader.read_varint().map_err(|e| {
                WhatsOnChainError::InvalidProof(format!("reading leaf count: {}", e))
            })?;

            // The leaf count is untrusted wire data; a lying count fails on
            // the first short read rather than pre-allocating.
            let mut level = Vec::new();
            for _ in 0..n_leaves {
                let offset = reader.read_varint().map_err(|e| {
                    WhatsOnChainError::InvalidProof(format!("reading offset: {}", e))
                })?;
                let flags = reader.read_u8().map_err(|e| {
                    WhatsOnChainError::InvalidProof(format!("reading flags: {}", e))
                })?;

                let duplicate = (flags & 1) != 0;
                let is_txid = (flags & 2) != 0;

                let hash = if duplicate {
                    None
                } else {
                    let bytes = reader.read_bytes(32).map_err(|e| {
                        WhatsOnChainError::InvalidProof(format!("reading hash: {}", e))
                    })?;
                    Some(Hash::from_bytes(bytes).map_err(|e| {
                        WhatsOnChainError::InvalidProof(format!("invalid hash: {}", e))
                    })?)
                };

                level.push(PathElement {
                    offset,
                    hash,
                    txid: is_txid.then_some(true),
                    duplicate: duplicate.then_some(true),
                });
            }

            level.sort_by_key(|e| e.offset);
            path.push(level);
        }

        Ok(MerklePath { block_height, path })
    }

    /// Serialize to BRC-74 binary format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        writer.write_varint(self.block_height as u64);
        writer.write_u8(self.path.len() as u8);

        for level in &self.path {
            writer.write_varint(level.len() as u64);
            for leaf in level {
                writer.write_varint(leaf.offset);
                let mut flags = 0u8;
                if leaf.duplicate == Some(true) {
                    flags |= 1;
                }
                if leaf.txid == Some(true) {
                    flags |= 2;
                }
                writer.write_u8(flags);
                if (flags & 1) == 0 {
                    if let Some(ref hash) = leaf.hash {
                        writer.write_bytes(hash.as_bytes());
                    }
                }
            }
        }

        writer.into_bytes()
    }

    /// Serialize to a BRC-74 hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Recompute the Merkle root for the given transaction ID.
    ///
    /// Climbs from level 0 upward, combining the running hash with the
    /// sibling recorded at offset `(index >> level) ^ 1`. A duplicate
    /// sibling combines the running hash with itself.
    ///
    /// Every sibling along the climb must be recorded directly in its
    /// level, which holds for paths produced by proof conversion and for
    /// this crate's own serialization. A combined path where an ancestor is
    /// only derivable from hashes at a lower level is rejected with
    /// [`InvalidProof`](WhatsOnChainError::InvalidProof) rather than
    /// derived.
    pub fn compute_root(&self, txid: &Hash) -> Result<Hash, WhatsOnChainError> {
        if self.path.len() > MAX_TREE_HEIGHT {
            return Err(WhatsOnChainError::InvalidProof(format!(
                "path depth {} exceeds the maximum tree height of {}",
                self.path.len(),
                MAX_TREE_HEIGHT
            )));
        }
        let leaf = self
            .path
            .first()
            .and_then(|level| level.iter().find(|l| l.hash.as_ref() == Some(txid)))
            .ok_or_else(|| {
                WhatsOnChainError::InvalidProof(format!(
                    "the path does not contain the txid {}",
                    txid
                ))
            })?;
        let index = leaf.offset;

        // A block with a single transaction: the root is the txid itself.
        if self.path.len() == 1 && self.path[0].len() == 1 {
            return Ok(*txid);
        }

        let mut working = *txid;
        for (level, leaves) in self.path.iter().enumerate() {
            let offset = (index >> level) ^ 1;
            let sibling = leaves.iter().find(|l| l.offset == offset).ok_or_else(|| {
                WhatsOnChainError::InvalidProof(format!(
                    "no sibling at level {} offset {}",
                    level, offset
                ))
            })?;

            working = if sibling.duplicate == Some(true) {
                merkle_tree_parent(&working, &working)
            } else {
                let hash = sibling.hash.ok_or_else(|| {
                    WhatsOnChainError::InvalidProof(format!(
                        "missing hash at level {} offset {}",
                        level, offset
                    ))
                })?;
                if offset & 1 == 1 {
                    merkle_tree_parent(&working, &hash)
                } else {
                    merkle_tree_parent(&hash, &working)
                }
            };
        }

        Ok(working)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRC74_HEX: &str = "fe8a6a0c000c04fde80b0011774f01d26412f0d16ea3f0447be0b5ebec67b0782e321a7a01cbdf7f734e30fde90b02004e53753e3fe4667073063a17987292cfdea278824e9888e52180581d7188d8fdea0b025e441996fc53f0191d649e68a200e752fb5f39e0d5617083408fa179ddc5c998fdeb0b0102fdf405000671394f72237d08a4277f4435e5b6edf7adc272f25effef27cdfe805ce71a81fdf50500262bccabec6c4af3ed00cc7a7414edea9c5efa92fb8623dd6160a001450a528201fdfb020101fd7c010093b3efca9b77ddec914f8effac691ecb54e2c81d0ab81cbc4c4b93befe418e8501bf01015e005881826eb6973c54003a02118fe270f03d46d02681c8bc71cd44c613e86302f8012e00e07a2bb8bb75e5accff266022e1e5e6e7b4d6d943a04faadcf2ab4a22f796ff30116008120cafa17309c0bb0e0ffce835286b3a2dcae48e4497ae2d2b7ced4f051507d010a00502e59ac92f46543c23006bff855d96f5e648043f0fb87a7a5949e6a9bebae430104001ccd9f8f64f4d0489b30cc815351cf425e0e78ad79a589350e4341ac165dbe45010301010000af8764ce7e1cc132ab5ed2229a005c87201c9a5ee15c0f91dd53eff31ab30cd4";
    const BRC74_ROOT: &str = "57aab6e6fb1b697174ffb64e062c4728f2ffd33ddcfa02a43b64d8cd29b483b4";
    const BRC74_TXID1: &str = "304e737fdfcb017a1a322e78b067ecebb5e07b44f0a36ed1f01264d2014f7711";
    const BRC74_TXID2: &str = "d888711d588021e588984e8278a2decf927298173a06737066e43f3e75534e00";
    const BRC74_TXID3: &str = "98c9c5dd79a18f40837061d5e0395ffb52e700a2689e641d19f053fc9619445e";

    fn leaf(n: u8) -> Hash {
        Hash::new([n; 32])
    }

    #[test]
    fn test_parse_and_serialize_round_trip() {
        let mp = MerklePath::from_hex(BRC74_HEX).unwrap();
        assert_eq!(mp.block_height, 813706);
        assert_eq!(mp.path.len(), 12);
        assert_eq!(BRC74_HEX, mp.to_hex());
    }

    #[test]
    fn test_compute_root_for_each_txid() {
        let mp = MerklePath::from_hex(BRC74_HEX).unwrap();
        for txid in [BRC74_TXID1, BRC74_TXID2, BRC74_TXID3] {
            let root = mp.compute_root(&Hash::from_hex(txid).unwrap()).unwrap();
            assert_eq!(root.to_string(), BRC74_ROOT);
        }
    }

    #[test]
    fn test_compute_root_rejects_foreign_txid() {
        let mp = MerklePath::from_hex(BRC74_HEX).unwrap();
        let other = Hash::new([7u8; 32]);
        assert!(matches!(
            mp.compute_root(&other),
            Err(WhatsOnChainError::InvalidProof(_))
        ));
    }

    #[test]
    fn test_rejects_truncated_bytes() {
        assert!(MerklePath::from_bytes(&[0u8; 10]).is_err());
        let full = hex::decode(BRC74_HEX).unwrap();
        assert!(MerklePath::from_bytes(&full[..full.len() - 8]).is_err());
    }

    #[test]
    fn test_rejects_excessive_tree_height() {
        // Height byte claims 65 levels; padded past the minimum-length gate.
        let mut bytes = vec![0x01, 65];
        bytes.resize(40, 0x00);
        assert!(matches!(
            MerklePath::from_bytes(&bytes),
            Err(WhatsOnChainError::InvalidProof(_))
        ));
    }

    #[test]
    fn test_rejects_huge_leaf_count() {
        // One level whose leaf count claims u64::MAX entries.
        let mut writer = ByteWriter::new();
        writer.write_varint(1);
        writer.write_u8(1);
        writer.write_varint(u64::MAX);
        let mut bytes = writer.into_bytes();
        bytes.resize(40, 0x00);
        assert!(matches!(
            MerklePath::from_bytes(&bytes),
            Err(WhatsOnChainError::InvalidProof(_))
        ));
    }

    #[test]
    fn test_compute_root_rejects_excessive_depth() {
        let txid = leaf(1);
        let mut path = vec![vec![PathElement {
            offset: 0,
            hash: Some(txid),
            txid: Some(true),
            duplicate: None,
        }]];
        path.resize(65, vec![]);
        let mp = MerklePath::new(1, path);
        assert!(matches!(
            mp.compute_root(&txid),
            Err(WhatsOnChainError::InvalidProof(_))
        ));
    }

    #[test]
    fn test_compute_root_does_not_derive_missing_siblings() {
        // Four leaves all present at level 0, but the level-1 sibling p23 is
        // only derivable from l2/l3, not recorded. The climb must fail
        // cleanly instead of deriving it.
        let l: Vec<Hash> = (0..4).map(leaf).collect();
        let level0 = l
            .iter()
            .enumerate()
            .map(|(i, h)| PathElement {
                offset: i as u64,
                hash: Some(*h),
                txid: (i == 0).then_some(true),
                duplicate: None,
            })
            .collect();
        let mp = MerklePath::new(1000, vec![level0, vec![]]);
        assert!(matches!(
            mp.compute_root(&l[0]),
            Err(WhatsOnChainError::InvalidProof(_))
        ));
    }

    #[test]
    fn test_duplicate_sibling_combines_with_itself() {
        // Three leaves: level 1 pairs (l0, l1) and (l2, l2).
        let l0 = leaf(1);
        let l1 = leaf(2);
        let l2 = leaf(3);
        let p01 = merkle_tree_parent(&l0, &l1);
        let p22 = merkle_tree_parent(&l2, &l2);
        let root = merkle_tree_parent(&p01, &p22);

        let mp = MerklePath::new(
            1000,
            vec![
                vec![
                    PathElement { offset: 2, hash: Some(l2), txid: Some(true), duplicate: None },
                    PathElement { offset: 3, hash: None, txid: None, duplicate: Some(true) },
                ],
                vec![PathElement { offset: 0, hash: Some(p01), txid: None, duplicate: None }],
            ],
        );
        assert_eq!(mp.compute_root(&l2).unwrap(), root);
    }

    #[test]
    fn test_single_transaction_block() {
        let txid = leaf(9);
        let mp = MerklePath::new(
            500,
            vec![vec![PathElement {
                offset: 0,
                hash: Some(txid),
                txid: Some(true),
                duplicate: None,
            }]],
        );
        assert_eq!(mp.compute_root(&txid).unwrap(), txid);
    }

    #[test]
    fn test_merkle_tree_parent_vector() {
        let left =
            Hash::from_hex("d6c79a6ef05572f0cb8e9a450c561fc40b0a8a7d48faad95e20d93ddeb08c231")
                .unwrap();
        let right =
            Hash::from_hex("b1ed931b79056438b990d8981ba46fae97e5574b142445a74a44b978af284f98")
                .unwrap();
        let parent = merkle_tree_parent(&left, &right);
        assert_eq!(
            parent.to_string(),
            "b0d537b3ee52e472507f453df3d69561720346118a5a8c4d85ca0de73bc792be"
        );
    }
}
