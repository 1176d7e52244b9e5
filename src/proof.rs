//! TSC-to-BUMP proof conversion and verification.

use crate::chainhash::Hash;
use crate::error::WhatsOnChainError;
use crate::merkle_path::{MerklePath, PathElement, MAX_TREE_HEIGHT};
use crate::source::ChainSource;
use crate::transaction::Transaction;
use crate::types::{ProofNode, TscProof};

/// Convert a TSC compact proof into a verified BUMP Merkle path.
///
/// Fetches the header for `proof.target`, expands the sibling list into
/// per-level path elements, and independently recomputes the Merkle root.
/// Fails with [`HeaderUnavailable`](WhatsOnChainError::HeaderUnavailable) if
/// the header cannot be fetched, and with
/// [`InvalidProof`](WhatsOnChainError::InvalidProof) if the proof is
/// malformed or the recomputed root does not match the header's root.
pub async fn tsc_to_bump<S: ChainSource>(
    source: &S,
    proof: &TscProof,
) -> Result<MerklePath, WhatsOnChainError> {
    let header = source.fetch_header(&proof.target).await.map_err(|e| {
        WhatsOnChainError::HeaderUnavailable(format!("block {}: {}", proof.target, e))
    })?;
    let expected_root = Hash::from_hex(&header.merkle_root).map_err(|e| {
        WhatsOnChainError::HeaderUnavailable(format!(
            "malformed merkle root for block {}: {}",
            proof.target, e
        ))
    })?;
    let subject = subject_txid(proof)?;

    if proof.nodes.is_empty() && proof.index != 0 {
        return Err(WhatsOnChainError::InvalidProof(format!(
            "no sibling nodes but leaf index is {}",
            proof.index
        )));
    }
    if proof.nodes.len() > MAX_TREE_HEIGHT {
        return Err(WhatsOnChainError::InvalidProof(format!(
            "proof depth {} exceeds the maximum tree height of {}",
            proof.nodes.len(),
            MAX_TREE_HEIGHT
        )));
    }

    let subject_leaf = PathElement {
        offset: proof.index,
        hash: Some(subject),
        txid: Some(true),
        duplicate: None,
    };

    let mut path = Vec::with_capacity(proof.nodes.len().max(1));
    if proof.nodes.is_empty() {
        path.push(vec![subject_leaf]);
    } else {
        for (i, node) in proof.nodes.iter().enumerate() {
            let offset = (proof.index >> i) ^ 1;
            let sibling = match node {
                ProofNode::Hash(h) => PathElement {
                    offset,
                    hash: Some(*h),
                    txid: None,
                    duplicate: None,
                },
                ProofNode::Duplicate => {
                    // The subject always has a real sibling (or is alone in
                    // the block); a synthetic duplicate next to it means the
                    // proof data is corrupt.
                    if i == 0 {
                        return Err(WhatsOnChainError::InvalidProof(
                            "duplicate marker adjacent to the subject leaf".to_string(),
                        ));
                    }
                    PathElement {
                        offset,
                        hash: None,
                        txid: None,
                        duplicate: Some(true),
                    }
                }
            };
            if i == 0 {
                // Level 0 carries both the subject and its direct sibling,
                // in left/right order decided by the leaf index parity.
                if proof.index & 1 == 1 {
                    path.push(vec![subject_leaf.clone(), sibling]);
                } else {
                    path.push(vec![sibling, subject_leaf.clone()]);
                }
            } else {
                path.push(vec![sibling]);
            }
        }
    }

    let path = MerklePath::new(header.height, path);
    let computed = path.compute_root(&subject)?;
    if computed != expected_root {
        return Err(WhatsOnChainError::InvalidProof(format!(
            "computed root {} does not match block {} merkle root {}",
            computed, proof.target, expected_root
        )));
    }
    Ok(path)
}

/// Resolve the subject transaction ID from a TSC proof.
///
/// The TSC `txOrId` field carries either the 64-character txid or the full
/// raw transaction hex.
fn subject_txid(proof: &TscProof) -> Result<Hash, WhatsOnChainError> {
    if proof.tx_or_id.len() == 64 {
        Hash::from_hex(&proof.tx_or_id)
            .map_err(|e| WhatsOnChainError::InvalidProof(format!("invalid subject txid: {}", e)))
    } else {
        let tx = Transaction::from_hex(&proof.tx_or_id).map_err(|e| {
            WhatsOnChainError::InvalidProof(format!("invalid subject transaction: {}", e))
        })?;
        Ok(tx.txid())
    }
}
