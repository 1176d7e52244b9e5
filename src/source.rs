//! Collaborator seam between the HTTP client and the proof logic.

use std::future::Future;

use crate::error::WhatsOnChainError;
use crate::types::{BlockHeader, TscProof};

/// Access to the explorer data the proof converter and ancestor resolver
/// suspend on.
///
/// Implemented by [`WhatsOnChainClient`](crate::WhatsOnChainClient); tests
/// implement it with in-memory maps.
pub trait ChainSource {
    /// Fetch the block header for a block hash or height.
    fn fetch_header(
        &self,
        block: &str,
    ) -> impl Future<Output = Result<BlockHeader, WhatsOnChainError>> + Send;

    /// Fetch the TSC compact proof for a transaction.
    ///
    /// `Ok(None)` means the explorer has no proof (the transaction is
    /// unconfirmed), which is expected control flow rather than an error.
    fn fetch_tsc_proof(
        &self,
        txid: &str,
    ) -> impl Future<Output = Result<Option<TscProof>, WhatsOnChainError>> + Send;

    /// Fetch a raw transaction as hex, if the explorer knows it.
    fn fetch_raw_tx(
        &self,
        txid: &str,
    ) -> impl Future<Output = Result<Option<String>, WhatsOnChainError>> + Send;
}
