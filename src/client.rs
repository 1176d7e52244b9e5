//! Async WhatsOnChain API client.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::WhatsOnChainError;
use crate::merkle_path::MerklePath;
use crate::proof::tsc_to_bump;
use crate::resolve::resolve_ancestors;
use crate::scheduler::RequestScheduler;
use crate::source::ChainSource;
use crate::transaction::Transaction;
use crate::types::{BlockHeader, ExchangeRate, TscProof, Utxo, WhatsOnChainConfig};

/// Client for the WhatsOnChain block explorer API.
///
/// All requests go through a shared [`RequestScheduler`], so concurrent
/// calls (including the fan-out inside ancestor resolution) are serialized
/// and rate limited as one pipeline. The client is cheap to clone; clones
/// share the scheduler.
#[derive(Debug, Clone)]
pub struct WhatsOnChainClient {
    config: WhatsOnChainConfig,
    http_client: reqwest::Client,
    scheduler: Arc<RequestScheduler>,
}

impl WhatsOnChainClient {
    /// Create a client with the given configuration.
    pub fn new(config: WhatsOnChainConfig) -> Self {
        let scheduler = Arc::new(RequestScheduler::new(config.request_interval));
        WhatsOnChainClient {
            config,
            http_client: reqwest::Client::new(),
            scheduler,
        }
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &WhatsOnChainConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url,
            self.config.network.as_str(),
            path
        )
    }

    /// Perform a scheduled GET and return the status with the full body.
    ///
    /// The body read happens inside the scheduler slot so the rate limit
    /// covers the whole exchange, not just the request dispatch.
    async fn get_text(&self, path: &str) -> Result<(StatusCode, String), WhatsOnChainError> {
        let mut request = self.http_client.get(self.url(path));
        if let Some(api_key) = &self.config.api_key {
            request = request.header(reqwest::header::AUTHORIZATION, api_key);
        }
        let (status, body) = self
            .scheduler
            .run(async {
                let response = request.send().await?;
                let status = response.status();
                let body = response.text().await?;
                Ok::<_, reqwest::Error>((status, body))
            })
            .await?;

        if status == StatusCode::NOT_FOUND {
            return Err(WhatsOnChainError::NotFound);
        }
        if !status.is_success() {
            return Err(WhatsOnChainError::ServerError {
                status_code: status.as_u16(),
                message: body,
            });
        }
        Ok((status, body))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, WhatsOnChainError> {
        let (_, body) = self.get_text(path).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch the header of a block by hash or height.
    pub async fn get_block_header(
        &self,
        block: &str,
    ) -> Result<BlockHeader, WhatsOnChainError> {
        self.get_json(&format!("block/{}/header", block)).await
    }

    /// Fetch the TSC compact proof for a transaction.
    ///
    /// Returns `Ok(None)` when the transaction is unconfirmed: the endpoint
    /// answers that with a 404, a `null` body, or an empty body depending on
    /// the deployment.
    pub async fn get_tsc_proof(
        &self,
        txid: &str,
    ) -> Result<Option<TscProof>, WhatsOnChainError> {
        let body = match self.get_text(&format!("tx/{}/proof/tsc", txid)).await {
            Ok((_, body)) => body,
            Err(WhatsOnChainError::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(trimmed)?))
    }

    /// Fetch a raw transaction as hex, or `Ok(None)` if the explorer does
    /// not know the transaction.
    pub async fn get_raw_tx(&self, txid: &str) -> Result<Option<String>, WhatsOnChainError> {
        match self.get_text(&format!("tx/{}/hex", txid)).await {
            Ok((_, body)) => Ok(Some(body.trim().to_string())),
            Err(WhatsOnChainError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// List unspent outputs for an address.
    pub async fn get_utxos(&self, address: &str) -> Result<Vec<Utxo>, WhatsOnChainError> {
        self.get_json(&format!("address/{}/unspent", address)).await
    }

    /// Fetch the current BSV exchange rate.
    pub async fn get_exchange_rate(&self) -> Result<ExchangeRate, WhatsOnChainError> {
        self.get_json("exchangerate").await
    }

    /// Convert a TSC proof into a verified BUMP Merkle path, fetching the
    /// block header through this client.
    pub async fn convert_proof(
        &self,
        proof: &TscProof,
    ) -> Result<MerklePath, WhatsOnChainError> {
        tsc_to_bump(self, proof).await
    }

    /// Resolve the ancestry of `tx` until every branch reaches a mined
    /// transaction with a verified Merkle path.
    pub async fn resolve(&self, tx: &mut Transaction) -> Result<(), WhatsOnChainError> {
        resolve_ancestors(self, tx).await
    }
}

impl ChainSource for WhatsOnChainClient {
    async fn fetch_header(&self, block: &str) -> Result<BlockHeader, WhatsOnChainError> {
        self.get_block_header(block).await
    }

    async fn fetch_tsc_proof(&self, txid: &str) -> Result<Option<TscProof>, WhatsOnChainError> {
        self.get_tsc_proof(txid).await
    }

    async fn fetch_raw_tx(&self, txid: &str) -> Result<Option<String>, WhatsOnChainError> {
        self.get_raw_tx(txid).await
    }
}
