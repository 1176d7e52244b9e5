//! Async client for the [WhatsOnChain](https://whatsonchain.com) BSV block
//! explorer, with verified Merkle proof handling.
//!
//! The two core operations beyond plain endpoint access:
//!
//! - [`WhatsOnChainClient::convert_proof`] turns a TSC compact proof into a
//!   BUMP-style [`MerklePath`], recomputing the Merkle root against the
//!   block header before accepting it.
//! - [`WhatsOnChainClient::resolve`] walks an unconfirmed transaction's
//!   ancestry, attaching source transactions to each input until every
//!   branch terminates at a mined transaction with a verified path.
//!
//! All requests share one rate-limited lane, so recursive resolution never
//! floods the API.
//!
//! ```no_run
//! use bsv_whatsonchain::{Transaction, WhatsOnChainClient, WhatsOnChainConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WhatsOnChainClient::new(WhatsOnChainConfig::default());
//!     let raw = client
//!         .get_raw_tx("4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b")
//!         .await?
//!         .ok_or("transaction not found")?;
//!     let mut tx = Transaction::from_hex(&raw)?;
//!     client.resolve(&mut tx).await?;
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]

pub mod chainhash;
mod client;
mod error;
pub mod merkle_path;
mod proof;
mod resolve;
mod scheduler;
mod source;
pub mod transaction;
pub mod types;
mod util;

pub use chainhash::Hash;
pub use client::WhatsOnChainClient;
pub use error::WhatsOnChainError;
pub use merkle_path::{merkle_tree_parent, MerklePath, PathElement, MAX_TREE_HEIGHT};
pub use proof::tsc_to_bump;
pub use resolve::resolve_ancestors;
pub use scheduler::RequestScheduler;
pub use source::ChainSource;
pub use transaction::{Transaction, TransactionInput, TransactionOutput};
pub use types::{
    BlockHeader, ExchangeRate, Network, ProofNode, TscProof, Utxo, WhatsOnChainConfig,
};
