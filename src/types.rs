//! WhatsOnChain data types: configuration and API response models.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::chainhash::Hash;

/// BSV network selector used in WhatsOnChain API paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    /// Mainnet.
    #[default]
    Main,
    /// Testnet.
    Test,
    /// Scaling test network.
    Stn,
}

impl Network {
    /// The network's path segment in API URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Main => "main",
            Network::Test => "test",
            Network::Stn => "stn",
        }
    }
}

/// Configuration for a [`WhatsOnChainClient`](crate::WhatsOnChainClient).
#[derive(Debug, Clone)]
pub struct WhatsOnChainConfig {
    /// Base URL for the WhatsOnChain API, without the network segment
    /// (e.g. `https://api.whatsonchain.com/v1/bsv`).
    pub base_url: String,
    /// Which network's view of the chain to query.
    pub network: Network,
    /// Optional API key sent via the `Authorization` header.
    pub api_key: Option<String>,
    /// Minimum delay between consecutive outbound requests.
    pub request_interval: Duration,
}

impl Default for WhatsOnChainConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.whatsonchain.com/v1/bsv".to_string(),
            network: Network::Main,
            api_key: None,
            request_interval: Duration::from_millis(350),
        }
    }
}

/// A block header returned by the WhatsOnChain API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block hash.
    #[serde(default)]
    pub hash: String,
    /// Block height.
    #[serde(default)]
    pub height: u32,
    /// Merkle root hash, in display (byte-reversed hex) order.
    #[serde(default, alias = "merkleroot")]
    pub merkle_root: String,
    /// Block timestamp.
    #[serde(default)]
    pub time: u32,
}

/// A single node in a TSC compact proof: either a real sibling hash, or a
/// marker that the level had an odd node count and the missing sibling is a
/// copy of the other node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofNode {
    /// A sibling hash needed to recompute the parent at this level.
    Hash(Hash),
    /// The `"*"` sentinel: duplicate the computed node instead of consuming
    /// a sibling hash.
    Duplicate,
}

impl Serialize for ProofNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ProofNode::Hash(h) => serializer.serialize_str(&h.to_string()),
            ProofNode::Duplicate => serializer.serialize_str("*"),
        }
    }
}

impl<'de> Deserialize<'de> for ProofNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "*" {
            return Ok(ProofNode::Duplicate);
        }
        Hash::from_hex(&s)
            .map(ProofNode::Hash)
            .map_err(serde::de::Error::custom)
    }
}

/// A TSC-format compact Merkle proof returned by `tx/{txid}/proof/tsc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TscProof {
    /// 0-based position of the subject transaction at the deepest tree level.
    #[serde(default)]
    pub index: u64,
    /// The subject transaction ID (64 hex chars) or the full raw transaction
    /// hex, per the TSC format.
    pub tx_or_id: String,
    /// Block identifier the proof claims inclusion under (hash or
    /// height-as-string).
    pub target: String,
    /// Ordered sibling nodes from the leaf level upward.
    #[serde(default)]
    pub nodes: Vec<ProofNode>,
}

/// An unspent output returned by `address/{address}/unspent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utxo {
    /// Block height of the confirming block, or 0 while unconfirmed.
    #[serde(default)]
    pub height: u32,
    /// Output index within the transaction.
    #[serde(default)]
    pub tx_pos: u32,
    /// Transaction ID holding this output.
    #[serde(default)]
    pub tx_hash: String,
    /// Value in satoshis.
    #[serde(default)]
    pub value: u64,
}

/// Current BSV exchange rate from `exchangerate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Quote currency (e.g. `USD`).
    #[serde(default)]
    pub currency: String,
    /// Price of one BSV in the quote currency.
    #[serde(default)]
    pub rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proof_node_sentinel_round_trip() {
        let dup: ProofNode = serde_json::from_str("\"*\"").unwrap();
        assert_eq!(dup, ProofNode::Duplicate);
        assert_eq!(serde_json::to_string(&dup).unwrap(), "\"*\"");

        let hex = "000000000003ba27aa200b1cecaad478d2b00432346c3f1f3986da1afd33e506";
        let node: ProofNode = serde_json::from_str(&format!("\"{hex}\"")).unwrap();
        assert_eq!(node, ProofNode::Hash(Hash::from_hex(hex).unwrap()));
        assert_eq!(serde_json::to_string(&node).unwrap(), format!("\"{hex}\""));
    }

    #[test]
    fn test_proof_node_rejects_garbage() {
        assert!(serde_json::from_str::<ProofNode>("\"xyz\"").is_err());
    }

    #[test]
    fn test_tsc_proof_deserializes_api_shape() {
        let json = r#"{
            "index": 12,
            "txOrId": "0000000000000000000000000000000000000000000000000000000000000001",
            "target": "0000000000000000000000000000000000000000000000000000000000000002",
            "nodes": [
                "0000000000000000000000000000000000000000000000000000000000000003",
                "*"
            ]
        }"#;
        let proof: TscProof = serde_json::from_str(json).unwrap();
        assert_eq!(proof.index, 12);
        assert_eq!(proof.nodes.len(), 2);
        assert_eq!(proof.nodes[1], ProofNode::Duplicate);
    }

    #[test]
    fn test_block_header_merkleroot_alias() {
        let json = r#"{"hash":"abc","height":800000,"merkleroot":"def","time":1700000000}"#;
        let header: BlockHeader = serde_json::from_str(json).unwrap();
        assert_eq!(header.merkle_root, "def");
        assert_eq!(header.height, 800000);
    }

    #[test]
    fn test_config_defaults() {
        let config = WhatsOnChainConfig::default();
        assert_eq!(config.base_url, "https://api.whatsonchain.com/v1/bsv");
        assert_eq!(config.network, Network::Main);
        assert!(config.api_key.is_none());
        assert_eq!(config.request_interval, Duration::from_millis(350));
    }
}
