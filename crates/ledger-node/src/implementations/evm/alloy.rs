//! Alloy-based EVM node backend.
//!
//! Reads block height, balances, view calls and receipts over HTTP JSON-RPC
//! using an alloy provider. A transaction counts as confirmed once its
//! receipt has the configured number of confirmations.

use crate::{NodeError, NodeInterface};
use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_transport::{RpcError, TransportError};
use alloy_transport_http::Http;
use async_trait::async_trait;
use ledger_types::{
	truncate_id, ConfigSchema, Field, FieldType, Schema, TransactionHash, TransactionStatus,
	ValidationError,
};
use std::sync::Arc;

/// Reason reported for receipts with a failed status.
const REVERTED: &str = "Transaction reverted";

/// Alloy-based EVM node implementation.
pub struct AlloyNode {
	provider: Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>,
	/// Confirmations required before a receipt is reported as final.
	min_confirmations: u64,
}

impl AlloyNode {
	/// Creates a node client for the given RPC URL.
	pub fn new(rpc_url: &str, min_confirmations: u64) -> Result<Self, NodeError> {
		let url = rpc_url
			.parse()
			.map_err(|e| NodeError::Config(format!("Invalid RPC URL '{}': {}", rpc_url, e)))?;

		let provider = ProviderBuilder::new().on_http(url);

		Ok(Self {
			provider: Arc::new(provider),
			min_confirmations: min_confirmations.max(1),
		})
	}
}

/// Maps transport failures onto the read error taxonomy.
fn classify(context: &str, err: TransportError) -> NodeError {
	match err {
		RpcError::Transport(kind) => NodeError::Unreachable(format!("{}: {}", context, kind)),
		RpcError::ErrorResp(payload) => NodeError::NotFound(format!("{}: {}", context, payload)),
		RpcError::NullResp => NodeError::Malformed(format!("{}: null response", context)),
		RpcError::DeserError { err, .. } => NodeError::Malformed(format!("{}: {}", context, err)),
		other => NodeError::Malformed(format!("{}: {}", context, other)),
	}
}

/// Configuration schema for the Alloy node backend.
pub struct AlloyNodeSchema;

impl AlloyNodeSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		Self.validate(config)
	}
}

impl ConfigSchema for AlloyNodeSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("rpc_url", FieldType::HttpUrl)],
			vec![Field::new(
				"min_confirmations",
				FieldType::Integer {
					min: Some(1),
					max: Some(100),
				},
			)],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl NodeInterface for AlloyNode {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(AlloyNodeSchema)
	}

	async fn block_number(&self) -> Result<u64, NodeError> {
		self.provider
			.get_block_number()
			.await
			.map_err(|e| classify("Failed to get block number", e))
	}

	async fn native_balance(&self, account: Address) -> Result<U256, NodeError> {
		self.provider
			.get_balance(account)
			.await
			.map_err(|e| classify("Failed to get balance", e))
	}

	async fn call_view(&self, contract: Address, calldata: Bytes) -> Result<Bytes, NodeError> {
		let request = TransactionRequest::default().to(contract).input(calldata.into());
		self.provider
			.call(&request)
			.await
			.map_err(|e| classify("Failed to execute view call", e))
	}

	async fn transaction_status(
		&self,
		hash: &TransactionHash,
	) -> Result<TransactionStatus, NodeError> {
		if hash.0.len() != 32 {
			return Err(NodeError::Malformed(format!(
				"Transaction hash must be 32 bytes, got {}",
				hash.0.len()
			)));
		}
		let tx_hash = FixedBytes::<32>::from_slice(&hash.0);

		let receipt = match self.provider.get_transaction_receipt(tx_hash).await {
			Ok(Some(receipt)) => receipt,
			Ok(None) => return Ok(TransactionStatus::Pending),
			Err(e) => return Err(classify("Failed to get receipt", e)),
		};

		// Mined but without a block number yet
		let Some(tx_block) = receipt.block_number else {
			return Ok(TransactionStatus::Pending);
		};

		if !receipt.status() {
			return Ok(TransactionStatus::Rejected {
				reason: REVERTED.to_string(),
			});
		}

		if self.min_confirmations > 1 {
			let current_block = self.block_number().await?;
			let confirmations = current_block.saturating_sub(tx_block) + 1;
			if confirmations < self.min_confirmations {
				tracing::debug!(
					tx_hash = %truncate_id(&hash.to_hex()),
					confirmations,
					required = self.min_confirmations,
					"Waiting for more confirmations"
				);
				return Ok(TransactionStatus::Pending);
			}
		}

		Ok(TransactionStatus::Confirmed {
			block_number: tx_block,
		})
	}
}

/// Factory function to create an HTTP node backend from configuration.
///
/// # Parameters
/// - `config`: TOML table containing:
///   - `rpc_url` (required): HTTP(S) JSON-RPC endpoint
///   - `min_confirmations` (optional): confirmations before a receipt is final, defaults to 1
pub fn create_node(config: &toml::Value) -> Result<Box<dyn NodeInterface>, NodeError> {
	AlloyNodeSchema::validate_config(config)
		.map_err(|e| NodeError::Config(format!("Invalid configuration: {}", e)))?;

	let rpc_url = config
		.get("rpc_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| NodeError::Config("rpc_url is required".to_string()))?;

	let min_confirmations = config
		.get("min_confirmations")
		.and_then(|v| v.as_integer())
		.unwrap_or(1) as u64;

	Ok(Box::new(AlloyNode::new(rpc_url, min_confirmations)?))
}

/// Registry for the HTTP/Alloy node implementation.
pub struct Registry;

impl ledger_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "evm_alloy";
	type Factory = crate::NodeFactory;

	fn factory() -> Self::Factory {
		create_node
	}
}

impl crate::NodeRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_schema_requires_http_url() {
		let ok: toml::Value =
			toml::from_str("rpc_url = \"http://localhost:8545\"\nmin_confirmations = 2").unwrap();
		assert!(AlloyNodeSchema::validate_config(&ok).is_ok());

		let missing: toml::Value = toml::from_str("min_confirmations = 2").unwrap();
		assert!(AlloyNodeSchema::validate_config(&missing).is_err());

		let bad_url: toml::Value = toml::from_str("rpc_url = \"ws://localhost:8546\"").unwrap();
		assert!(AlloyNodeSchema::validate_config(&bad_url).is_err());

		let zero: toml::Value =
			toml::from_str("rpc_url = \"http://localhost:8545\"\nmin_confirmations = 0").unwrap();
		assert!(AlloyNodeSchema::validate_config(&zero).is_err());
	}

	#[tokio::test]
	async fn test_factory_builds_backend() {
		let config: toml::Value = toml::from_str("rpc_url = \"http://127.0.0.1:8545\"").unwrap();
		assert!(create_node(&config).is_ok());
	}

	#[tokio::test]
	async fn test_short_hash_is_malformed() {
		let node = AlloyNode::new("http://127.0.0.1:8545", 1).unwrap();
		let result = node.transaction_status(&TransactionHash(vec![1, 2, 3])).await;
		assert!(matches!(result, Err(NodeError::Malformed(_))));
	}
}
