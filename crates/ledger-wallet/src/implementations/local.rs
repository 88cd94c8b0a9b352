//! Local private-key wallet.
//!
//! Signs with an in-process key and broadcasts through an alloy provider whose
//! fillers take care of nonce, gas and chain id. One payload becomes one
//! transaction, so batches of more than one call are refused.

use crate::{WalletError, WalletInterface};
use alloy_network::EthereumWallet;
use alloy_primitives::Address;
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport_http::Http;
use async_trait::async_trait;
use ledger_types::{
	with_0x_prefix, without_0x_prefix, CallPayload, ConfigSchema, Field, FieldType, Schema,
	SecretString, TransactionHash, ValidationError,
};
use std::sync::Arc;

/// Wallet backed by a local private key.
pub struct LocalWallet {
	provider: Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>,
	address: Address,
}

impl LocalWallet {
	/// Creates a wallet from a hex private key, broadcasting to `rpc_url`.
	pub fn new(
		private_key: &SecretString,
		rpc_url: &str,
		chain_id: Option<u64>,
	) -> Result<Self, WalletError> {
		let signer: PrivateKeySigner = private_key
			.with_exposed(|key| without_0x_prefix(key).parse())
			.map_err(|_| WalletError::Config("Invalid private key".to_string()))?;
		let signer = signer.with_chain_id(chain_id);
		let address = signer.address();

		let url = rpc_url
			.parse()
			.map_err(|e| WalletError::Config(format!("Invalid RPC URL '{}': {}", rpc_url, e)))?;

		let provider = ProviderBuilder::new()
			.with_recommended_fillers()
			.wallet(EthereumWallet::from(signer))
			.on_http(url);

		Ok(Self {
			provider: Arc::new(provider),
			address,
		})
	}
}

/// Configuration schema for the local wallet.
pub struct LocalWalletSchema;

impl LocalWalletSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		Self.validate(config)
	}
}

impl ConfigSchema for LocalWalletSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("private_key", FieldType::String).with_validator(|value| {
					let key = value.as_str().map(without_0x_prefix).unwrap_or_default();
					if key.len() != 64 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
						return Err("private_key must be 64 hex characters".to_string());
					}
					Ok(())
				}),
				Field::new("rpc_url", FieldType::HttpUrl),
			],
			vec![Field::new(
				"chain_id",
				FieldType::Integer {
					min: Some(1),
					max: None,
				},
			)],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl WalletInterface for LocalWallet {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalWalletSchema)
	}

	async fn connect(&self) -> Option<Address> {
		Some(self.address)
	}

	async fn sign_and_broadcast(
		&self,
		payloads: &[CallPayload],
	) -> Result<TransactionHash, WalletError> {
		let payload = match payloads {
			[payload] => payload,
			[] => return Err(WalletError::BroadcastFailed("empty batch".to_string())),
			_ => {
				return Err(WalletError::BroadcastFailed(format!(
					"local wallet sends one call per transaction, got {}",
					payloads.len()
				)))
			},
		};

		let request = TransactionRequest::default()
			.from(self.address)
			.to(payload.target)
			.input(payload.calldata.clone().into());

		let pending_tx = self
			.provider
			.send_transaction(request)
			.await
			.map_err(|e| WalletError::BroadcastFailed(e.to_string()))?;

		let tx_hash = *pending_tx.tx_hash();
		tracing::debug!(
			tx_hash = %with_0x_prefix(&hex::encode(tx_hash.0)),
			function = %payload.function,
			"Broadcast transaction"
		);

		Ok(TransactionHash(tx_hash.0.to_vec()))
	}
}

/// Factory function to create a local wallet from configuration.
///
/// # Parameters
/// - `config`: TOML table containing:
///   - `private_key` (required): hex-encoded secp256k1 key
///   - `rpc_url` (required): endpoint used for broadcasting
///   - `chain_id` (optional): chain id for EIP-155 signing
pub fn create_wallet(config: &toml::Value) -> Result<Box<dyn WalletInterface>, WalletError> {
	LocalWalletSchema::validate_config(config)
		.map_err(|e| WalletError::Config(format!("Invalid configuration: {}", e)))?;

	let private_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.map(SecretString::from)
		.ok_or_else(|| WalletError::Config("private_key is required".to_string()))?;

	let rpc_url = config
		.get("rpc_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| WalletError::Config("rpc_url is required".to_string()))?;

	let chain_id = config
		.get("chain_id")
		.and_then(|v| v.as_integer())
		.map(|id| id as u64);

	Ok(Box::new(LocalWallet::new(&private_key, rpc_url, chain_id)?))
}

/// Registry for the local wallet implementation.
pub struct Registry;

impl ledger_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = crate::WalletFactory;

	fn factory() -> Self::Factory {
		create_wallet
	}
}

impl crate::WalletRegistry for Registry {}
