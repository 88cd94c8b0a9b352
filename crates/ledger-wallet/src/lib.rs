//! Write submission for the ledger operations system.
//!
//! This module hands unsigned call payloads to a wallet for signing and
//! broadcast. It defines the `WalletInterface` seam implemented by signing
//! backends and the `WriteSubmitter` that turns a successful broadcast into a
//! `SubmissionHandle`.

use alloy_primitives::Address;
use async_trait::async_trait;
use ledger_types::{
	truncate_id, CallPayload, ConfigSchema, ImplementationRegistry, OperationError,
	SubmissionHandle, TransactionHash,
};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur while signing or broadcasting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
	/// The user declined to sign.
	#[error("User rejected the request")]
	UserRejected,
	/// No signer is connected.
	#[error("Signing unavailable: {0}")]
	SigningUnavailable(String),
	/// The node refused the signed transaction, or it could not be sent.
	#[error("Broadcast failed: {0}")]
	BroadcastFailed(String),
	/// Backend configuration is invalid.
	#[error("Configuration error: {0}")]
	Config(String),
}

impl From<WalletError> for OperationError {
	fn from(err: WalletError) -> Self {
		match err {
			WalletError::UserRejected => OperationError::UserRejected,
			WalletError::SigningUnavailable(reason) | WalletError::Config(reason) => {
				OperationError::SigningUnavailable(reason)
			},
			WalletError::BroadcastFailed(reason) => OperationError::BroadcastFailed(reason),
		}
	}
}

/// Trait defining the interface for signing backends.
///
/// A backend owns the signing identity. Implementations decide whether they
/// can broadcast a batch of payloads as one submission.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletInterface: Send + Sync {
	/// Returns the configuration schema for this backend.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Returns the connected account, if any.
	async fn connect(&self) -> Option<Address>;

	/// Signs the payloads and broadcasts them as one submission.
	async fn sign_and_broadcast(
		&self,
		payloads: &[CallPayload],
	) -> Result<TransactionHash, WalletError>;
}

/// Type alias for wallet factory functions.
pub type WalletFactory = fn(&toml::Value) -> Result<Box<dyn WalletInterface>, WalletError>;

/// Registry trait for wallet implementations.
pub trait WalletRegistry: ImplementationRegistry<Factory = WalletFactory> {}

/// Get all registered wallet implementations.
pub fn get_all_implementations() -> Vec<(&'static str, WalletFactory)> {
	use implementations::local;

	vec![(local::Registry::NAME, local::Registry::factory())]
}

/// Submits unsigned payloads through the configured wallet.
///
/// Never retries a failed broadcast.
pub struct WriteSubmitter {
	wallet: Box<dyn WalletInterface>,
}

impl WriteSubmitter {
	pub fn new(wallet: Box<dyn WalletInterface>) -> Self {
		Self { wallet }
	}

	/// Returns the account the wallet is connected as.
	pub async fn account(&self) -> Option<Address> {
		self.wallet.connect().await
	}

	/// Signs and broadcasts `payloads` as a single submission.
	pub async fn submit(&self, payloads: &[CallPayload]) -> Result<SubmissionHandle, WalletError> {
		if payloads.is_empty() {
			return Err(WalletError::BroadcastFailed("empty batch".to_string()));
		}

		let tx_hash = self.wallet.sign_and_broadcast(payloads).await?;
		tracing::info!(
			tx_hash = %truncate_id(&tx_hash.to_hex()),
			calls = payloads.len(),
			"Submitted transaction"
		);

		Ok(SubmissionHandle::new(tx_hash))
	}
}
