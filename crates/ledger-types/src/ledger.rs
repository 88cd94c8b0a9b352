//! Ledger, token and explorer configuration types.

use crate::TransactionHash;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// The ledger's native currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct NativeCurrency {
	pub symbol: String,
	pub decimals: u8,
}

impl Default for NativeCurrency {
	fn default() -> Self {
		Self {
			symbol: "ETH".to_string(),
			decimals: 18,
		}
	}
}

/// The token contract the console operates on.
///
/// # Fields
///
/// * `address` - The on-chain address of the token contract
/// * `symbol` - The token symbol shown next to amounts
/// * `decimals` - The number of decimal places for the token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct TokenConfig {
	pub address: Address,
	pub symbol: String,
	pub decimals: u8,
}

/// Block explorer used for display links.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExplorerConfig {
	pub name: String,
	pub base_url: String,
}

impl ExplorerConfig {
	/// Link to a transaction page.
	pub fn transaction_url(&self, hash: &TransactionHash) -> String {
		format!("{}/tx/{}", self.base_url.trim_end_matches('/'), hash.to_hex())
	}
}
