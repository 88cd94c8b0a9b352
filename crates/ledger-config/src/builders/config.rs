//! Configuration builder for test and development configurations.

use crate::{
	Config, ConfirmationConfig, LedgerConfig, NodeConfig, WalletConfig, WatchConfig,
	WorkshopConfig,
};
use ledger_types::{Address, ExplorerConfig, TokenConfig};
use std::collections::HashMap;

/// Builder for `Config` instances with test-friendly defaults.
///
/// Backend `implementations` tables are left empty, so the result is meant
/// to be used directly rather than passed back through validation.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	token_address: Address,
	token_decimals: u8,
	poll_interval_seconds: u64,
	max_polls: Option<u64>,
	ends_at_block: u64,
	explorer: Option<ExplorerConfig>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			token_address: Address::repeat_byte(0x42),
			token_decimals: 18,
			poll_interval_seconds: 1,
			max_polls: None,
			ends_at_block: 168_999,
			explorer: None,
		}
	}

	pub fn token_address(mut self, address: Address) -> Self {
		self.token_address = address;
		self
	}

	pub fn token_decimals(mut self, decimals: u8) -> Self {
		self.token_decimals = decimals;
		self
	}

	pub fn poll_interval_seconds(mut self, seconds: u64) -> Self {
		self.poll_interval_seconds = seconds;
		self
	}

	pub fn max_polls(mut self, max_polls: Option<u64>) -> Self {
		self.max_polls = max_polls;
		self
	}

	pub fn ends_at_block(mut self, block: u64) -> Self {
		self.ends_at_block = block;
		self
	}

	pub fn explorer(mut self, explorer: Option<ExplorerConfig>) -> Self {
		self.explorer = explorer;
		self
	}

	pub fn build(self) -> Config {
		Config {
			ledger: LedgerConfig {
				name: "test-ledger".to_string(),
				native_symbol: "ETH".to_string(),
				native_decimals: 18,
			},
			node: NodeConfig {
				primary: "scripted".to_string(),
				implementations: HashMap::new(),
			},
			wallet: WalletConfig {
				primary: "mock".to_string(),
				implementations: HashMap::new(),
			},
			token: TokenConfig {
				address: self.token_address,
				symbol: "TST".to_string(),
				decimals: self.token_decimals,
			},
			watch: WatchConfig::default(),
			confirmation: ConfirmationConfig {
				poll_interval_seconds: self.poll_interval_seconds,
				max_polls: self.max_polls,
			},
			workshop: WorkshopConfig {
				ends_at_block: self.ends_at_block,
			},
			explorer: self.explorer,
		}
	}
}
