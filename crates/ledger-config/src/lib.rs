//! Configuration module for the ledger operations system.
//!
//! This module provides the configuration structures for the console and the
//! loading logic around them. Configuration is TOML, validated after parsing.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)
//!
//! Values may reference the environment with `${VAR}` or `${VAR:-default}`.

#[cfg(any(test, feature = "testing"))]
pub mod builders {
	pub mod config;
}
mod loader;

pub use loader::ConfigLoader;

use ledger_types::{Address, ExplorerConfig, NativeCurrency, TokenConfig};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Only the message; the default rendering repeats the input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the ledger console.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Ledger identity and native currency.
	pub ledger: LedgerConfig,
	/// Node backends used for reads.
	pub node: NodeConfig,
	/// Wallet backends used for writes.
	pub wallet: WalletConfig,
	/// The token contract operated on.
	pub token: TokenConfig,
	/// Refresh cadence of watched reads.
	#[serde(default)]
	pub watch: WatchConfig,
	/// Confirmation polling.
	#[serde(default)]
	pub confirmation: ConfirmationConfig,
	/// Workshop window.
	#[serde(default)]
	pub workshop: WorkshopConfig,
	/// Block explorer for transaction links.
	pub explorer: Option<ExplorerConfig>,
}

/// Ledger identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
	/// Display name of the ledger.
	pub name: String,
	/// Symbol of the native currency.
	#[serde(default = "default_native_symbol")]
	pub native_symbol: String,
	/// Decimal places of the native currency.
	#[serde(default = "default_native_decimals")]
	pub native_decimals: u8,
}

impl LedgerConfig {
	pub fn native_currency(&self) -> NativeCurrency {
		NativeCurrency {
			symbol: self.native_symbol.clone(),
			decimals: self.native_decimals,
		}
	}
}

fn default_native_symbol() -> String {
	"ETH".to_string()
}

fn default_native_decimals() -> u8 {
	18
}

/// Configuration for node backends.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Map of node implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for wallet backends.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WalletConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Map of wallet implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Refresh intervals for watched reads, in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchConfig {
	#[serde(default = "default_watch_interval")]
	pub block_interval_seconds: u64,
	#[serde(default = "default_watch_interval")]
	pub balance_interval_seconds: u64,
	#[serde(default = "default_watch_interval")]
	pub supply_interval_seconds: u64,
}

impl WatchConfig {
	pub fn block_interval(&self) -> Duration {
		Duration::from_secs(self.block_interval_seconds)
	}

	pub fn balance_interval(&self) -> Duration {
		Duration::from_secs(self.balance_interval_seconds)
	}

	pub fn supply_interval(&self) -> Duration {
		Duration::from_secs(self.supply_interval_seconds)
	}
}

impl Default for WatchConfig {
	fn default() -> Self {
		Self {
			block_interval_seconds: default_watch_interval(),
			balance_interval_seconds: default_watch_interval(),
			supply_interval_seconds: default_watch_interval(),
		}
	}
}

fn default_watch_interval() -> u64 {
	10
}

/// Confirmation polling settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConfirmationConfig {
	/// Seconds between status polls.
	/// Defaults to 3 seconds if not specified.
	#[serde(default = "default_poll_interval_seconds")]
	pub poll_interval_seconds: u64,
	/// Polls before giving up. Unset means poll until a terminal status.
	pub max_polls: Option<u64>,
}

impl ConfirmationConfig {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_secs(self.poll_interval_seconds)
	}
}

impl Default for ConfirmationConfig {
	fn default() -> Self {
		Self {
			poll_interval_seconds: default_poll_interval_seconds(),
			max_polls: None,
		}
	}
}

fn default_poll_interval_seconds() -> u64 {
	3
}

/// Workshop window settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkshopConfig {
	/// First block height at which the workshop counts as ended.
	#[serde(default = "default_ends_at_block")]
	pub ends_at_block: u64,
}

impl Default for WorkshopConfig {
	fn default() -> Self {
		Self {
			ends_at_block: default_ends_at_block(),
		}
	}
}

fn default_ends_at_block() -> u64 {
	168_999
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full), Some(name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match (std::env::var(name.as_str()), cap.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					name.as_str()
				)))
			},
		};

		result.push_str(&input[last..full.start()]);
		result.push_str(&value);
		last = full.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	///
	/// Each top-level section must be unique across all configuration files.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration after parsing.
	///
	/// - Ledger name and backend primaries must be non-empty
	/// - Each primary must be among its section's implementations
	/// - Intervals and `max_polls` must be greater than 0
	/// - The token address must not be zero
	fn validate(&self) -> Result<(), ConfigError> {
		if self.ledger.name.is_empty() {
			return Err(ConfigError::Validation("Ledger name cannot be empty".into()));
		}

		validate_backends("node", &self.node.primary, &self.node.implementations)?;
		validate_backends("wallet", &self.wallet.primary, &self.wallet.implementations)?;

		if self.token.address == Address::ZERO {
			return Err(ConfigError::Validation(
				"Token address cannot be the zero address".into(),
			));
		}
		if self.token.symbol.is_empty() {
			return Err(ConfigError::Validation("Token symbol cannot be empty".into()));
		}

		for (name, value) in [
			("watch.block_interval_seconds", self.watch.block_interval_seconds),
			("watch.balance_interval_seconds", self.watch.balance_interval_seconds),
			("watch.supply_interval_seconds", self.watch.supply_interval_seconds),
			("confirmation.poll_interval_seconds", self.confirmation.poll_interval_seconds),
		] {
			if value == 0 {
				return Err(ConfigError::Validation(format!(
					"{} must be greater than 0",
					name
				)));
			}
		}

		if self.confirmation.max_polls == Some(0) {
			return Err(ConfigError::Validation(
				"confirmation.max_polls must be greater than 0 when set".into(),
			));
		}

		if let Some(explorer) = &self.explorer {
			if !explorer.base_url.starts_with("http://") && !explorer.base_url.starts_with("https://")
			{
				return Err(ConfigError::Validation(format!(
					"Explorer base_url must be an http(s) URL, got '{}'",
					explorer.base_url
				)));
			}
		}

		Ok(())
	}
}

fn validate_backends(
	section: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
) -> Result<(), ConfigError> {
	if primary.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{} primary implementation cannot be empty",
			section
		)));
	}
	if !implementations.contains_key(primary) {
		return Err(ConfigError::Validation(format!(
			"Primary {} '{}' not found in implementations",
			section, primary
		)));
	}
	Ok(())
}

/// Parses a TOML string, resolving environment variables and validating the
/// result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASE: &str = r#"
[ledger]
name = "devnet"

[node]
primary = "evm_alloy"
[node.implementations.evm_alloy]
rpc_url = "http://localhost:8545"

[wallet]
primary = "local"
[wallet.implementations.local]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
rpc_url = "http://localhost:8545"

[token]
address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
symbol = "WKS"
decimals = 18
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("LEDGER_TEST_HOST", "localhost");
		std::env::set_var("LEDGER_TEST_PORT", "8545");

		let input = "url = \"http://${LEDGER_TEST_HOST}:${LEDGER_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "url = \"http://localhost:8545\"");

		std::env::remove_var("LEDGER_TEST_HOST");
		std::env::remove_var("LEDGER_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${LEDGER_MISSING_VAR:-fallback}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"fallback\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${LEDGER_MISSING_VAR}\"";
		let err = resolve_env_vars(input).unwrap_err();
		assert!(err.to_string().contains("LEDGER_MISSING_VAR"));
	}

	#[test]
	fn test_defaults_apply() {
		let config: Config = BASE.parse().unwrap();

		assert_eq!(config.ledger.native_currency(), NativeCurrency::default());
		assert_eq!(config.watch.block_interval(), Duration::from_secs(10));
		assert_eq!(config.confirmation.poll_interval(), Duration::from_secs(3));
		assert_eq!(config.confirmation.max_polls, None);
		assert_eq!(config.workshop.ends_at_block, 168_999);
		assert!(config.explorer.is_none());
	}

	#[test]
	fn test_optional_sections() {
		let content = format!(
			"{}\n[confirmation]\nmax_polls = 40\n\n[explorer]\nname = \"Blockscout\"\nbase_url = \"https://explorer.example.org\"\n",
			BASE
		);
		let config: Config = content.parse().unwrap();

		assert_eq!(config.confirmation.max_polls, Some(40));
		assert_eq!(config.explorer.unwrap().name, "Blockscout");
	}

	#[test]
	fn test_primary_must_be_configured() {
		let content = BASE.replace("primary = \"local\"", "primary = \"hardware\"");
		let err = content.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Primary wallet 'hardware'"));

		let content = BASE.replace("primary = \"evm_alloy\"", "primary = \"\"");
		let err = content.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("node primary implementation cannot be empty"));
	}

	#[test]
	fn test_zero_values_rejected() {
		let content = format!("{}\n[watch]\nbalance_interval_seconds = 0\n", BASE);
		let err = content.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("watch.balance_interval_seconds"));

		let content = format!("{}\n[confirmation]\nmax_polls = 0\n", BASE);
		let err = content.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("max_polls"));

		let content = BASE.replace(
			"0x5FbDB2315678afecb367f032d93F642f64180aa3",
			"0x0000000000000000000000000000000000000000",
		);
		let err = content.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("zero address"));
	}

	#[test]
	fn test_private_key_from_env_default() {
		let content = BASE.replace(
			"\"0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80\"",
			"\"${LEDGER_TEST_KEY:-0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80}\"",
		);
		let config: Config = content.parse().unwrap();
		let key = config.wallet.implementations["local"]
			.get("private_key")
			.and_then(|v| v.as_str())
			.unwrap()
			.to_string();
		assert!(key.starts_with("0xac09"));
	}
}
