//! Builder for assembling a ledger engine from configuration.
//!
//! Backends are created through factory functions keyed by implementation
//! name, so the binary decides which implementations are available.

use crate::engine::{event_bus::EventBus, LedgerEngine};
use crate::monitoring::ConfirmationWatcher;
use crate::orchestrator::OperationOrchestrator;
use crate::read_model::DependentReads;
use ledger_calls::ContractCallBuilder;
use ledger_config::Config;
use ledger_node::{NodeError, NodeInterface, NodeReadClient};
use ledger_wallet::{WalletError, WalletInterface, WriteSubmitter};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions for each backend kind, keyed by implementation name.
pub struct LedgerFactories<NF, WF> {
	pub node_factories: HashMap<String, NF>,
	pub wallet_factories: HashMap<String, WF>,
}

pub struct LedgerBuilder {
	config: Config,
}

impl LedgerBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Creates every configured backend that has a factory and wires the
	/// primary ones into an engine.
	pub async fn build<NF, WF>(
		self,
		factories: LedgerFactories<NF, WF>,
	) -> Result<LedgerEngine, BuilderError>
	where
		NF: Fn(&toml::Value) -> Result<Box<dyn NodeInterface>, NodeError>,
		WF: Fn(&toml::Value) -> Result<Box<dyn WalletInterface>, WalletError>,
	{
		let mut nodes = create_all(
			"node",
			&self.config.node.primary,
			&self.config.node.implementations,
			&factories.node_factories,
		)?;
		let node = nodes.remove(&self.config.node.primary).ok_or_else(|| {
			BuilderError::MissingComponent(format!(
				"Primary node '{}' has no registered implementation",
				self.config.node.primary
			))
		})?;

		let mut wallets = create_all(
			"wallet",
			&self.config.wallet.primary,
			&self.config.wallet.implementations,
			&factories.wallet_factories,
		)?;
		let wallet = wallets.remove(&self.config.wallet.primary).ok_or_else(|| {
			BuilderError::MissingComponent(format!(
				"Primary wallet '{}' has no registered implementation",
				self.config.wallet.primary
			))
		})?;

		let submitter = Arc::new(WriteSubmitter::new(wallet));
		let account = submitter.account().await.ok_or_else(|| {
			tracing::error!(component = "wallet", "No connected account");
			BuilderError::Config("Wallet has no connected account".into())
		})?;

		let calls = Arc::new(ContractCallBuilder::default());
		let reads = NodeReadClient::new(
			Arc::from(node),
			calls.clone(),
			self.config.ledger.native_currency(),
		);
		let watcher = Arc::new(ConfirmationWatcher::new(
			reads.clone(),
			self.config.confirmation.poll_interval(),
			self.config.confirmation.max_polls,
		));

		let event_bus = EventBus::new(1000);
		let orchestrator = OperationOrchestrator::new(
			calls,
			submitter,
			watcher,
			event_bus.clone(),
			DependentReads::new(&self.config.token, account),
		);

		Ok(LedgerEngine::new(
			self.config,
			account,
			reads,
			orchestrator,
			event_bus,
		))
	}
}

/// Runs the factory of every configured implementation.
fn create_all<F, T, E>(
	component: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
	factories: &HashMap<String, F>,
) -> Result<HashMap<String, T>, BuilderError>
where
	F: Fn(&toml::Value) -> Result<T, E>,
	E: std::fmt::Display,
{
	let mut created = HashMap::new();

	for (name, config) in implementations {
		let Some(factory) = factories.get(name) else {
			tracing::warn!(component, implementation = %name, "No factory registered");
			continue;
		};

		match factory(config) {
			Ok(implementation) => {
				created.insert(name.clone(), implementation);
				let is_primary = primary == name;
				tracing::info!(component, implementation = %name, enabled = %is_primary, "Loaded");
			},
			Err(e) => {
				tracing::error!(
					component,
					implementation = %name,
					error = %e,
					"Failed to create implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create {} implementation '{}': {}",
					component, name, e
				)));
			},
		}
	}

	if created.is_empty() {
		return Err(BuilderError::Config(format!(
			"No valid {} implementations available",
			component
		)));
	}

	Ok(created)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{MockWallet, StatusNode};
	use alloy_primitives::Address;
	use ledger_config::builders::config::ConfigBuilder;
	use ledger_types::{ReadValue, U256};

	type NodeFactoryFn = fn(&toml::Value) -> Result<Box<dyn NodeInterface>, NodeError>;
	type WalletFactoryFn = fn(&toml::Value) -> Result<Box<dyn WalletInterface>, WalletError>;

	fn scripted_node(_: &toml::Value) -> Result<Box<dyn NodeInterface>, NodeError> {
		let node = StatusNode::default();
		*node.block.lock().unwrap() = 168_998;
		Ok(Box::new(node))
	}

	fn connected_wallet(_: &toml::Value) -> Result<Box<dyn WalletInterface>, WalletError> {
		let mut wallet = MockWallet::new();
		wallet
			.expect_connect()
			.returning(|| Some(Address::repeat_byte(0xaa)));
		Ok(Box::new(wallet))
	}

	fn disconnected_wallet(_: &toml::Value) -> Result<Box<dyn WalletInterface>, WalletError> {
		let mut wallet = MockWallet::new();
		wallet.expect_connect().returning(|| None);
		Ok(Box::new(wallet))
	}

	fn config() -> Config {
		let mut config = ConfigBuilder::new().build();
		config
			.node
			.implementations
			.insert("scripted".into(), toml::Value::Table(Default::default()));
		config
			.wallet
			.implementations
			.insert("mock".into(), toml::Value::Table(Default::default()));
		config
	}

	fn factories(wallet: WalletFactoryFn) -> LedgerFactories<NodeFactoryFn, WalletFactoryFn> {
		LedgerFactories {
			node_factories: HashMap::from([("scripted".to_string(), scripted_node as NodeFactoryFn)]),
			wallet_factories: HashMap::from([("mock".to_string(), wallet)]),
		}
	}

	#[tokio::test]
	async fn test_build_wires_primary_backends() {
		let engine = LedgerBuilder::new(config())
			.build(factories(connected_wallet))
			.await
			.unwrap();

		assert_eq!(engine.account(), Address::repeat_byte(0xaa));
		assert_eq!(engine.block().await.block_number(), Some(168_998));
		assert_eq!(
			engine.workshop_phase().await,
			Some(crate::read_model::WorkshopPhase::Live)
		);
		assert_eq!(
			engine.token_balance().await.value,
			Some(ReadValue::Amount(ledger_types::FixedPoint::new(U256::from(7u64), 18)))
		);
	}

	#[tokio::test]
	async fn test_build_requires_connected_account() {
		let result = LedgerBuilder::new(config())
			.build(factories(disconnected_wallet))
			.await;
		assert!(matches!(result, Err(BuilderError::Config(_))));
	}

	#[tokio::test]
	async fn test_build_requires_primary_factory() {
		let mut config = config();
		config
			.node
			.implementations
			.insert("other".into(), toml::Value::Table(Default::default()));
		config.node.primary = "other".into();

		let result = LedgerBuilder::new(config)
			.build(factories(connected_wallet))
			.await;
		assert!(matches!(result, Err(BuilderError::MissingComponent(_))));
	}
}
