//! Ledger console engine.
//!
//! Bundles the read client, the operation orchestrator and the event bus
//! behind one handle, with the queries and intents the console uses already
//! wired to configuration.

pub mod event_bus;

use crate::orchestrator::{OperationOrchestrator, SubmitOutcome, WriteIntent};
use crate::read_model::{WorkshopPhase, WorkshopWindow};
use alloy_primitives::{Address, U256};
use event_bus::EventBus;
use ledger_config::Config;
use ledger_node::{NodeReadClient, WatchHandle};
use ledger_types::{
	ActionKind, CallArg, OperationState, ReadQuery, ReadResult, SubmissionHandle,
};
use thiserror::Error;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Service error: {0}")]
	Service(String),
}

pub struct LedgerEngine {
	config: Config,
	account: Address,
	reads: NodeReadClient,
	orchestrator: OperationOrchestrator,
	event_bus: EventBus,
	workshop: WorkshopWindow,
}

impl LedgerEngine {
	pub fn new(
		config: Config,
		account: Address,
		reads: NodeReadClient,
		orchestrator: OperationOrchestrator,
		event_bus: EventBus,
	) -> Self {
		let workshop = WorkshopWindow::new(config.workshop.ends_at_block);
		Self {
			config,
			account,
			reads,
			orchestrator,
			event_bus,
			workshop,
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	/// The connected account.
	pub fn account(&self) -> Address {
		self.account
	}

	pub fn reads(&self) -> &NodeReadClient {
		&self.reads
	}

	pub fn orchestrator(&self) -> &OperationOrchestrator {
		&self.orchestrator
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	pub fn workshop(&self) -> WorkshopWindow {
		self.workshop
	}

	pub fn native_balance_query(&self) -> ReadQuery {
		ReadQuery::native_balance(self.account)
	}

	pub async fn block(&self) -> ReadResult {
		self.reads.read(&ReadQuery::block_number()).await
	}

	pub async fn workshop_phase(&self) -> Option<WorkshopPhase> {
		self.workshop.classify_result(&self.block().await)
	}

	pub async fn native_balance(&self) -> ReadResult {
		self.reads.read(&self.native_balance_query()).await
	}

	pub async fn token_balance(&self) -> ReadResult {
		let query = self.orchestrator.dependents().token_balance().clone();
		self.reads.read(&query).await
	}

	pub async fn total_supply(&self) -> ReadResult {
		let query = self.orchestrator.dependents().total_supply().clone();
		self.reads.read(&query).await
	}

	pub fn watch_block(&self) -> WatchHandle {
		self.reads.watch(
			ReadQuery::block_number(),
			self.config.watch.block_interval(),
		)
	}

	pub fn watch_native_balance(&self) -> WatchHandle {
		self.reads.watch(
			self.native_balance_query(),
			self.config.watch.balance_interval(),
		)
	}

	/// Watches the account's token balance; refreshed after mint and transfer.
	pub fn watch_token_balance(&self) -> WatchHandle {
		let query = self.orchestrator.dependents().token_balance().clone();
		self.watch_dependent(query, self.config.watch.balance_interval())
	}

	/// Watches the token supply; refreshed after mint.
	pub fn watch_total_supply(&self) -> WatchHandle {
		let query = self.orchestrator.dependents().total_supply().clone();
		self.watch_dependent(query, self.config.watch.supply_interval())
	}

	fn watch_dependent(&self, query: ReadQuery, interval: std::time::Duration) -> WatchHandle {
		let handle = self.reads.watch(query, interval);
		self.orchestrator.register_refresh(handle.refresh_trigger());
		handle
	}

	/// Mints `amount` base units to the connected account.
	pub async fn mint(&self, amount: U256) -> SubmitOutcome {
		let intent = WriteIntent::new(
			self.config.token.address,
			vec![CallArg::Address(self.account), CallArg::Uint(amount)],
		);
		self.orchestrator.submit_intent(ActionKind::Mint, &intent).await
	}

	/// Transfers `amount` base units from the connected account to `to`.
	pub async fn transfer(&self, to: Address, amount: U256) -> SubmitOutcome {
		let intent = WriteIntent::new(
			self.config.token.address,
			vec![CallArg::Address(to), CallArg::Uint(amount)],
		);
		self.orchestrator
			.submit_intent(ActionKind::Transfer, &intent)
			.await
	}

	/// Waits until `action` leaves Submitting and Pending.
	pub async fn wait_settled(&self, action: ActionKind) -> Result<OperationState, EngineError> {
		let mut rx = self.orchestrator.subscribe(action);
		loop {
			let state = rx.borrow_and_update().clone();
			if !state.status().is_in_flight() {
				return Ok(state);
			}
			rx.changed()
				.await
				.map_err(|_| EngineError::Service("operation state channel closed".into()))?;
		}
	}

	/// Explorer link for a submission, when an explorer is configured.
	pub fn transaction_url(&self, handle: &SubmissionHandle) -> Option<String> {
		self.config
			.explorer
			.as_ref()
			.map(|explorer| explorer.transaction_url(&handle.tx_hash))
	}

	pub async fn shutdown(&self) {
		self.orchestrator.shutdown().await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::monitoring::ConfirmationWatcher;
	use crate::read_model::DependentReads;
	use crate::test_support::{reads, MockWallet, StatusNode};
	use ledger_calls::ContractCallBuilder;
	use ledger_config::builders::config::ConfigBuilder;
	use ledger_types::{
		CallPayload, ExplorerConfig, OperationStatus, TransactionHash, TransactionStatus,
	};
	use ledger_wallet::WriteSubmitter;
	use std::sync::{Arc, Mutex};
	use std::time::Duration;

	const ACCOUNT: Address = Address::repeat_byte(0xaa);

	fn engine(node: Arc<StatusNode>, wallet: MockWallet, ends_at_block: u64) -> LedgerEngine {
		let config = ConfigBuilder::new()
			.ends_at_block(ends_at_block)
			.explorer(Some(ExplorerConfig {
				name: "Explorer".into(),
				base_url: "https://explorer.example.org".into(),
			}))
			.build();
		let client = reads(node);
		let bus = EventBus::new(16);
		let orchestrator = OperationOrchestrator::new(
			Arc::new(ContractCallBuilder::default()),
			Arc::new(WriteSubmitter::new(Box::new(wallet))),
			Arc::new(ConfirmationWatcher::new(
				client.clone(),
				Duration::from_secs(1),
				None,
			)),
			bus.clone(),
			DependentReads::new(&config.token, ACCOUNT),
		);
		LedgerEngine::new(config, ACCOUNT, client, orchestrator, bus)
	}

	#[tokio::test]
	async fn test_workshop_phase_follows_block_height() {
		let node = StatusNode::scripted(vec![]);
		*node.block.lock().unwrap() = 168_998;
		let live = engine(node.clone(), MockWallet::new(), 168_999);
		assert_eq!(live.workshop_phase().await, Some(WorkshopPhase::Live));

		*node.block.lock().unwrap() = 169_000;
		assert_eq!(live.workshop_phase().await, Some(WorkshopPhase::Ended));
	}

	#[tokio::test(start_paused = true)]
	async fn test_mint_targets_connected_account() {
		let node = StatusNode::scripted(vec![Ok(TransactionStatus::Confirmed { block_number: 5 })]);
		let sent: Arc<Mutex<Vec<CallPayload>>> = Arc::default();
		let mut wallet = MockWallet::new();
		let recorded = sent.clone();
		wallet.expect_sign_and_broadcast().times(1).returning(move |payloads| {
			recorded.lock().unwrap().extend_from_slice(payloads);
			Ok(TransactionHash(vec![0xcd; 32]))
		});
		let engine = engine(node, wallet, 168_999);

		let outcome = engine.mint(U256::from(10u64)).await;
		let SubmitOutcome::Submitted(handle) = outcome else {
			panic!("mint was not submitted");
		};
		let state = engine.wait_settled(ActionKind::Mint).await.unwrap();

		assert_eq!(state.status(), OperationStatus::Confirmed);
		let sent = sent.lock().unwrap();
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].function, "mint");
		assert_eq!(sent[0].args[0], CallArg::Address(ACCOUNT));
		assert_eq!(
			engine.transaction_url(&handle).unwrap(),
			format!("https://explorer.example.org/tx/0x{}", "cd".repeat(32))
		);
	}

	#[tokio::test]
	async fn test_transfer_to_zero_address_is_invalid() {
		let node = StatusNode::scripted(vec![]);
		let mut wallet = MockWallet::new();
		wallet.expect_sign_and_broadcast().times(0);
		let engine = engine(node, wallet, 168_999);

		let outcome = engine.transfer(Address::ZERO, U256::from(1u64)).await;

		assert!(matches!(outcome, SubmitOutcome::Failed(_)));
		assert_eq!(
			engine.wait_settled(ActionKind::Transfer).await.unwrap().status(),
			OperationStatus::Failed
		);
	}
}
