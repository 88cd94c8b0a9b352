//! In-test fakes for the node and wallet seams.

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use ledger_calls::ContractCallBuilder;
use ledger_node::{NodeError, NodeInterface, NodeReadClient};
use ledger_types::{
	CallPayload, ConfigSchema, NativeCurrency, TransactionHash, TransactionStatus,
	ValidationError,
};
use ledger_wallet::{WalletError, WalletInterface};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct NoSchema;

impl ConfigSchema for NoSchema {
	fn validate(&self, _config: &toml::Value) -> Result<(), ValidationError> {
		Ok(())
	}
}

/// Node whose status answers are played back from a script.
///
/// Once the script runs out the last answer repeats; an empty script always
/// reports Pending.
#[derive(Default)]
pub struct StatusNode {
	statuses: Mutex<VecDeque<Result<TransactionStatus, NodeError>>>,
	last: Mutex<Option<Result<TransactionStatus, NodeError>>>,
	pub block: Mutex<u64>,
	pub status_calls: AtomicUsize,
	pub view_calls: AtomicUsize,
}

impl StatusNode {
	pub fn scripted(statuses: Vec<Result<TransactionStatus, NodeError>>) -> Arc<Self> {
		Arc::new(Self {
			statuses: Mutex::new(statuses.into()),
			..Default::default()
		})
	}

	pub fn polls(&self) -> usize {
		self.status_calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl NodeInterface for StatusNode {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(NoSchema)
	}

	async fn block_number(&self) -> Result<u64, NodeError> {
		Ok(*self.block.lock().unwrap())
	}

	async fn native_balance(&self, _account: Address) -> Result<U256, NodeError> {
		Ok(U256::from(1_500_000_000_000_000_000u64))
	}

	async fn call_view(&self, _contract: Address, _calldata: Bytes) -> Result<Bytes, NodeError> {
		self.view_calls.fetch_add(1, Ordering::SeqCst);
		Ok(Bytes::from(U256::from(7u64).to_be_bytes::<32>().to_vec()))
	}

	async fn transaction_status(
		&self,
		_hash: &TransactionHash,
	) -> Result<TransactionStatus, NodeError> {
		self.status_calls.fetch_add(1, Ordering::SeqCst);
		let next = self.statuses.lock().unwrap().pop_front();
		let mut last = self.last.lock().unwrap();
		match next {
			Some(answer) => {
				*last = Some(answer.clone());
				answer
			},
			None => last.clone().unwrap_or(Ok(TransactionStatus::Pending)),
		}
	}
}

pub fn reads(node: Arc<StatusNode>) -> NodeReadClient {
	NodeReadClient::new(
		node,
		Arc::new(ContractCallBuilder::default()),
		NativeCurrency::default(),
	)
}

mockall::mock! {
	pub Wallet {}

	#[async_trait]
	impl WalletInterface for Wallet {
		fn config_schema(&self) -> Box<dyn ConfigSchema>;
		async fn connect(&self) -> Option<Address>;
		async fn sign_and_broadcast(
			&self,
			payloads: &[CallPayload],
		) -> Result<TransactionHash, WalletError>;
	}
}

/// Wallet that holds every signing request until released.
#[derive(Clone)]
pub struct GatedWallet {
	pub gate: Arc<tokio::sync::Semaphore>,
	pub calls: Arc<AtomicUsize>,
}

impl GatedWallet {
	pub fn new() -> Self {
		Self {
			gate: Arc::new(tokio::sync::Semaphore::new(0)),
			calls: Arc::new(AtomicUsize::new(0)),
		}
	}

	/// Lets one held signing request through.
	pub fn release(&self) {
		self.gate.add_permits(1);
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl WalletInterface for GatedWallet {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(NoSchema)
	}

	async fn connect(&self) -> Option<Address> {
		Some(Address::repeat_byte(0xaa))
	}

	async fn sign_and_broadcast(
		&self,
		_payloads: &[CallPayload],
	) -> Result<TransactionHash, WalletError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		let permit = self
			.gate
			.acquire()
			.await
			.map_err(|_| WalletError::SigningUnavailable("closed".into()))?;
		permit.forget();
		Ok(TransactionHash(vec![0x99; 32]))
	}
}
