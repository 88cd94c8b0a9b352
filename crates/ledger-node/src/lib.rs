//! Node read access for the ledger operations system.
//!
//! This module issues read queries against a remote ledger node. It provides
//! the `NodeInterface` seam implemented by transport backends, and the
//! `NodeReadClient` that turns queries into `ReadResult` snapshots, either
//! once or on a watch interval.

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use ledger_calls::{BuildError, ContractCallBuilder, ViewOutput};
use ledger_types::{
	ConfigSchema, FixedPoint, ImplementationRegistry, NativeCurrency, QueryKind, ReadError,
	ReadQuery, ReadResult, ReadValue, TransactionHash, TransactionStatus,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod watch;

pub use watch::{RefreshTrigger, WatchHandle};

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

/// Errors reported by node backends.
#[derive(Debug, Clone, Error)]
pub enum NodeError {
	/// The requested object does not exist or the node refused the request.
	#[error("Not found: {0}")]
	NotFound(String),
	/// The node could not be reached.
	#[error("Node unreachable: {0}")]
	Unreachable(String),
	/// The node answered with something that could not be interpreted.
	#[error("Malformed response: {0}")]
	Malformed(String),
	/// Backend configuration is invalid.
	#[error("Configuration error: {0}")]
	Config(String),
}

impl From<NodeError> for ReadError {
	fn from(err: NodeError) -> Self {
		match err {
			NodeError::NotFound(msg) => ReadError::NotFound(msg),
			NodeError::Unreachable(msg) => ReadError::NodeUnreachable(msg),
			NodeError::Malformed(msg) => ReadError::MalformedResponse(msg),
			NodeError::Config(msg) => ReadError::NodeUnreachable(msg),
		}
	}
}

/// Trait defining the interface for ledger node backends.
///
/// Wire format and transport are the backend's concern; the rest of the
/// system only sees typed values or a `NodeError`.
#[async_trait]
pub trait NodeInterface: Send + Sync {
	/// Returns the configuration schema for this backend.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Gets the latest block number.
	async fn block_number(&self) -> Result<u64, NodeError>;

	/// Gets the native currency balance of an account, in base units.
	async fn native_balance(&self, account: Address) -> Result<U256, NodeError>;

	/// Executes a view call and returns the raw return data.
	async fn call_view(&self, contract: Address, calldata: Bytes) -> Result<Bytes, NodeError>;

	/// Reports the status of a submitted transaction.
	async fn transaction_status(
		&self,
		hash: &TransactionHash,
	) -> Result<TransactionStatus, NodeError>;
}

/// Type alias for node factory functions.
pub type NodeFactory = fn(&toml::Value) -> Result<Box<dyn NodeInterface>, NodeError>;

/// Registry trait for node implementations.
pub trait NodeRegistry: ImplementationRegistry<Factory = NodeFactory> {}

/// Get all registered node implementations.
pub fn get_all_implementations() -> Vec<(&'static str, NodeFactory)> {
	use implementations::evm::alloy;

	vec![(alloy::Registry::NAME, alloy::Registry::factory())]
}

/// Issues point-in-time and watched reads against a node.
///
/// Never retries: a failed read is returned as a `ReadResult` with its error
/// set, and the caller (or the watch cadence) decides when to try again.
#[derive(Clone)]
pub struct NodeReadClient {
	node: Arc<dyn NodeInterface>,
	calls: Arc<ContractCallBuilder>,
	native: NativeCurrency,
}

impl NodeReadClient {
	pub fn new(
		node: Arc<dyn NodeInterface>,
		calls: Arc<ContractCallBuilder>,
		native: NativeCurrency,
	) -> Self {
		Self {
			node,
			calls,
			native,
		}
	}

	/// One-shot read.
	pub async fn read(&self, query: &ReadQuery) -> ReadResult {
		match self.fetch(query).await {
			Ok(value) => ReadResult::success(value),
			Err(error) => {
				tracing::debug!(query = %query.key(), error = %error, "Read failed");
				ReadResult::failure(error)
			},
		}
	}

	/// Starts a watch that re-reads `query` every `interval`.
	///
	/// The returned handle owns the watch; dropping it cancels it.
	pub fn watch(&self, query: ReadQuery, interval: Duration) -> WatchHandle {
		WatchHandle::spawn(self.clone(), query, interval)
	}

	/// Reports the status of a submitted transaction.
	pub async fn transaction_status(
		&self,
		hash: &TransactionHash,
	) -> Result<TransactionStatus, ReadError> {
		self.node.transaction_status(hash).await.map_err(ReadError::from)
	}

	async fn fetch(&self, query: &ReadQuery) -> Result<ReadValue, ReadError> {
		match &query.kind {
			QueryKind::BlockNumber => Ok(ReadValue::BlockNumber(self.node.block_number().await?)),
			QueryKind::NativeBalance { account } => {
				let raw = self.node.native_balance(*account).await?;
				Ok(ReadValue::Amount(
					FixedPoint::new(raw, self.native.decimals).with_symbol(&self.native.symbol),
				))
			},
			QueryKind::ContractView {
				contract,
				function,
				args,
				decimals,
			} => {
				let calldata = self.calls.encode_view(function, args).map_err(view_error)?;
				let data = self.node.call_view(*contract, calldata).await?;
				let output = self.calls.decode_view(function, &data).map_err(view_error)?;
				Ok(match (output, decimals) {
					(ViewOutput::Uint(raw), Some(decimals)) => {
						ReadValue::Amount(FixedPoint::new(raw, *decimals))
					},
					(ViewOutput::Uint(raw), None) => ReadValue::Uint(raw),
					(ViewOutput::Small(n), _) => ReadValue::Uint(U256::from(n)),
					(ViewOutput::Text(s), _) => ReadValue::Text(s),
				})
			},
		}
	}
}

fn view_error(err: BuildError) -> ReadError {
	match err {
		BuildError::Decode(msg) => ReadError::MalformedResponse(msg),
		other => ReadError::InvalidArguments(other.to_string()),
	}
}

#[cfg(test)]
pub(crate) mod test_support {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;

	/// Scripted node: returns block heights from a queue, optionally slowly.
	#[derive(Default)]
	pub struct ScriptedNode {
		pub blocks: Mutex<Vec<Result<u64, NodeError>>>,
		pub delay: Duration,
		pub calls: AtomicUsize,
		pub in_flight: AtomicUsize,
		pub max_in_flight: AtomicUsize,
		pub view_data: Mutex<Option<Result<Bytes, NodeError>>>,
	}

	impl ScriptedNode {
		pub fn with_blocks(blocks: Vec<Result<u64, NodeError>>) -> Self {
			let mut blocks = blocks;
			blocks.reverse();
			Self {
				blocks: Mutex::new(blocks),
				..Default::default()
			}
		}
	}

	#[async_trait]
	impl NodeInterface for ScriptedNode {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			unimplemented!()
		}

		async fn block_number(&self) -> Result<u64, NodeError> {
			let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
			self.max_in_flight.fetch_max(now, Ordering::SeqCst);
			self.calls.fetch_add(1, Ordering::SeqCst);
			if !self.delay.is_zero() {
				tokio::time::sleep(self.delay).await;
			}
			self.in_flight.fetch_sub(1, Ordering::SeqCst);
			self.blocks
				.lock()
				.unwrap()
				.pop()
				.unwrap_or(Err(NodeError::Unreachable("script exhausted".into())))
		}

		async fn native_balance(&self, _account: Address) -> Result<U256, NodeError> {
			Ok(U256::from(1_500_000_000_000_000_000u128))
		}

		async fn call_view(&self, _contract: Address, _calldata: Bytes) -> Result<Bytes, NodeError> {
			self.view_data
				.lock()
				.unwrap()
				.clone()
				.unwrap_or(Err(NodeError::NotFound("no contract".into())))
		}

		async fn transaction_status(
			&self,
			_hash: &TransactionHash,
		) -> Result<TransactionStatus, NodeError> {
			Ok(TransactionStatus::Pending)
		}
	}

	pub fn client(node: Arc<ScriptedNode>) -> NodeReadClient {
		NodeReadClient::new(
			node,
			Arc::new(ContractCallBuilder::default()),
			NativeCurrency::default(),
		)
	}
}
