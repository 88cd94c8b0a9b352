//! Confirmation polling for submitted transactions.
//!
//! Polls the node for a handle's status at a fixed interval until the
//! transaction is confirmed or rejected, the watch is stopped, or the
//! optional poll budget runs out.

use ledger_node::NodeReadClient;
use ledger_types::{truncate_id, SubmissionHandle, TransactionStatus};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::instrument;

/// How a confirmation watch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
	Confirmed { block_number: u64 },
	/// Included but not successful; `reason` is the node's text, verbatim.
	Rejected { reason: String },
	/// `max_polls` statuses were read without a final answer.
	TimedOut { polls: u64 },
	/// Stopped by the owner; the transaction is still pending as far as we know.
	Cancelled,
}

pub struct ConfirmationWatcher {
	reads: NodeReadClient,
	poll_interval: Duration,
	max_polls: Option<u64>,
}

impl ConfirmationWatcher {
	pub fn new(reads: NodeReadClient, poll_interval: Duration, max_polls: Option<u64>) -> Self {
		Self {
			reads,
			poll_interval,
			max_polls,
		}
	}

	pub fn poll_interval(&self) -> Duration {
		self.poll_interval
	}

	/// Polls until a final status is observed or `stop` fires.
	///
	/// A poll in flight when `stop` fires is abandoned and its answer dropped.
	/// Poll errors are transient: they are logged and the next tick retries.
	#[instrument(skip_all, fields(tx_hash = %truncate_id(&handle.tx_hash.to_hex())))]
	pub async fn watch(
		&self,
		handle: &SubmissionHandle,
		mut stop: oneshot::Receiver<()>,
	) -> ConfirmationOutcome {
		let mut polls: u64 = 0;

		loop {
			let status = tokio::select! {
				_ = &mut stop => return ConfirmationOutcome::Cancelled,
				status = self.reads.transaction_status(&handle.tx_hash) => status,
			};
			polls += 1;

			match status {
				Ok(TransactionStatus::Confirmed { block_number }) => {
					tracing::info!(block_number, polls, "Confirmed");
					return ConfirmationOutcome::Confirmed { block_number };
				},
				Ok(TransactionStatus::Rejected { reason }) => {
					tracing::info!(reason = %reason, polls, "Rejected");
					return ConfirmationOutcome::Rejected { reason };
				},
				Ok(TransactionStatus::Pending) => {
					tracing::debug!(polls, "Waiting for transaction to be mined");
				},
				Err(e) => {
					tracing::debug!(polls, error = %e, "Checking transaction status");
				},
			}

			if self.max_polls.is_some_and(|max| polls >= max) {
				tracing::warn!(polls, "Confirmation polling gave up");
				return ConfirmationOutcome::TimedOut { polls };
			}

			tokio::select! {
				_ = &mut stop => return ConfirmationOutcome::Cancelled,
				_ = tokio::time::sleep(self.poll_interval) => {},
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{reads, StatusNode};
	use ledger_node::NodeError;
	use ledger_types::TransactionHash;

	fn handle() -> SubmissionHandle {
		SubmissionHandle::new(TransactionHash(vec![0x42; 32]))
	}

	fn watcher(node: std::sync::Arc<StatusNode>, max_polls: Option<u64>) -> ConfirmationWatcher {
		ConfirmationWatcher::new(reads(node), Duration::from_secs(3), max_polls)
	}

	#[tokio::test(start_paused = true)]
	async fn test_pending_until_confirmed() {
		let node = StatusNode::scripted(vec![
			Ok(TransactionStatus::Pending),
			Ok(TransactionStatus::Pending),
			Ok(TransactionStatus::Confirmed { block_number: 12 }),
		]);
		let (_stop, rx) = oneshot::channel();

		let outcome = watcher(node.clone(), None).watch(&handle(), rx).await;

		assert_eq!(outcome, ConfirmationOutcome::Confirmed { block_number: 12 });
		assert_eq!(node.polls(), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn test_rejection_reason_is_verbatim() {
		let node = StatusNode::scripted(vec![Ok(TransactionStatus::Rejected {
			reason: "insufficient balance".into(),
		})]);
		let (_stop, rx) = oneshot::channel();

		let outcome = watcher(node, None).watch(&handle(), rx).await;

		assert_eq!(
			outcome,
			ConfirmationOutcome::Rejected {
				reason: "insufficient balance".into()
			}
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_transient_errors_keep_polling() {
		let node = StatusNode::scripted(vec![
			Err(NodeError::Unreachable("connection refused".into())),
			Err(NodeError::Unreachable("connection refused".into())),
			Ok(TransactionStatus::Confirmed { block_number: 3 }),
		]);
		let (_stop, rx) = oneshot::channel();

		let outcome = watcher(node.clone(), None).watch(&handle(), rx).await;

		assert_eq!(outcome, ConfirmationOutcome::Confirmed { block_number: 3 });
		assert_eq!(node.polls(), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn test_poll_budget_times_out() {
		let node = StatusNode::scripted(vec![]);
		let (_stop, rx) = oneshot::channel();

		let outcome = watcher(node.clone(), Some(4)).watch(&handle(), rx).await;

		assert_eq!(outcome, ConfirmationOutcome::TimedOut { polls: 4 });
		assert_eq!(node.polls(), 4);
	}

	#[tokio::test(start_paused = true)]
	async fn test_stop_ends_watch() {
		let node = StatusNode::scripted(vec![]);
		let (stop, rx) = oneshot::channel();
		let watcher = watcher(node.clone(), None);

		let task = tokio::spawn(async move { watcher.watch(&handle(), rx).await });
		tokio::time::sleep(Duration::from_secs(10)).await;
		stop.send(()).unwrap();

		assert_eq!(task.await.unwrap(), ConfirmationOutcome::Cancelled);
		// Polls at t = 0, 3, 6 and 9 seconds
		assert_eq!(node.polls(), 4);
	}
}
