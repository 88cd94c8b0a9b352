//! State holder for one action.

use crate::state::OperationStateMachine;
use ledger_types::{ActionKind, OperationState, SubmissionHandle};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// A running confirmation watch and the means to stop it.
pub(crate) struct MonitorTask {
	pub stop: oneshot::Sender<()>,
	pub task: JoinHandle<()>,
}

/// Current state of one action plus its confirmation task.
///
/// Snapshots go out through a watch channel; only the orchestrator writes.
pub struct OperationSlot {
	action: ActionKind,
	state: watch::Sender<OperationState>,
	monitor: Mutex<Option<MonitorTask>>,
}

impl OperationSlot {
	pub(crate) fn new(action: ActionKind) -> Self {
		let (state, _) = watch::channel(OperationState::idle());
		Self {
			action,
			state,
			monitor: Mutex::new(None),
		}
	}

	pub fn action(&self) -> ActionKind {
		self.action
	}

	pub fn snapshot(&self) -> OperationState {
		self.state.borrow().clone()
	}

	pub fn subscribe(&self) -> watch::Receiver<OperationState> {
		self.state.subscribe()
	}

	/// Starts a new attempt unless one is in flight.
	///
	/// Check and write happen under the channel lock, so of two concurrent
	/// callers exactly one succeeds.
	pub(crate) fn try_start(&self, next: OperationState) -> bool {
		self.state.send_if_modified(|current| {
			if current.status().is_in_flight()
				|| !OperationStateMachine::is_valid_transition(current.status(), next.status())
			{
				return false;
			}
			*current = next;
			true
		})
	}

	/// Moves an in-flight attempt forward.
	pub(crate) fn transition(&self, next: OperationState) -> bool {
		let action = self.action;
		self.state.send_if_modified(|current| {
			if !OperationStateMachine::is_valid_transition(current.status(), next.status()) {
				tracing::warn!(
					action = %action,
					from = ?current.status(),
					to = ?next.status(),
					"Ignoring invalid operation transition"
				);
				return false;
			}
			*current = next;
			true
		})
	}

	/// Moves to Pending and installs the confirmation task under the monitor
	/// lock, so `stop_monitor` never runs between the two.
	pub(crate) fn start_tracking(
		&self,
		handle: SubmissionHandle,
		spawn: impl FnOnce() -> MonitorTask,
	) -> bool {
		let mut monitor = self.lock_monitor();
		if !self.transition(OperationState::pending(handle)) {
			return false;
		}
		*monitor = Some(spawn());
		true
	}

	/// Signals the confirmation task to stop and hands back its join handle.
	pub(crate) fn stop_monitor(&self) -> Option<JoinHandle<()>> {
		let monitor = self.lock_monitor().take()?;
		// An error means the task already finished.
		let _ = monitor.stop.send(());
		Some(monitor.task)
	}

	fn lock_monitor(&self) -> MutexGuard<'_, Option<MonitorTask>> {
		self.monitor.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ledger_types::{OperationError, OperationStatus, TransactionHash};

	fn handle() -> SubmissionHandle {
		SubmissionHandle::new(TransactionHash(vec![7; 32]))
	}

	#[test]
	fn test_try_start_refuses_in_flight() {
		let slot = OperationSlot::new(ActionKind::Mint);
		assert!(slot.try_start(OperationState::submitting()));
		assert!(!slot.try_start(OperationState::submitting()));

		assert!(slot.transition(OperationState::pending(handle())));
		assert!(!slot.try_start(OperationState::submitting()));
		assert!(!slot.try_start(OperationState::failed(OperationError::UserRejected)));
		assert_eq!(slot.snapshot().status(), OperationStatus::Pending);
	}

	#[test]
	fn test_settled_slot_restarts() {
		let slot = OperationSlot::new(ActionKind::Transfer);
		slot.try_start(OperationState::submitting());
		slot.transition(OperationState::pending(handle()));
		slot.transition(OperationState::rejected(handle(), "reverted"));

		assert!(slot.try_start(OperationState::submitting()));
		assert_eq!(slot.snapshot(), OperationState::submitting());
	}

	#[tokio::test]
	async fn test_tracking_installs_monitor_with_pending() {
		let slot = OperationSlot::new(ActionKind::Mint);
		slot.try_start(OperationState::submitting());

		let (stop, stop_rx) = oneshot::channel();
		let tracked = slot.start_tracking(handle(), || MonitorTask {
			stop,
			task: tokio::spawn(async move {
				let _ = stop_rx.await;
			}),
		});

		assert!(tracked);
		assert_eq!(slot.snapshot().status(), OperationStatus::Pending);
		let task = slot.stop_monitor().expect("monitor installed with pending");
		task.await.unwrap();
		assert!(slot.stop_monitor().is_none());
	}

	#[test]
	fn test_tracking_requires_submitting() {
		let slot = OperationSlot::new(ActionKind::Transfer);
		let tracked = slot.start_tracking(handle(), || unreachable!("no monitor from idle"));
		assert!(!tracked);
		assert_eq!(slot.snapshot(), OperationState::idle());
	}

	#[test]
	fn test_invalid_transition_is_ignored() {
		let slot = OperationSlot::new(ActionKind::Mint);
		assert!(!slot.transition(OperationState::confirmed(handle())));
		assert_eq!(slot.snapshot(), OperationState::idle());
	}

	#[tokio::test]
	async fn test_subscribers_see_updates() {
		let slot = OperationSlot::new(ActionKind::Mint);
		let mut rx = slot.subscribe();

		slot.try_start(OperationState::submitting());
		rx.changed().await.unwrap();

		assert_eq!(rx.borrow().status(), OperationStatus::Submitting);
	}
}
