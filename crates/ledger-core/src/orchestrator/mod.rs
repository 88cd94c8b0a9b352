//! Per-action operation lifecycle.
//!
//! The orchestrator owns one `OperationSlot` per action and drives it through
//! Idle -> Submitting -> Pending -> Confirmed | Rejected | Failed. While an
//! action is Submitting or Pending a new submission for it is refused. A
//! confirmation refreshes the reads that depend on the action.

pub mod phase;
pub mod slot;

pub use phase::phase_label;
pub use slot::OperationSlot;

use crate::engine::event_bus::EventBus;
use crate::monitoring::{ConfirmationOutcome, ConfirmationWatcher};
use crate::read_model::DependentReads;
use alloy_primitives::Address;
use ledger_calls::{BuildError, CallMemo, ContractCallBuilder};
use ledger_node::RefreshTrigger;
use ledger_types::{
	truncate_id, ActionKind, CallArg, CallPayload, LedgerEvent, OperationError, OperationEvent,
	OperationState, ReadEvent, SubmissionHandle,
};
use ledger_wallet::WriteSubmitter;
use slot::MonitorTask;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{oneshot, watch};

/// Result of asking for a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
	/// Broadcast; confirmation tracking has started.
	Submitted(SubmissionHandle),
	/// Nothing was broadcast.
	Failed(OperationError),
	/// An attempt for this action is already in flight; nothing changed.
	Refused,
}

/// A write the user asked for, before it is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteIntent {
	pub contract: Address,
	pub args: Vec<CallArg>,
}

impl WriteIntent {
	pub fn new(contract: Address, args: Vec<CallArg>) -> Self {
		Self { contract, args }
	}
}

#[derive(Clone)]
pub struct OperationOrchestrator {
	calls: Arc<ContractCallBuilder>,
	submitter: Arc<WriteSubmitter>,
	watcher: Arc<ConfirmationWatcher>,
	event_bus: EventBus,
	dependents: Arc<DependentReads>,
	slots: Arc<HashMap<ActionKind, Arc<OperationSlot>>>,
	triggers: Arc<Mutex<Vec<RefreshTrigger>>>,
	memos: Arc<Mutex<HashMap<ActionKind, CallMemo>>>,
}

impl OperationOrchestrator {
	pub fn new(
		calls: Arc<ContractCallBuilder>,
		submitter: Arc<WriteSubmitter>,
		watcher: Arc<ConfirmationWatcher>,
		event_bus: EventBus,
		dependents: DependentReads,
	) -> Self {
		let slots = [ActionKind::Mint, ActionKind::Transfer]
			.into_iter()
			.map(|action| (action, Arc::new(OperationSlot::new(action))))
			.collect();

		Self {
			calls,
			submitter,
			watcher,
			event_bus,
			dependents: Arc::new(dependents),
			slots: Arc::new(slots),
			triggers: Arc::new(Mutex::new(Vec::new())),
			memos: Arc::new(Mutex::new(HashMap::new())),
		}
	}

	pub fn slot(&self, action: ActionKind) -> &OperationSlot {
		&self.slots[&action]
	}

	pub fn state(&self, action: ActionKind) -> OperationState {
		self.slot(action).snapshot()
	}

	pub fn subscribe(&self, action: ActionKind) -> watch::Receiver<OperationState> {
		self.slot(action).subscribe()
	}

	pub fn phase_label(&self, action: ActionKind) -> String {
		phase_label(action, &self.state(action))
	}

	pub fn dependents(&self) -> &DependentReads {
		&self.dependents
	}

	/// Registers a watch to refresh when a dependent action confirms.
	///
	/// Triggers of watches that have since been cancelled are dropped.
	pub fn register_refresh(&self, trigger: RefreshTrigger) {
		let mut triggers = self.lock_triggers();
		triggers.retain(|t| !t.is_closed());
		triggers.push(trigger);
	}

	/// Builds the payload for `intent`, reusing the previous one for `action`
	/// while contract, function and arguments are unchanged.
	///
	/// The flag reports whether the payload had to be rebuilt.
	pub fn prepare(
		&self,
		action: ActionKind,
		intent: &WriteIntent,
	) -> Result<(CallPayload, bool), BuildError> {
		let mut memos = self.memos.lock().unwrap_or_else(PoisonError::into_inner);
		memos.entry(action).or_default().get_or_build(
			&self.calls,
			intent.contract,
			action.function_name(),
			&intent.args,
		)
	}

	/// Builds the call for `intent`, then submits it.
	///
	/// A build failure fails the action without reaching the wallet.
	pub async fn submit_intent(&self, action: ActionKind, intent: &WriteIntent) -> SubmitOutcome {
		match self.prepare(action, intent) {
			Ok((payload, rebuilt)) => {
				tracing::debug!(action = %action, rebuilt, "Prepared call payload");
				self.submit(action, vec![payload]).await
			},
			Err(e) => {
				let error = OperationError::from(e);
				if !self
					.slot(action)
					.try_start(OperationState::failed(error.clone()))
				{
					return self.refuse(action);
				}
				tracing::warn!(action = %action, error = %error, "Refused to build call");
				self.publish(OperationEvent::Failed {
					action,
					error: error.clone(),
				});
				SubmitOutcome::Failed(error)
			},
		}
	}

	/// Submits pre-built payloads for `action` as one transaction.
	pub async fn submit(&self, action: ActionKind, payloads: Vec<CallPayload>) -> SubmitOutcome {
		let slot = self.slots[&action].clone();
		if !slot.try_start(OperationState::submitting()) {
			return self.refuse(action);
		}
		self.publish(OperationEvent::Submitting { action });

		let guard = SubmittingGuard {
			slot: slot.clone(),
			event_bus: self.event_bus.clone(),
			armed: true,
		};
		let submitted = self.submitter.submit(&payloads).await;
		guard.disarm();

		let handle = match submitted {
			Ok(handle) => handle,
			Err(e) => {
				let error = OperationError::from(e);
				tracing::warn!(action = %action, error = %error, "Submission failed");
				slot.transition(OperationState::failed(error.clone()));
				self.publish(OperationEvent::Failed {
					action,
					error: error.clone(),
				});
				return SubmitOutcome::Failed(error);
			},
		};

		let orchestrator = self.clone();
		let tracked = handle.clone();
		// Submitted goes out before the monitor can publish a final status.
		slot.start_tracking(handle.clone(), move || {
			orchestrator.publish(OperationEvent::Submitted {
				action,
				handle: tracked.clone(),
			});
			let (stop, stop_rx) = oneshot::channel();
			let task = tokio::spawn(async move {
				let outcome = orchestrator.watcher.watch(&tracked, stop_rx).await;
				orchestrator.settle(action, tracked, outcome);
			});
			MonitorTask { stop, task }
		});

		SubmitOutcome::Submitted(handle)
	}

	/// Stops confirmation tracking for `action`; its state stays Pending.
	pub async fn cancel_confirmation(&self, action: ActionKind) {
		if let Some(task) = self.slot(action).stop_monitor() {
			let _ = task.await;
		}
	}

	/// Stops every confirmation watch.
	pub async fn shutdown(&self) {
		for action in [ActionKind::Mint, ActionKind::Transfer] {
			self.cancel_confirmation(action).await;
		}
	}

	fn settle(&self, action: ActionKind, handle: SubmissionHandle, outcome: ConfirmationOutcome) {
		let slot = self.slot(action);
		let tx_hash = handle.tx_hash.clone();

		match outcome {
			ConfirmationOutcome::Confirmed { block_number } => {
				if slot.transition(OperationState::confirmed(handle)) {
					self.publish(OperationEvent::Confirmed {
						action,
						tx_hash,
						block_number,
					});
					self.refresh_dependents(action);
				}
			},
			ConfirmationOutcome::Rejected { reason } => {
				if slot.transition(OperationState::rejected(handle, reason.clone())) {
					self.publish(OperationEvent::Rejected {
						action,
						tx_hash,
						reason,
					});
				}
			},
			ConfirmationOutcome::TimedOut { polls } => {
				if slot.transition(OperationState::timed_out(handle, polls)) {
					self.publish(OperationEvent::Failed {
						action,
						error: OperationError::Timeout { polls },
					});
				}
			},
			ConfirmationOutcome::Cancelled => {
				tracing::info!(
					action = %action,
					tx_hash = %truncate_id(&tx_hash.to_hex()),
					"Stopped confirmation tracking"
				);
			},
		}
	}

	fn refresh_dependents(&self, action: ActionKind) {
		let mut triggers = self.lock_triggers();
		triggers.retain(|t| !t.is_closed());

		for query in self.dependents.for_action(action) {
			let key = query.key();
			for trigger in triggers.iter().filter(|t| t.query_key() == key) {
				trigger.fire();
			}
			tracing::debug!(action = %action, query = %key, "Refresh requested");
			self.event_bus
				.publish(LedgerEvent::Read(ReadEvent::RefreshRequested {
					action,
					query: key,
				}))
				.ok();
		}
	}

	fn refuse(&self, action: ActionKind) -> SubmitOutcome {
		tracing::info!(action = %action, "Operation already in flight");
		self.publish(OperationEvent::Refused { action });
		SubmitOutcome::Refused
	}

	fn publish(&self, event: OperationEvent) {
		self.event_bus.publish(LedgerEvent::Operation(event)).ok();
	}

	fn lock_triggers(&self) -> std::sync::MutexGuard<'_, Vec<RefreshTrigger>> {
		self.triggers.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

/// Fails an attempt whose submission future is dropped while the wallet is
/// still working, so the action does not stay Submitting forever.
struct SubmittingGuard {
	slot: Arc<OperationSlot>,
	event_bus: EventBus,
	armed: bool,
}

impl SubmittingGuard {
	fn disarm(mut self) {
		self.armed = false;
	}
}

impl Drop for SubmittingGuard {
	fn drop(&mut self) {
		if !self.armed {
			return;
		}
		let action = self.slot.action();
		let error = OperationError::Cancelled;
		if self.slot.transition(OperationState::failed(error.clone())) {
			tracing::warn!(action = %action, "Submission dropped before the wallet answered");
			self.event_bus
				.publish(LedgerEvent::Operation(OperationEvent::Failed { action, error }))
				.ok();
		}
	}
}
