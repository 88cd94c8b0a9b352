//! Per-operation state.
//!
//! One `OperationState` exists per logical action. Constructors encode the
//! invariants between status, handle and error so an inconsistent record
//! cannot be built:
//! - Pending, Confirmed and Rejected always carry a handle.
//! - Rejected always carries `RejectedOnChain` with the node's reason.
//! - Failed carries no handle unless confirmation tracking timed out.

use crate::transaction::SubmissionHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A user-initiated write action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
	Mint,
	Transfer,
}

impl ActionKind {
	/// Name of the contract function the action invokes.
	pub fn function_name(&self) -> &'static str {
		match self {
			ActionKind::Mint => "mint",
			ActionKind::Transfer => "transfer",
		}
	}
}

impl fmt::Display for ActionKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.function_name())
	}
}

/// Lifecycle status of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationStatus {
	Idle,
	Submitting,
	Pending,
	Confirmed,
	Rejected,
	Failed,
}

impl OperationStatus {
	/// Submitting and Pending block a new submission for the same action.
	pub fn is_in_flight(&self) -> bool {
		matches!(self, OperationStatus::Submitting | OperationStatus::Pending)
	}

	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			OperationStatus::Confirmed | OperationStatus::Rejected | OperationStatus::Failed
		)
	}
}

/// Error attached to an operation for display.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum OperationError {
	/// Local validation failed; nothing reached the network.
	#[error("Invalid arguments: {0}")]
	InvalidArguments(String),
	#[error("Unknown function: {0}")]
	UnknownFunction(String),
	/// The signer declined the request.
	#[error("User rejected the request")]
	UserRejected,
	#[error("Signing unavailable: {0}")]
	SigningUnavailable(String),
	/// The node refused the transaction before inclusion.
	#[error("Broadcast failed: {0}")]
	BroadcastFailed(String),
	/// The transaction reached the network but did not succeed.
	#[error("{0}")]
	RejectedOnChain(String),
	#[error("No final status after {polls} polls")]
	Timeout { polls: u64 },
	/// The submission was abandoned before the wallet returned a hash.
	#[error("Submission cancelled before a hash was returned")]
	Cancelled,
}

/// The record the orchestrator keeps for one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationState {
	status: OperationStatus,
	handle: Option<SubmissionHandle>,
	error: Option<OperationError>,
}

impl Default for OperationState {
	fn default() -> Self {
		Self::idle()
	}
}

impl OperationState {
	pub fn idle() -> Self {
		Self {
			status: OperationStatus::Idle,
			handle: None,
			error: None,
		}
	}

	pub fn submitting() -> Self {
		Self {
			status: OperationStatus::Submitting,
			handle: None,
			error: None,
		}
	}

	pub fn pending(handle: SubmissionHandle) -> Self {
		Self {
			status: OperationStatus::Pending,
			handle: Some(handle),
			error: None,
		}
	}

	pub fn confirmed(handle: SubmissionHandle) -> Self {
		Self {
			status: OperationStatus::Confirmed,
			handle: Some(handle),
			error: None,
		}
	}

	pub fn rejected(handle: SubmissionHandle, reason: impl Into<String>) -> Self {
		Self {
			status: OperationStatus::Rejected,
			handle: Some(handle),
			error: Some(OperationError::RejectedOnChain(reason.into())),
		}
	}

	/// Failure before a handle existed.
	pub fn failed(error: OperationError) -> Self {
		Self {
			status: OperationStatus::Failed,
			handle: None,
			error: Some(error),
		}
	}

	/// Confirmation tracking gave up; the broadcast itself happened.
	pub fn timed_out(handle: SubmissionHandle, polls: u64) -> Self {
		Self {
			status: OperationStatus::Failed,
			handle: Some(handle),
			error: Some(OperationError::Timeout { polls }),
		}
	}

	pub fn status(&self) -> OperationStatus {
		self.status
	}

	pub fn handle(&self) -> Option<&SubmissionHandle> {
		self.handle.as_ref()
	}

	pub fn error(&self) -> Option<&OperationError> {
		self.error.as_ref()
	}

	/// The node's rejection reason, verbatim.
	pub fn rejection_reason(&self) -> Option<&str> {
		match &self.error {
			Some(OperationError::RejectedOnChain(reason)) => Some(reason),
			_ => None,
		}
	}
}
