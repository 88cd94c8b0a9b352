//! Event types for inter-service communication.
//!
//! The orchestrator publishes operation transitions and refresh requests on the
//! event bus so the presentation layer and other listeners can react without
//! holding a reference to the orchestrator.

use crate::{ActionKind, OperationError, SubmissionHandle, TransactionHash};
use serde::{Deserialize, Serialize};

/// Main event type encompassing all ledger events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LedgerEvent {
	/// Events from the operation orchestrator.
	Operation(OperationEvent),
	/// Events asking read watches to refetch.
	Read(ReadEvent),
}

/// Events describing one operation's lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OperationEvent {
	/// A signing request has been handed to the wallet.
	Submitting { action: ActionKind },
	/// The wallet returned a hash; confirmation polling has started.
	Submitted {
		action: ActionKind,
		handle: SubmissionHandle,
	},
	/// The transaction succeeded on-chain.
	Confirmed {
		action: ActionKind,
		tx_hash: TransactionHash,
		block_number: u64,
	},
	/// The transaction was included but rejected.
	Rejected {
		action: ActionKind,
		tx_hash: TransactionHash,
		reason: String,
	},
	/// The operation ended without a confirmed outcome.
	Failed {
		action: ActionKind,
		error: OperationError,
	},
	/// A submission was refused because one is already in flight.
	Refused { action: ActionKind },
}

/// Events related to read refreshes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReadEvent {
	/// A dependent read should be re-executed.
	RefreshRequested { action: ActionKind, query: String },
}
