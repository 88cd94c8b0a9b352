//! Allowed operation status transitions.
//!
//! Idle -> Submitting -> Pending -> Confirmed | Rejected | Failed, with
//! Submitting -> Failed when the wallet errors. Any settled state may start
//! over, either with a new submission or with a local failure.

use ledger_types::OperationStatus;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

pub struct OperationStateMachine;

impl OperationStateMachine {
	/// Checks if a status transition is valid.
	pub fn is_valid_transition(from: OperationStatus, to: OperationStatus) -> bool {
		use OperationStatus::*;

		// Static transition table - each status maps to allowed next statuses
		static TRANSITIONS: Lazy<HashMap<OperationStatus, HashSet<OperationStatus>>> =
			Lazy::new(|| {
				let restart = [Submitting, Failed];
				let mut m = HashMap::new();
				m.insert(Idle, HashSet::from(restart));
				m.insert(Submitting, HashSet::from([Pending, Failed]));
				m.insert(Pending, HashSet::from([Confirmed, Rejected, Failed]));
				m.insert(Confirmed, HashSet::from(restart));
				m.insert(Rejected, HashSet::from(restart));
				m.insert(Failed, HashSet::from(restart));
				m
			});

		TRANSITIONS.get(&from).is_some_and(|set| set.contains(&to))
	}
}
