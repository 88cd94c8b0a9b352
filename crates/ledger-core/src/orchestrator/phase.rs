//! Human-readable phase label for an operation.

use ledger_types::{ActionKind, OperationState, OperationStatus};

/// Label shown for an action's current state.
///
/// Depends on nothing but `action` and `state`.
pub fn phase_label(action: ActionKind, state: &OperationState) -> String {
	match state.status() {
		OperationStatus::Idle => match action {
			ActionKind::Mint => "Send".to_string(),
			ActionKind::Transfer => "Send Transfer".to_string(),
		},
		OperationStatus::Submitting => "Send...".to_string(),
		OperationStatus::Pending => "Waiting for confirmation...".to_string(),
		OperationStatus::Confirmed => "Transaction confirmed".to_string(),
		OperationStatus::Rejected => format!(
			"Transaction rejected: {}",
			state.rejection_reason().unwrap_or_default()
		),
		OperationStatus::Failed => match state.error() {
			Some(error) => format!("Transaction failed: {}", error),
			None => "Transaction failed".to_string(),
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ledger_types::{OperationError, SubmissionHandle, TransactionHash};

	fn handle() -> SubmissionHandle {
		SubmissionHandle::new(TransactionHash(vec![1; 32]))
	}

	#[test]
	fn test_idle_label_depends_on_action() {
		let idle = OperationState::idle();
		assert_eq!(phase_label(ActionKind::Mint, &idle), "Send");
		assert_eq!(phase_label(ActionKind::Transfer, &idle), "Send Transfer");
	}

	#[test]
	fn test_in_flight_labels() {
		assert_eq!(
			phase_label(ActionKind::Mint, &OperationState::submitting()),
			"Send..."
		);
		assert_eq!(
			phase_label(ActionKind::Transfer, &OperationState::pending(handle())),
			"Waiting for confirmation..."
		);
	}

	#[test]
	fn test_settled_labels() {
		assert_eq!(
			phase_label(ActionKind::Mint, &OperationState::confirmed(handle())),
			"Transaction confirmed"
		);
		assert_eq!(
			phase_label(
				ActionKind::Transfer,
				&OperationState::rejected(handle(), "insufficient balance")
			),
			"Transaction rejected: insufficient balance"
		);
		assert_eq!(
			phase_label(
				ActionKind::Mint,
				&OperationState::failed(OperationError::UserRejected)
			),
			"Transaction failed: User rejected the request"
		);
		assert_eq!(
			phase_label(ActionKind::Mint, &OperationState::timed_out(handle(), 5)),
			"Transaction failed: No final status after 5 polls"
		);
	}

	#[test]
	fn test_label_is_reproducible() {
		let state = OperationState::rejected(handle(), "out of gas");
		assert_eq!(
			phase_label(ActionKind::Mint, &state),
			phase_label(ActionKind::Mint, &state.clone())
		);
	}
}
