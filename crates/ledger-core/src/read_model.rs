//! Derived read state: the workshop window and the reads each action
//! invalidates.

use alloy_primitives::Address;
use ledger_types::{ActionKind, CallArg, ReadQuery, ReadResult, TokenConfig};
use std::fmt;

/// Whether the workshop is still running at a given block height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkshopPhase {
	Live,
	Ended,
}

impl fmt::Display for WorkshopPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			WorkshopPhase::Live => f.write_str("live"),
			WorkshopPhase::Ended => f.write_str("ended"),
		}
	}
}

/// The workshop ends at a fixed block height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkshopWindow {
	ends_at_block: u64,
}

impl Default for WorkshopWindow {
	fn default() -> Self {
		Self::new(168_999)
	}
}

impl WorkshopWindow {
	pub fn new(ends_at_block: u64) -> Self {
		Self { ends_at_block }
	}

	pub fn ends_at_block(&self) -> u64 {
		self.ends_at_block
	}

	pub fn classify(&self, height: u64) -> WorkshopPhase {
		if height < self.ends_at_block {
			WorkshopPhase::Live
		} else {
			WorkshopPhase::Ended
		}
	}

	/// Classifies a block-number read; `None` while loading or on error.
	pub fn classify_result(&self, result: &ReadResult) -> Option<WorkshopPhase> {
		result.block_number().map(|height| self.classify(height))
	}
}

/// The token reads for the connected account.
#[derive(Debug, Clone)]
pub struct DependentReads {
	token_balance: ReadQuery,
	total_supply: ReadQuery,
}

impl DependentReads {
	pub fn new(token: &TokenConfig, account: Address) -> Self {
		Self {
			token_balance: ReadQuery::contract_view(
				token.address,
				"balance_of",
				vec![CallArg::Address(account)],
				Some(token.decimals),
			),
			total_supply: ReadQuery::contract_view(
				token.address,
				"total_supply",
				vec![],
				Some(token.decimals),
			),
		}
	}

	pub fn token_balance(&self) -> &ReadQuery {
		&self.token_balance
	}

	pub fn total_supply(&self) -> &ReadQuery {
		&self.total_supply
	}

	/// Reads to refresh once `action` is confirmed.
	pub fn for_action(&self, action: ActionKind) -> Vec<&ReadQuery> {
		match action {
			ActionKind::Mint => vec![&self.token_balance, &self.total_supply],
			ActionKind::Transfer => vec![&self.token_balance],
		}
	}
}
