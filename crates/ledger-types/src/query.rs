//! Read queries and their results.
//!
//! A `ReadQuery` names what to read; a `ReadResult` is an immutable snapshot of
//! the latest attempt. Consumers only ever see whole snapshots, a new fetch
//! replaces the previous result in one step.

use crate::call::CallArg;
use crate::utils::format_token_amount;
use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// What a read query asks the node for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryKind {
	/// Height of the latest block.
	BlockNumber,
	/// Native currency balance of an account.
	NativeBalance { account: Address },
	/// A registered view function on a contract.
	///
	/// When `decimals` is set, an unsigned integer result is reported as a
	/// fixed-point amount with that many implicit decimals.
	ContractView {
		contract: Address,
		function: String,
		args: Vec<CallArg>,
		decimals: Option<u8>,
	},
}

/// A side-effect-free request for current on-chain state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReadQuery {
	pub kind: QueryKind,
	/// Re-execution cadence while watched.
	pub watch_interval: Option<Duration>,
}

impl ReadQuery {
	pub fn block_number() -> Self {
		Self {
			kind: QueryKind::BlockNumber,
			watch_interval: None,
		}
	}

	pub fn native_balance(account: Address) -> Self {
		Self {
			kind: QueryKind::NativeBalance { account },
			watch_interval: None,
		}
	}

	pub fn contract_view(
		contract: Address,
		function: impl Into<String>,
		args: Vec<CallArg>,
		decimals: Option<u8>,
	) -> Self {
		Self {
			kind: QueryKind::ContractView {
				contract,
				function: function.into(),
				args,
				decimals,
			},
			watch_interval: None,
		}
	}

	/// Sets the watch cadence.
	pub fn watched(mut self, interval: Duration) -> Self {
		self.watch_interval = Some(interval);
		self
	}

	/// Stable textual key used in logs and refresh events.
	pub fn key(&self) -> String {
		match &self.kind {
			QueryKind::BlockNumber => "block_number".to_string(),
			QueryKind::NativeBalance { account } => format!("native_balance:{}", account),
			QueryKind::ContractView {
				contract,
				function,
				args,
				..
			} => {
				let args: Vec<String> = args.iter().map(ToString::to_string).collect();
				format!("view:{}:{}({})", contract, function, args.join(","))
			},
		}
	}
}

/// Fixed-point amount: integer magnitude plus implicit decimal count.
///
/// The raw integer is kept intact; conversion to a decimal string is lossless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedPoint {
	pub raw: U256,
	pub decimals: u8,
	pub symbol: Option<String>,
}

impl FixedPoint {
	pub fn new(raw: U256, decimals: u8) -> Self {
		Self {
			raw,
			decimals,
			symbol: None,
		}
	}

	pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
		self.symbol = Some(symbol.into());
		self
	}

	/// Exact decimal rendering, trailing zeros trimmed.
	pub fn to_decimal_string(&self) -> String {
		format_token_amount(&self.raw.to_string(), self.decimals)
	}
}

/// A decoded value returned by a read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadValue {
	BlockNumber(u64),
	Amount(FixedPoint),
	Uint(U256),
	Text(String),
}

impl fmt::Display for ReadValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ReadValue::BlockNumber(n) => write!(f, "{}", n),
			ReadValue::Amount(amount) => match &amount.symbol {
				Some(symbol) => write!(f, "{} {}", amount.to_decimal_string(), symbol),
				None => f.write_str(&amount.to_decimal_string()),
			},
			ReadValue::Uint(v) => write!(f, "{}", v),
			ReadValue::Text(s) => f.write_str(s),
		}
	}
}

/// Read-path error classification.
///
/// Attached to a `ReadResult` as a value; never propagated as a panic.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ReadError {
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Node unreachable: {0}")]
	NodeUnreachable(String),
	#[error("Malformed response: {0}")]
	MalformedResponse(String),
	/// The query could not be encoded; nothing was sent to the node.
	#[error("Invalid arguments: {0}")]
	InvalidArguments(String),
}

/// Immutable snapshot of the latest read attempt for a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadResult {
	pub value: Option<ReadValue>,
	pub fetched_at: Option<DateTime<Utc>>,
	pub is_loading: bool,
	pub error: Option<ReadError>,
}

impl ReadResult {
	/// Placeholder before the first fetch resolves.
	pub fn loading() -> Self {
		Self {
			value: None,
			fetched_at: None,
			is_loading: true,
			error: None,
		}
	}

	pub fn success(value: ReadValue) -> Self {
		Self {
			value: Some(value),
			fetched_at: Some(Utc::now()),
			is_loading: false,
			error: None,
		}
	}

	pub fn failure(error: ReadError) -> Self {
		Self {
			value: None,
			fetched_at: Some(Utc::now()),
			is_loading: false,
			error: Some(error),
		}
	}

	pub fn is_error(&self) -> bool {
		self.error.is_some()
	}

	/// Block height, if this result holds one.
	pub fn block_number(&self) -> Option<u64> {
		match self.value {
			Some(ReadValue::BlockNumber(n)) => Some(n),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_fixed_point_keeps_precision() {
		// 2^70 wei is not representable exactly as f64
		let raw = U256::from(1u128 << 70);
		let amount = FixedPoint::new(raw, 18);
		assert_eq!(amount.to_decimal_string(), "1180.591620717411303424");
		assert_eq!(amount.raw, raw);
	}

	#[test]
	fn test_result_flags() {
		let loading = ReadResult::loading();
		assert!(loading.is_loading);
		assert!(!loading.is_error());
		assert!(loading.fetched_at.is_none());

		let failed = ReadResult::failure(ReadError::NodeUnreachable("timeout".into()));
		assert!(failed.is_error());
		assert!(!failed.is_loading);
		assert!(failed.value.is_none());

		let ok = ReadResult::success(ReadValue::BlockNumber(168998));
		assert_eq!(ok.block_number(), Some(168998));
	}

	#[test]
	fn test_query_keys_are_stable() {
		let contract = Address::repeat_byte(0x11);
		let account = Address::repeat_byte(0x22);
		let q1 = ReadQuery::contract_view(
			contract,
			"balance_of",
			vec![CallArg::Address(account)],
			Some(18),
		);
		let q2 = q1.clone().watched(Duration::from_secs(5));
		assert_eq!(q1.key(), q2.key());
		assert!(q1.key().starts_with("view:"));
		assert!(q1.key().contains("balance_of("));
		assert_eq!(ReadQuery::block_number().key(), "block_number");
	}
}
