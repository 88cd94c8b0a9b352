//! Contract call construction for the ledger operations system.
//!
//! Turns a target contract, a function name and typed arguments into an
//! unsigned `CallPayload`. Building is pure: the same inputs always produce a
//! structurally equal payload, and invalid inputs are refused here so they are
//! never sent to the network.

use alloy_primitives::{Address, Bytes, U256};
use ledger_types::{CallArg, CallPayload, FunctionKind, OperationError};
use thiserror::Error;

pub mod erc20;
pub mod registry;

pub use registry::{FunctionRegistry, FunctionSpec, ParamType, ViewOutput};

/// Errors that can occur while building or decoding calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
	/// Missing, mistyped, zero-address or non-positive arguments.
	#[error("Invalid arguments: {0}")]
	InvalidArguments(String),
	/// No function with that name is registered.
	#[error("Unknown function: {0}")]
	UnknownFunction(String),
	/// A view call returned bytes that do not match its return type.
	#[error("Decode error: {0}")]
	Decode(String),
}

impl From<BuildError> for OperationError {
	fn from(err: BuildError) -> Self {
		match err {
			BuildError::UnknownFunction(name) => OperationError::UnknownFunction(name),
			BuildError::InvalidArguments(msg) | BuildError::Decode(msg) => {
				OperationError::InvalidArguments(msg)
			},
		}
	}
}

/// Builds unsigned call payloads from a function registry.
pub struct ContractCallBuilder {
	registry: FunctionRegistry,
}

impl Default for ContractCallBuilder {
	fn default() -> Self {
		Self::new(FunctionRegistry::erc20())
	}
}

impl ContractCallBuilder {
	pub fn new(registry: FunctionRegistry) -> Self {
		Self { registry }
	}

	/// Builds a payload for a state-changing function.
	pub fn build(
		&self,
		contract: Address,
		function: &str,
		args: &[CallArg],
	) -> Result<CallPayload, BuildError> {
		let spec = self.registry.get(function)?;
		if spec.kind != FunctionKind::Write {
			return Err(BuildError::InvalidArguments(format!(
				"{} is a view function and cannot be submitted",
				function
			)));
		}
		if contract.is_zero() {
			return Err(BuildError::InvalidArguments(
				"target contract is the zero address".to_string(),
			));
		}
		spec.check_args(args)?;

		let calldata = (spec.encode)(args)?;
		tracing::debug!(function, contract = %contract, "Built call payload");

		Ok(CallPayload {
			target: contract,
			function: function.to_string(),
			args: args.to_vec(),
			calldata: Bytes::from(calldata),
		})
	}

	/// Encodes calldata for a view function.
	pub fn encode_view(&self, function: &str, args: &[CallArg]) -> Result<Bytes, BuildError> {
		let spec = self.registry.get(function)?;
		if spec.kind != FunctionKind::View {
			return Err(BuildError::InvalidArguments(format!(
				"{} is not a view function",
				function
			)));
		}
		spec.check_args(args)?;
		Ok(Bytes::from((spec.encode)(args)?))
	}

	/// Decodes the raw return data of a view function.
	pub fn decode_view(&self, function: &str, data: &[u8]) -> Result<ViewOutput, BuildError> {
		let spec = self.registry.get(function)?;
		let decode = spec.decode.ok_or_else(|| {
			BuildError::InvalidArguments(format!("{} has no return value", function))
		})?;
		decode(data)
	}
}

/// Caches the payload for the last set of inputs.
///
/// Re-evaluating with unchanged inputs returns the cached payload and reports
/// `rebuilt = false`, so callers only react when something actually changed.
#[derive(Debug, Default)]
pub struct CallMemo {
	last: Option<(MemoKey, CallPayload)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MemoKey {
	contract: Address,
	function: String,
	args: Vec<CallArg>,
}

impl CallMemo {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the payload for these inputs and whether it had to be rebuilt.
	pub fn get_or_build(
		&mut self,
		builder: &ContractCallBuilder,
		contract: Address,
		function: &str,
		args: &[CallArg],
	) -> Result<(CallPayload, bool), BuildError> {
		let key = MemoKey {
			contract,
			function: function.to_string(),
			args: args.to_vec(),
		};

		if let Some((cached_key, payload)) = &self.last {
			if *cached_key == key {
				return Ok((payload.clone(), false));
			}
		}

		match builder.build(contract, function, args) {
			Ok(payload) => {
				self.last = Some((key, payload.clone()));
				Ok((payload, true))
			},
			Err(e) => {
				self.last = None;
				Err(e)
			},
		}
	}

	/// Forgets the cached payload.
	pub fn clear(&mut self) {
		self.last = None;
	}
}

/// Parses a user-entered amount.
///
/// Accepts an integer or a decimal with at most `decimals` fractional digits
/// and scales it to the raw on-chain integer. Negative and non-numeric input
/// is refused.
pub fn parse_amount(input: &str, decimals: u8) -> Result<U256, BuildError> {
	let input = input.trim();
	if input.starts_with('-') {
		return Err(BuildError::InvalidArguments(format!(
			"amount must not be negative: {}",
			input
		)));
	}

	let (int_part, frac_part) = input.split_once('.').unwrap_or((input, ""));
	if frac_part.len() > decimals as usize {
		return Err(BuildError::InvalidArguments(format!(
			"amount has more than {} decimal places: {}",
			decimals, input
		)));
	}
	let digits = format!(
		"{}{}{}",
		int_part,
		frac_part,
		"0".repeat(decimals as usize - frac_part.len())
	);
	if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return Err(BuildError::InvalidArguments(format!(
			"amount is not a number: {}",
			input
		)));
	}

	U256::from_str_radix(&digits, 10)
		.map_err(|e| BuildError::InvalidArguments(format!("amount out of range: {}", e)))
}

/// Parses a 0x-prefixed address.
pub fn parse_address(input: &str) -> Result<Address, BuildError> {
	input
		.trim()
		.parse()
		.map_err(|e| BuildError::InvalidArguments(format!("invalid address '{}': {}", input, e)))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn token() -> Address {
		Address::repeat_byte(0x05)
	}

	fn recipient() -> Address {
		Address::repeat_byte(0x42)
	}

	#[test]
	fn test_build_is_deterministic() {
		let builder = ContractCallBuilder::default();
		let args = [CallArg::Address(recipient()), CallArg::Uint(U256::from(10))];
		let first = builder.build(token(), "transfer", &args).unwrap();
		let second = builder.build(token(), "transfer", &args).unwrap();
		assert_eq!(first, second);
		assert_eq!(first.target, token());
		assert_eq!(first.function, "transfer");
		// transfer(address,uint256) selector
		assert_eq!(&first.calldata[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
		assert_eq!(first.calldata.len(), 4 + 32 * 2);
	}

	#[test]
	fn test_zero_amount_rejected() {
		let builder = ContractCallBuilder::default();
		for function in ["mint", "transfer"] {
			let result = builder.build(
				token(),
				function,
				&[CallArg::Address(recipient()), CallArg::Uint(U256::ZERO)],
			);
			assert!(matches!(result, Err(BuildError::InvalidArguments(_))));
		}
	}

	#[test]
	fn test_missing_and_mistyped_arguments() {
		let builder = ContractCallBuilder::default();
		assert!(matches!(
			builder.build(token(), "mint", &[CallArg::Address(recipient())]),
			Err(BuildError::InvalidArguments(_))
		));
		assert!(matches!(
			builder.build(
				token(),
				"mint",
				&[CallArg::Uint(U256::from(1)), CallArg::Address(recipient())]
			),
			Err(BuildError::InvalidArguments(_))
		));
		assert!(matches!(
			builder.build(
				token(),
				"transfer",
				&[CallArg::Address(Address::ZERO), CallArg::Uint(U256::from(1))]
			),
			Err(BuildError::InvalidArguments(_))
		));
		assert!(matches!(
			builder.build(
				Address::ZERO,
				"mint",
				&[CallArg::Address(recipient()), CallArg::Uint(U256::from(1))]
			),
			Err(BuildError::InvalidArguments(_))
		));
	}

	#[test]
	fn test_unknown_function_is_an_error() {
		let builder = ContractCallBuilder::default();
		let result = builder.build(
			token(),
			"tranfser",
			&[CallArg::Address(recipient()), CallArg::Uint(U256::from(1))],
		);
		assert_eq!(result, Err(BuildError::UnknownFunction("tranfser".into())));
	}

	#[test]
	fn test_view_functions_are_not_buildable() {
		let builder = ContractCallBuilder::default();
		assert!(matches!(
			builder.build(token(), "total_supply", &[]),
			Err(BuildError::InvalidArguments(_))
		));
		let calldata = builder.encode_view("total_supply", &[]).unwrap();
		// totalSupply() selector
		assert_eq!(calldata.as_ref(), &[0x18, 0x16, 0x0d, 0xdd]);
	}

	#[test]
	fn test_decode_view_outputs() {
		let builder = ContractCallBuilder::default();
		let mut word = [0u8; 32];
		word[31] = 18;
		assert_eq!(
			builder.decode_view("decimals", &word).unwrap(),
			ViewOutput::Small(18)
		);
		word[30] = 1;
		assert_eq!(
			builder.decode_view("balance_of", &word).unwrap(),
			ViewOutput::Uint(U256::from(256 + 18))
		);
		assert!(matches!(
			builder.decode_view("total_supply", &[0u8; 3]),
			Err(BuildError::Decode(_))
		));
	}

	#[test]
	fn test_memo_rebuilds_only_on_change() {
		let builder = ContractCallBuilder::default();
		let mut memo = CallMemo::new();
		let args = vec![CallArg::Address(recipient()), CallArg::Uint(U256::from(5))];

		let (first, rebuilt) = memo.get_or_build(&builder, token(), "mint", &args).unwrap();
		assert!(rebuilt);
		let (second, rebuilt) = memo.get_or_build(&builder, token(), "mint", &args).unwrap();
		assert!(!rebuilt);
		assert_eq!(first, second);

		let changed = vec![CallArg::Address(recipient()), CallArg::Uint(U256::from(6))];
		let (_, rebuilt) = memo.get_or_build(&builder, token(), "mint", &changed).unwrap();
		assert!(rebuilt);
	}

	#[test]
	fn test_parse_amount() {
		assert_eq!(parse_amount("15", 0).unwrap(), U256::from(15));
		assert_eq!(parse_amount("1.5", 2).unwrap(), U256::from(150));
		assert_eq!(parse_amount(" 2 ", 3).unwrap(), U256::from(2000));
		assert!(parse_amount("-1", 0).is_err());
		assert!(parse_amount("1.234", 2).is_err());
		assert!(parse_amount("abc", 0).is_err());
		assert!(parse_amount("", 0).is_err());
	}
}
