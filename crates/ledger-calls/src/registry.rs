//! Typed mapping from function name to encoding strategy.

use crate::BuildError;
use alloy_primitives::U256;
use ledger_types::{CallArg, FunctionKind};
use std::collections::HashMap;

/// Solidity parameter types the registry understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
	Address,
	Uint256,
}

impl ParamType {
	fn accepts(&self, arg: &CallArg) -> bool {
		matches!(
			(self, arg),
			(ParamType::Address, CallArg::Address(_)) | (ParamType::Uint256, CallArg::Uint(_))
		)
	}
}

/// Decoded return value of a view function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOutput {
	Uint(U256),
	/// Small integers such as `decimals()`.
	Small(u8),
	Text(String),
}

pub type Encoder = fn(&[CallArg]) -> Result<Vec<u8>, BuildError>;
pub type Decoder = fn(&[u8]) -> Result<ViewOutput, BuildError>;

/// Everything the builder needs to know about one function.
pub struct FunctionSpec {
	pub name: &'static str,
	pub kind: FunctionKind,
	pub params: &'static [ParamType],
	/// The last `Uint256` parameter must be non-zero.
	pub requires_positive_amount: bool,
	pub encode: Encoder,
	pub decode: Option<Decoder>,
}

impl FunctionSpec {
	/// Checks arity, argument types and address/amount rules.
	pub(crate) fn check_args(&self, args: &[CallArg]) -> Result<(), BuildError> {
		if args.len() != self.params.len() {
			return Err(BuildError::InvalidArguments(format!(
				"{} expects {} arguments, got {}",
				self.name,
				self.params.len(),
				args.len()
			)));
		}

		for (i, (param, arg)) in self.params.iter().zip(args).enumerate() {
			if !param.accepts(arg) {
				return Err(BuildError::InvalidArguments(format!(
					"{} argument {} must be {:?}",
					self.name, i, param
				)));
			}
			if let CallArg::Address(address) = arg {
				if address.is_zero() {
					return Err(BuildError::InvalidArguments(format!(
						"{} argument {} is the zero address",
						self.name, i
					)));
				}
			}
		}

		if self.requires_positive_amount {
			let amount = args.iter().rev().find_map(CallArg::as_uint);
			if amount.is_none_or(|a| a.is_zero()) {
				return Err(BuildError::InvalidArguments(format!(
					"{} requires a positive amount",
					self.name
				)));
			}
		}

		Ok(())
	}
}

/// Registered functions by name.
pub struct FunctionRegistry {
	functions: HashMap<&'static str, FunctionSpec>,
}

impl FunctionRegistry {
	pub fn new(specs: Vec<FunctionSpec>) -> Self {
		Self {
			functions: specs.into_iter().map(|spec| (spec.name, spec)).collect(),
		}
	}

	/// Registry holding the mintable ERC-20 functions.
	pub fn erc20() -> Self {
		Self::new(crate::erc20::functions())
	}

	pub fn get(&self, name: &str) -> Result<&FunctionSpec, BuildError> {
		self.functions
			.get(name)
			.ok_or_else(|| BuildError::UnknownFunction(name.to_string()))
	}

	pub fn contains(&self, name: &str) -> bool {
		self.functions.contains_key(name)
	}
}

impl Default for FunctionRegistry {
	fn default() -> Self {
		Self::erc20()
	}
}
