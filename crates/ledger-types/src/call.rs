//! Unsigned contract call payloads.
//!
//! A payload is an immutable description of a state-changing invocation. It
//! carries the already-encoded calldata next to the typed inputs it was built
//! from, so two builds from the same inputs compare equal and nothing time- or
//! nonce-dependent is embedded.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed argument for a contract function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallArg {
	Address(Address),
	Uint(U256),
}

impl CallArg {
	pub fn as_address(&self) -> Option<Address> {
		match self {
			CallArg::Address(a) => Some(*a),
			_ => None,
		}
	}

	pub fn as_uint(&self) -> Option<U256> {
		match self {
			CallArg::Uint(v) => Some(*v),
			_ => None,
		}
	}
}

impl fmt::Display for CallArg {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CallArg::Address(a) => write!(f, "{}", a),
			CallArg::Uint(v) => write!(f, "{}", v),
		}
	}
}

/// Whether a registered function changes state or only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
	Write,
	View,
}

/// Unsigned description of a state-changing invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallPayload {
	/// Contract the call is sent to.
	pub target: Address,
	/// Registered function name.
	pub function: String,
	/// Arguments in declaration order.
	pub args: Vec<CallArg>,
	/// ABI-encoded calldata (selector followed by arguments).
	pub calldata: Bytes,
}
