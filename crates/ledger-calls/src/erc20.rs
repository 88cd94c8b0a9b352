//! ERC-20 token functions available to the builder.
//!
//! ABI encoding and decoding is delegated to `alloy-sol-types`; this module
//! only adapts typed `CallArg` lists to the generated call structs.

use crate::registry::{FunctionSpec, ParamType, ViewOutput};
use crate::BuildError;
use alloy_sol_types::{sol, SolCall};
use alloy_primitives::{Address, U256};
use ledger_types::{CallArg, FunctionKind};

sol! {
	interface IMintableToken {
		function mint(address to, uint256 amount) external;
		function transfer(address to, uint256 amount) external returns (bool success);
		function balanceOf(address account) external view returns (uint256 balance);
		function totalSupply() external view returns (uint256 supply);
		function decimals() external view returns (uint8 places);
		function symbol() external view returns (string ticker);
	}
}

use IMintableToken::{
	balanceOfCall, decimalsCall, mintCall, symbolCall, totalSupplyCall, transferCall,
};

/// All token functions, keyed by their snake_case names.
pub(crate) fn functions() -> Vec<FunctionSpec> {
	vec![
		FunctionSpec {
			name: "mint",
			kind: FunctionKind::Write,
			params: &[ParamType::Address, ParamType::Uint256],
			requires_positive_amount: true,
			encode: encode_mint,
			decode: None,
		},
		FunctionSpec {
			name: "transfer",
			kind: FunctionKind::Write,
			params: &[ParamType::Address, ParamType::Uint256],
			requires_positive_amount: true,
			encode: encode_transfer,
			decode: None,
		},
		FunctionSpec {
			name: "balance_of",
			kind: FunctionKind::View,
			params: &[ParamType::Address],
			requires_positive_amount: false,
			encode: encode_balance_of,
			decode: Some(decode_balance_of),
		},
		FunctionSpec {
			name: "total_supply",
			kind: FunctionKind::View,
			params: &[],
			requires_positive_amount: false,
			encode: encode_total_supply,
			decode: Some(decode_total_supply),
		},
		FunctionSpec {
			name: "decimals",
			kind: FunctionKind::View,
			params: &[],
			requires_positive_amount: false,
			encode: encode_decimals,
			decode: Some(decode_decimals),
		},
		FunctionSpec {
			name: "symbol",
			kind: FunctionKind::View,
			params: &[],
			requires_positive_amount: false,
			encode: encode_symbol,
			decode: Some(decode_symbol),
		},
	]
}

// Arguments are type-checked against `params` before any encoder runs.
fn address_and_amount(args: &[CallArg]) -> Result<(Address, U256), BuildError> {
	match args {
		[CallArg::Address(to), CallArg::Uint(amount)] => Ok((*to, *amount)),
		_ => Err(BuildError::InvalidArguments(
			"expected (address, uint256)".to_string(),
		)),
	}
}

fn encode_mint(args: &[CallArg]) -> Result<Vec<u8>, BuildError> {
	let (to, amount) = address_and_amount(args)?;
	Ok(mintCall { to, amount }.abi_encode())
}

fn encode_transfer(args: &[CallArg]) -> Result<Vec<u8>, BuildError> {
	let (to, amount) = address_and_amount(args)?;
	Ok(transferCall { to, amount }.abi_encode())
}

fn encode_balance_of(args: &[CallArg]) -> Result<Vec<u8>, BuildError> {
	match args {
		[CallArg::Address(account)] => Ok(balanceOfCall { account: *account }.abi_encode()),
		_ => Err(BuildError::InvalidArguments("expected (address)".to_string())),
	}
}

fn encode_total_supply(_args: &[CallArg]) -> Result<Vec<u8>, BuildError> {
	Ok(totalSupplyCall {}.abi_encode())
}

fn encode_decimals(_args: &[CallArg]) -> Result<Vec<u8>, BuildError> {
	Ok(decimalsCall {}.abi_encode())
}

fn encode_symbol(_args: &[CallArg]) -> Result<Vec<u8>, BuildError> {
	Ok(symbolCall {}.abi_encode())
}

fn decode_error(e: alloy_sol_types::Error) -> BuildError {
	BuildError::Decode(e.to_string())
}

fn decode_balance_of(data: &[u8]) -> Result<ViewOutput, BuildError> {
	let ret = balanceOfCall::abi_decode_returns(data, true).map_err(decode_error)?;
	Ok(ViewOutput::Uint(ret.balance))
}

fn decode_total_supply(data: &[u8]) -> Result<ViewOutput, BuildError> {
	let ret = totalSupplyCall::abi_decode_returns(data, true).map_err(decode_error)?;
	Ok(ViewOutput::Uint(ret.supply))
}

fn decode_decimals(data: &[u8]) -> Result<ViewOutput, BuildError> {
	let ret = decimalsCall::abi_decode_returns(data, true).map_err(decode_error)?;
	Ok(ViewOutput::Small(ret.places))
}

fn decode_symbol(data: &[u8]) -> Result<ViewOutput, BuildError> {
	let ret = symbolCall::abi_decode_returns(data, true).map_err(decode_error)?;
	Ok(ViewOutput::Text(ret.ticker))
}
