//! Console rendering of read snapshots.

use ledger_config::Config;
use ledger_core::WorkshopPhase;
use ledger_types::{round_decimal_string, ReadResult, ReadValue};

/// Decimal places shown for the native balance.
const NATIVE_DISPLAY_PLACES: usize = 4;

/// Renders a snapshot, showing loading and error states explicitly.
pub fn render(result: &ReadResult) -> String {
	if let Some(error) = &result.error {
		return format!("error ({})", error);
	}
	match &result.value {
		Some(value) => value.to_string(),
		None if result.is_loading => "loading...".to_string(),
		None => "-".to_string(),
	}
}

/// Renders the native balance rounded for display.
///
/// Only the rendering is rounded; the snapshot keeps the exact amount.
pub fn render_native(result: &ReadResult) -> String {
	match &result.value {
		Some(ReadValue::Amount(amount)) if result.error.is_none() => {
			let rounded = round_decimal_string(&amount.to_decimal_string(), NATIVE_DISPLAY_PLACES);
			match &amount.symbol {
				Some(symbol) => format!("{} {}", rounded, symbol),
				None => rounded,
			}
		},
		_ => render(result),
	}
}

/// Renders a token amount with the configured symbol.
pub fn render_token(result: &ReadResult, config: &Config) -> String {
	match &result.value {
		Some(ReadValue::Amount(amount)) if result.error.is_none() => {
			format!("{} {}", amount.to_decimal_string(), config.token.symbol)
		},
		_ => render(result),
	}
}

/// Renders the block height together with the workshop phase.
pub fn render_block(result: &ReadResult, phase: Option<WorkshopPhase>) -> String {
	match phase {
		Some(phase) => format!("{} (workshop {})", render(result), phase),
		None => render(result),
	}
}
