//! String formatting utilities.
//!
//! Hex prefix handling, truncation of hashes for log lines, and lossless
//! rendering of fixed-point token amounts for display.

/// Truncates a hex string for display, keeping the first 8 characters.
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 8 {
		id.to_string()
	} else {
		format!("{}..", &id[..8])
	}
}

/// Adds "0x" prefix to a hex string if it doesn't already have one.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.to_lowercase().starts_with("0x") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Removes "0x" or "0X" prefix from a hex string if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Formats a raw on-chain integer amount with decimal places for display.
///
/// # Arguments
///
/// * `amount` - The raw token amount as a decimal integer string
/// * `decimals` - The number of implicit decimal places
///
/// # Returns
///
/// A formatted string like "1.5" or "1000"; trailing zeros are dropped.
pub fn format_token_amount(amount: &str, decimals: u8) -> String {
	if decimals == 0 {
		return amount.to_string();
	}

	let decimal_places = decimals as usize;

	let (integer_part, decimal_part) = if amount.len() <= decimal_places {
		let decimal_str = format!("{:0>width$}", amount, width = decimal_places);
		("0".to_string(), decimal_str)
	} else {
		let split_pos = amount.len() - decimal_places;
		(
			amount[..split_pos].to_string(),
			amount[split_pos..].to_string(),
		)
	};

	let decimal_trimmed = decimal_part.trim_end_matches('0');

	if decimal_trimmed.is_empty() {
		integer_part
	} else {
		format!("{}.{}", integer_part, decimal_trimmed)
	}
}

/// Rounds a non-negative decimal string to a fixed number of places, half up.
///
/// Works on the digits directly so large balances are not routed through a
/// float. Always emits exactly `places` fractional digits.
pub fn round_decimal_string(value: &str, places: usize) -> String {
	let (int_part, frac_part) = value.split_once('.').unwrap_or((value, ""));
	let int_part = if int_part.is_empty() { "0" } else { int_part };

	let mut digits: Vec<u8> = int_part
		.bytes()
		.chain(frac_part.bytes().chain(std::iter::repeat(b'0')).take(places))
		.map(|b| b - b'0')
		.collect();

	let round_up = frac_part.as_bytes().get(places).is_some_and(|d| *d >= b'5');
	if round_up {
		let mut i = digits.len();
		loop {
			if i == 0 {
				digits.insert(0, 1);
				break;
			}
			i -= 1;
			if digits[i] == 9 {
				digits[i] = 0;
			} else {
				digits[i] += 1;
				break;
			}
		}
	}

	let text: String = digits.iter().map(|d| (d + b'0') as char).collect();
	if places == 0 {
		return text;
	}
	let split = text.len() - places;
	format!("{}.{}", &text[..split], &text[split..])
}
