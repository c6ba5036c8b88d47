//! STX Amount Conversion
//!
//! Amounts travel as integer µSTX everywhere; these helpers convert to and
//! from the decimal STX strings users see, without floating point.

use crate::error::{StxError, StxResult};

/// Fixed divisor between µSTX and STX
pub const MICRO_STX_PER_STX: u64 = 1_000_000;

/// Decimal places of the STX display unit
pub const STX_DECIMALS: usize = 6;

/// Render µSTX as an exact decimal STX string, e.g. `100000000` -> `"100.000000"`
pub fn format_stx(micro_stx: u128) -> String {
    let divisor = MICRO_STX_PER_STX as u128;
    format!(
        "{}.{:0width$}",
        micro_stx / divisor,
        micro_stx % divisor,
        width = STX_DECIMALS
    )
}

/// Parse a decimal STX amount (`"1"`, `"0.5"`, `"12.000001"`) into µSTX
pub fn parse_stx(amount: &str) -> StxResult<u64> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(StxError::invalid_intent("amount", "Amount is empty"));
    }

    let (whole, fraction) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(StxError::invalid_intent("amount", "Amount has no digits"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(StxError::invalid_intent(
            "amount",
            format!("Invalid amount format: {}", amount),
        ));
    }
    if fraction.len() > STX_DECIMALS {
        return Err(StxError::invalid_intent(
            "amount",
            format!("Too many decimal places: {} (max {})", fraction.len(), STX_DECIMALS),
        ));
    }

    let whole_value: u64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| StxError::invalid_intent("amount", "Amount too large"))?
    };
    let fraction_value: u64 = if fraction.is_empty() {
        0
    } else {
        format!("{:0<width$}", fraction, width = STX_DECIMALS)
            .parse()
            .map_err(|_| StxError::invalid_intent("amount", "Invalid fraction"))?
    };

    whole_value
        .checked_mul(MICRO_STX_PER_STX)
        .and_then(|v| v.checked_add(fraction_value))
        .ok_or_else(|| StxError::invalid_intent("amount", "Amount too large"))
}

/// Parse an integer µSTX string as returned by node APIs (`"123"` or `"0x7b"`)
pub fn parse_micro_stx(value: &str) -> StxResult<u128> {
    let value = value.trim();
    let parsed = match value.strip_prefix("0x") {
        Some(hex_digits) if hex_digits.is_empty() => Ok(0),
        Some(hex_digits) => u128::from_str_radix(hex_digits, 16),
        None => value.parse::<u128>(),
    };
    parsed.map_err(|e| StxError::codec(format!("Invalid µSTX amount '{}': {}", value, e)))
}
