use crate::UnitsError;
use alloy_primitives::U256;
use regex::Regex;
use std::sync::LazyLock;

/// Lax pattern: accepts `"1."` and `"."`. Used for inline form feedback.
pub const UI_AMOUNT_PATTERN: &str = r"^\d*\.?\d*$";

/// Strict pattern: requires at least one trailing digit. Gates parsing,
/// simulation and submission.
pub const PARSABLE_AMOUNT_PATTERN: &str = r"^\d*\.?\d+$";

static UI_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(UI_AMOUNT_PATTERN).expect("static pattern"));
static PARSABLE_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PARSABLE_AMOUNT_PATTERN).expect("static pattern"));

/// Raw lax pattern match. Note the empty string and `"."` both match.
pub fn matches_lax_pattern(amount: &str) -> bool {
    UI_AMOUNT.is_match(amount)
}

/// Whether `amount` is acceptable while editing.
pub fn is_ui_amount(amount: &str) -> bool {
    matches_lax_pattern(amount) && !amount.is_empty() && amount != "."
}

/// Whether `amount` can be parsed into on-chain units.
pub fn is_parsable_amount(amount: &str) -> bool {
    PARSABLE_AMOUNT.is_match(amount)
}

/// Parse a decimal string into an integer amount scaled by `decimals`.
///
/// Fractional digits beyond the token precision are rounded half-up.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, UnitsError> {
    if !is_parsable_amount(amount) {
        return Err(UnitsError::InvalidFormat(amount.to_string()));
    }

    let overflow = || UnitsError::Overflow(amount.to_string());
    let width = usize::from(decimals);

    let (int_part, frac_part) = amount.split_once('.').unwrap_or((amount, ""));
    let (kept, dropped) = if frac_part.len() > width {
        frac_part.split_at(width)
    } else {
        (frac_part, "")
    };

    let scale = U256::from(10u8)
        .checked_pow(U256::from(decimals))
        .ok_or_else(overflow)?;
    let int = parse_digits(int_part).ok_or_else(overflow)?;
    let frac = parse_digits(&format!("{kept:0<width$}")).ok_or_else(overflow)?;

    let mut value = int
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac))
        .ok_or_else(overflow)?;

    if dropped.as_bytes().first().is_some_and(|d| *d >= b'5') {
        value = value.checked_add(U256::from(1u8)).ok_or_else(overflow)?;
    }

    Ok(value)
}

fn parse_digits(digits: &str) -> Option<U256> {
    if digits.is_empty() {
        return Some(U256::ZERO);
    }
    U256::from_str_radix(digits, 10).ok()
}

/// Exact decimal representation of `value` scaled down by `decimals`, with
/// trailing fractional zeros trimmed.
pub fn format_amount(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    if decimals == 0 {
        return digits;
    }

    let width = usize::from(decimals);
    let padded = format!("{digits:0>w$}", w = width + 1);
    let (int, frac) = padded.split_at(padded.len() - width);
    let frac = frac.trim_end_matches('0');

    if frac.is_empty() {
        int.to_string()
    } else {
        format!("{int}.{frac}")
    }
}

/// Lossy conversion for display math (USD values, gas costs).
pub fn to_f64(value: U256, decimals: u8) -> f64 {
    format_amount(value, decimals).parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lax_accepts_trailing_dot_strict_does_not() {
        assert!(is_ui_amount("12."));
        assert!(!is_parsable_amount("12."));
        assert!(parse_amount("12.", 18).is_err());
    }

    #[test]
    fn test_ui_amount_rejects_empty_and_lone_dot() {
        assert!(matches_lax_pattern(""));
        assert!(matches_lax_pattern("."));
        assert!(!is_ui_amount(""));
        assert!(!is_ui_amount("."));
    }

    #[test]
    fn test_patterns_reject_garbage() {
        for input in ["abc", "1,5", "-1", "1e5", "1.2.3", " 1", "0x10"] {
            assert!(!matches_lax_pattern(input), "{input}");
            assert!(!is_parsable_amount(input), "{input}");
            assert!(parse_amount(input, 6).is_err(), "{input}");
        }
    }

    #[test]
    fn test_parse_six_decimals() {
        assert_eq!(parse_amount("1.5", 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(parse_amount(".5", 6).unwrap(), U256::from(500_000u64));
        assert_eq!(parse_amount("0", 6).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_parse_zero_decimals() {
        assert_eq!(parse_amount("42", 0).unwrap(), U256::from(42u64));
        assert_eq!(parse_amount("42.4", 0).unwrap(), U256::from(42u64));
        assert_eq!(parse_amount("42.5", 0).unwrap(), U256::from(43u64));
    }

    #[test]
    fn test_parse_rounds_excess_precision() {
        assert_eq!(parse_amount("1.1234564", 6).unwrap(), U256::from(1_123_456u64));
        assert_eq!(parse_amount("1.1234565", 6).unwrap(), U256::from(1_123_457u64));
    }

    #[test]
    fn test_parse_overflow() {
        let too_big = format!("1{}", "0".repeat(80));
        assert!(matches!(
            parse_amount(&too_big, 18),
            Err(UnitsError::Overflow(_))
        ));
    }

    #[test]
    fn test_format_trims_zeros() {
        assert_eq!(format_amount(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_amount(U256::from(1_000_000u64), 6), "1");
        assert_eq!(format_amount(U256::from(5u64), 6), "0.000005");
        assert_eq!(format_amount(U256::ZERO, 18), "0");
        assert_eq!(format_amount(U256::from(7u64), 0), "7");
    }

    #[test]
    fn test_unlimited_round_trip() {
        for decimals in [0u8, 6, 18] {
            let text = format_amount(U256::MAX, decimals);
            assert_eq!(parse_amount(&text, decimals).unwrap(), U256::MAX);
        }
    }

    #[test]
    fn test_parse_is_monotonic() {
        let inputs = ["0.000001", "0.1", "0.5", "1", "1.000001", "9.99", "10", "1234.5"];
        let parsed: Vec<U256> = inputs
            .iter()
            .map(|s| parse_amount(s, 6).unwrap())
            .collect();
        assert!(parsed.windows(2).all(|w| w[0] < w[1]));

        for (input, value) in inputs.iter().zip(&parsed) {
            let back: f64 = format_amount(*value, 6).parse().unwrap();
            let original: f64 = input.parse().unwrap();
            assert!((back - original).abs() < 1e-6);
        }
    }

    #[test]
    fn test_to_f64() {
        assert_eq!(to_f64(U256::from(2_500_000u64), 6), 2.5);
    }
}
