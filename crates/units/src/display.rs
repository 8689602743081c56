/// Format a token or fiat quantity for display.
///
/// Zero and NaN render as `0.00`. Values of at least one get two fraction
/// digits and thousands separators; smaller values keep four significant
/// digits so dust amounts stay readable.
pub fn format_crypto_value(num: f64, usd: bool) -> String {
    let formatted = if num.is_nan() || num == 0.0 {
        "0.00".to_string()
    } else if num >= 1.0 {
        group_thousands(&format!("{num:.2}"))
    } else {
        significant_digits(num, 4)
    };

    if usd {
        format!("${formatted}")
    } else {
        formatted
    }
}

/// Unit price with two fraction digits, e.g. `$1.00`.
pub fn format_price(price: f64) -> String {
    format!("${price:.2}")
}

/// 24-hour change badge, e.g. `▲ 1.23%` or `▼ 4.56%`.
pub fn format_change(change_pct: f64) -> String {
    let arrow = if change_pct >= 0.0 { '▲' } else { '▼' };
    format!("{arrow} {:.2}%", change_pct.abs())
}

fn significant_digits(num: f64, digits: i32) -> String {
    let magnitude = num.abs().log10().floor() as i32;
    let fraction_digits = (digits - 1 - magnitude).max(0) as usize;

    if fraction_digits == 0 {
        let factor = 10f64.powi(magnitude + 1 - digits);
        return group_thousands(&format!("{:.0}", (num / factor).round() * factor));
    }

    let fixed = format!("{num:.fraction_digits$}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    group_thousands(trimmed)
}

fn group_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int, frac) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_and_nan() {
        assert_eq!(format_crypto_value(0.0, false), "0.00");
        assert_eq!(format_crypto_value(0.0, true), "$0.00");
        assert_eq!(format_crypto_value(f64::NAN, true), "$0.00");
    }

    #[test]
    fn test_large_values_get_two_decimals() {
        assert_eq!(format_crypto_value(1.0, false), "1.00");
        assert_eq!(format_crypto_value(1234.567, false), "1,234.57");
        assert_eq!(format_crypto_value(1_234_567.0, true), "$1,234,567.00");
    }

    #[test]
    fn test_small_values_keep_significant_digits() {
        assert_eq!(format_crypto_value(0.5, false), "0.5");
        assert_eq!(format_crypto_value(0.000123456, false), "0.0001235");
        assert_eq!(format_crypto_value(0.12345, true), "$0.1235");
    }

    #[test]
    fn test_negative_values() {
        assert_eq!(format_crypto_value(-0.5, false), "-0.5");
        assert_eq!(format_crypto_value(-1234.5, false), "-1,235");
    }

    #[test]
    fn test_price_and_change() {
        assert_eq!(format_price(0.9998), "$1.00");
        assert_eq!(format_change(1.234), "▲ 1.23%");
        assert_eq!(format_change(-4.561), "▼ 4.56%");
    }
}
