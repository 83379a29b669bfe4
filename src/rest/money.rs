//! Cents-to-decimal conversion at the REST boundary.
//!
//! Every monetary value is stored as integer cents ([`crate::models`]); this
//! module is the only place a decimal representation is produced or parsed,
//! so `float_arithmetic` stays denied crate-wide.

/// Render integer cents as a fixed two-decimal string, e.g. `1234` → `"12.34"`.
#[must_use]
pub fn cents_to_decimal(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let magnitude = cents.unsigned_abs();
    #[expect(clippy::integer_division, reason = "splitting cents into whole/fractional units")]
    #[expect(clippy::integer_division_remainder_used, reason = "splitting cents into whole/fractional units")]
    let (whole, fraction) = (magnitude / 100, magnitude % 100);
    format!("{sign}{whole}.{fraction:02}")
}

/// Parse a decimal string into integer cents, rejecting more than two
/// fractional digits or a non-numeric value.
///
/// # Errors
/// Returns `Err` with a human-readable reason if `value` is not a valid
/// amount.
pub fn decimal_to_cents(value: &str) -> Result<i64, String> {
    let value = value.trim();
    let negative = value.starts_with('-');
    let unsigned = value.strip_prefix('-').unwrap_or(value);

    let mut parts = unsigned.splitn(2, '.');
    let whole_part = parts.next().unwrap_or("");
    let fraction_part = parts.next().unwrap_or("0");

    if fraction_part.len() > 2 || whole_part.is_empty() {
        return Err(format!("invalid amount: {value}"));
    }

    let whole: i64 = whole_part.parse().map_err(|_| format!("invalid amount: {value}"))?;
    let padded_fraction = format!("{fraction_part:0<2}");
    let fraction: i64 = padded_fraction.parse().map_err(|_| format!("invalid amount: {value}"))?;

    let cents = whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(|| format!("amount out of range: {value}"))?;

    Ok(if negative { -cents } else { cents })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(1234, "12.34")]
    #[case(5, "0.05")]
    #[case(0, "0.00")]
    #[case(-150, "-1.50")]
    fn cents_to_decimal_formats_as_expected(#[case] cents: i64, #[case] expected: &str) {
        assert_eq!(cents_to_decimal(cents), expected);
    }

    #[rstest]
    #[case("12.34", 1234)]
    #[case("0.05", 5)]
    #[case("10", 1000)]
    #[case("-1.50", -150)]
    fn decimal_to_cents_parses_valid_amounts(#[case] input: &str, #[case] expected: i64) {
        assert_eq!(decimal_to_cents(input), Ok(expected));
    }

    #[rstest]
    #[case("12.345")]
    #[case("abc")]
    #[case(".50")]
    fn decimal_to_cents_rejects_invalid_amounts(#[case] input: &str) {
        assert!(decimal_to_cents(input).is_err());
    }

    #[rstest]
    fn round_trips_through_both_conversions() {
        for cents in [0_i64, 1, 99, 100, 1234, 999_999] {
            let decimal = cents_to_decimal(cents);
            assert_eq!(decimal_to_cents(&decimal), Ok(cents));
        }
    }
}
