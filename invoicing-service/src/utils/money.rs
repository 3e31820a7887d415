//! Line totals and display formatting for invoice amounts.

use crate::models::{Currency, CurrencyError};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use thiserror::Error;

/// Largest amount a quantity, rate or total may take: 999,999,999,999,999.99,
/// the top of the `NUMERIC(19, 4)` columns at cent precision.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_569_325_055, 23_283_064, 0, false, 2);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TotalError {
    #[error("Total cannot be negative (got {0})")]
    Negative(Decimal),

    #[error("Total must be at most 999,999,999,999,999.99")]
    Overflow,
}

/// Parse a user-typed amount. Blank or unparseable input counts as zero, the
/// same way the form's live total treats it.
pub fn parse_amount(input: &str) -> Decimal {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }

    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or(Decimal::ZERO)
}

/// `quantity * rate`, refusing negative products and any above `MAX_AMOUNT`.
pub fn line_total(quantity: Decimal, rate: Decimal) -> Result<Decimal, TotalError> {
    let total = quantity.checked_mul(rate).ok_or(TotalError::Overflow)?;
    if total.is_sign_negative() && !total.is_zero() {
        return Err(TotalError::Negative(total));
    }
    if total > MAX_AMOUNT {
        return Err(TotalError::Overflow);
    }
    Ok(total)
}

/// Total for raw form input.
pub fn compute_total(quantity: &str, rate: &str) -> Result<Decimal, TotalError> {
    line_total(parse_amount(quantity), parse_amount(rate))
}

/// Render an amount the way the dashboard displays money: symbol prefix,
/// thousands separators, two fraction digits, half-away-from-zero rounding.
pub fn format_currency(amount: Decimal, currency: Currency) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let digits = format!("{:.2}", rounded.abs());
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!(
        "{}{}{}.{}",
        if negative { "-" } else { "" },
        currency.symbol(),
        grouped,
        fraction
    )
}

/// Format against a raw currency code; unknown codes are refused rather than
/// rendered with a guessed symbol.
pub fn format_amount(amount: Decimal, code: &str) -> Result<String, CurrencyError> {
    let currency = Currency::from_str(code)?;
    Ok(format_currency(amount, currency))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn total_is_quantity_times_rate() {
        assert_eq!(compute_total("3", "150.00"), Ok(d("450.00")));
        assert_eq!(compute_total("2.5", "10"), Ok(d("25")));
        assert_eq!(compute_total("0", "99.99"), Ok(Decimal::ZERO));
    }

    #[test]
    fn unparseable_input_counts_as_zero() {
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("abc"), Decimal::ZERO);
        assert_eq!(parse_amount("  4 "), d("4"));
        assert_eq!(parse_amount("1e3"), d("1000"));
        assert_eq!(compute_total("three", "150"), Ok(Decimal::ZERO));
    }

    #[test]
    fn negative_total_is_an_error() {
        assert_eq!(
            compute_total("-2", "10"),
            Err(TotalError::Negative(d("-20")))
        );
        assert_eq!(compute_total("-2", "-10"), Ok(d("20")));
        assert_eq!(compute_total("-2", "0"), Ok(Decimal::ZERO));
    }

    #[test]
    fn overflow_is_an_error() {
        assert_eq!(line_total(Decimal::MAX, d("2")), Err(TotalError::Overflow));
    }

    #[test]
    fn totals_are_capped_at_storage_limit() {
        assert_eq!(MAX_AMOUNT, d("999999999999999.99"));
        assert_eq!(line_total(MAX_AMOUNT, d("1")), Ok(MAX_AMOUNT));
        assert_eq!(line_total(MAX_AMOUNT, d("1.01")), Err(TotalError::Overflow));
        assert_eq!(
            compute_total("50000000000000000000000000000", "1"),
            Err(TotalError::Overflow)
        );
    }

    #[test]
    fn formats_usd() {
        assert_eq!(format_currency(d("450"), Currency::Usd), "$450.00");
        assert_eq!(format_currency(d("0"), Currency::Usd), "$0.00");
        assert_eq!(
            format_currency(d("1234567.891"), Currency::Usd),
            "$1,234,567.89"
        );
    }

    #[test]
    fn formats_eur() {
        assert_eq!(format_currency(d("1234.5"), Currency::Eur), "€1,234.50");
        assert_eq!(format_currency(d("100000"), Currency::Eur), "€100,000.00");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(format_currency(d("0.005"), Currency::Usd), "$0.01");
        assert_eq!(format_currency(d("2.344"), Currency::Usd), "$2.34");
        assert_eq!(format_currency(d("-0.001"), Currency::Usd), "$0.00");
    }

    #[test]
    fn negative_amounts_lead_with_sign() {
        assert_eq!(format_currency(d("-5"), Currency::Usd), "-$5.00");
        assert_eq!(format_currency(d("-1999.999"), Currency::Eur), "-€2,000.00");
    }

    #[test]
    fn unsupported_codes_fail_closed() {
        assert_eq!(format_amount(d("450"), "USD"), Ok("$450.00".to_string()));
        assert_eq!(
            format_amount(d("450"), "JPY"),
            Err(CurrencyError::Unsupported("JPY".to_string()))
        );
    }
}
