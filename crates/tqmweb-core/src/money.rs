//! Money parsing and formatting

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use tqmweb_utils::{format_number, numeric_chars};

use crate::error::{CoreError, CoreResult};

/// Largest cost or payment magnitude accepted from a request
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Round half-up (away from zero) to two decimals
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Render as `"<currency> #,##0.00"`
pub fn format_money(amount: Decimal, currency: &str) -> String {
    let rounded = round_money(amount);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let digits = format!("{:.2}", rounded.abs());
    let (whole, frac) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    format!("{} {}{}.{}", currency, sign, format_number(whole), frac)
}

/// `format_money` with the PKR label
pub fn format_pkr(amount: Decimal) -> String {
    format_money(amount, "PKR")
}

/// Plain two-decimal rendering without currency or grouping, for form inputs
pub fn plain_amount(amount: Decimal) -> String {
    format!("{:.2}", round_money(amount))
}

/// Parse loosely: non-numeric characters are dropped, garbage becomes zero
pub fn parse_lenient(text: &str) -> Decimal {
    let cleaned = numeric_chars(text);
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(&cleaned).unwrap_or(Decimal::ZERO)
}

/// `parse_lenient` over a JSON string or number
pub fn parse_lenient_value(value: &serde_json::Value) -> Decimal {
    match value {
        serde_json::Value::String(s) => parse_lenient(s),
        serde_json::Value::Number(n) => parse_number(n).unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

/// Strict parse of a JSON string or number; anything else is a validation error
pub fn parse_strict_value(value: &serde_json::Value, field: &str) -> CoreResult<Decimal> {
    let parsed = match value {
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        serde_json::Value::Number(n) => parse_number(n),
        _ => None,
    };
    parsed.ok_or_else(|| CoreError::validation(format!("Invalid {}: {}", field, value)))
}

/// Reject request amounts above [`MAX_AMOUNT`] in either direction
pub fn ensure_in_range(amount: Decimal, field: &str) -> CoreResult<Decimal> {
    if amount.abs() > Decimal::from(MAX_AMOUNT) {
        return Err(CoreError::validation(format!(
            "{} must not exceed {}",
            field,
            format_number(MAX_AMOUNT)
        )));
    }
    Ok(amount)
}

/// Sum without panicking on overflow
pub fn checked_sum<I: IntoIterator<Item = Decimal>>(amounts: I) -> CoreResult<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
        .ok_or_else(overflow)
}

pub(crate) fn overflow() -> CoreError {
    CoreError::Internal {
        message: "amount overflow while totalling".to_string(),
    }
}

fn parse_number(n: &serde_json::Number) -> Option<Decimal> {
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_format_pkr() {
        assert_eq!(format_pkr(dec("1000")), "PKR 1,000.00");
        assert_eq!(format_pkr(dec("950")), "PKR 950.00");
        assert_eq!(format_pkr(dec("-50")), "PKR -50.00");
        assert_eq!(format_pkr(dec("1234567.891")), "PKR 1,234,567.89");
        assert_eq!(format_pkr(Decimal::ZERO), "PKR 0.00");
    }

    #[test]
    fn test_rounds_half_up() {
        assert_eq!(format_pkr(dec("2.345")), "PKR 2.35");
        assert_eq!(format_pkr(dec("2.344")), "PKR 2.34");
        assert_eq!(format_pkr(dec("-2.345")), "PKR -2.35");
        assert_eq!(format_pkr(dec("999.995")), "PKR 1,000.00");
    }

    #[test]
    fn test_negative_zero_has_no_sign() {
        assert_eq!(format_pkr(dec("-0.001")), "PKR 0.00");
    }

    #[test]
    fn test_custom_currency() {
        assert_eq!(format_money(dec("12.5"), "LKR"), "LKR 12.50");
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(parse_lenient("200"), dec("200"));
        assert_eq!(parse_lenient("PKR 1,250.50"), dec("1250.50"));
        assert_eq!(parse_lenient("-30"), dec("-30"));
        assert_eq!(parse_lenient(""), Decimal::ZERO);
        assert_eq!(parse_lenient("abc"), Decimal::ZERO);
        assert_eq!(parse_lenient("1.2.3"), Decimal::ZERO);
    }

    #[test]
    fn test_parse_lenient_value() {
        assert_eq!(parse_lenient_value(&json!("30")), dec("30"));
        assert_eq!(parse_lenient_value(&json!(12.5)), dec("12.5"));
        assert_eq!(parse_lenient_value(&json!(null)), Decimal::ZERO);
        assert_eq!(parse_lenient_value(&json!([1])), Decimal::ZERO);
    }

    #[test]
    fn test_parse_strict_value() {
        assert_eq!(parse_strict_value(&json!(1500), "amount").unwrap(), dec("1500"));
        assert_eq!(parse_strict_value(&json!("99.5"), "amount").unwrap(), dec("99.5"));
        assert!(parse_strict_value(&json!("ten"), "amount").is_err());
        assert!(parse_strict_value(&json!(null), "amount").is_err());
    }

    #[test]
    fn test_ensure_in_range() {
        assert_eq!(ensure_in_range(dec("1000000000000"), "Amount").unwrap(), dec("1000000000000"));
        assert_eq!(ensure_in_range(dec("-250"), "Amount").unwrap(), dec("-250"));
        let err = ensure_in_range(dec("79228162514264337593543950335"), "Amount").unwrap_err();
        assert_eq!(err.to_string(), "Amount must not exceed 1,000,000,000,000");
        assert!(ensure_in_range(dec("-1000000000000.01"), "Amount").is_err());
    }

    #[test]
    fn test_checked_sum() {
        assert_eq!(checked_sum(vec![dec("1.5"), dec("2.25")]).unwrap(), dec("3.75"));
        assert_eq!(checked_sum(Vec::new()).unwrap(), Decimal::ZERO);
        let err = checked_sum(vec![Decimal::MAX, Decimal::ONE]).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InternalError);
    }

    #[test]
    fn test_plain_amount() {
        assert_eq!(plain_amount(dec("200")), "200.00");
        assert_eq!(plain_amount(dec("12.345")), "12.35");
    }
}
