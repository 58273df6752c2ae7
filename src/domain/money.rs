use rust_decimal::Decimal;
use thiserror::Error;

/// Validation errors for wire amounts and currency codes.
///
/// Kept separate from `DomainError` because these checks run before any
/// entity or repository is involved — at the edge of request parsing as
/// well as inside the ledger engine, which re-validates everything it is
/// handed rather than trusting callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount must be strictly positive")]
    NotPositive,
    #[error("amount must have exactly two fractional digits")]
    BadScale,
    #[error("currency must be a 3-letter uppercase ISO 4217 code")]
    BadCurrency,
}

/// Confirms `amount` is strictly positive and carries at most two
/// fractional digits (the ledger and orchestrator never accept more).
pub fn ensure_positive_two_dp(amount: Decimal) -> Result<(), MoneyError> {
    if amount <= Decimal::ZERO {
        return Err(MoneyError::NotPositive);
    }
    if amount.scale() > 2 {
        return Err(MoneyError::BadScale);
    }
    Ok(())
}

/// Validates a currency code: exactly three uppercase ASCII letters.
pub fn ensure_currency(currency: &str) -> Result<(), MoneyError> {
    if currency.len() == 3 && currency.bytes().all(|b| b.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(MoneyError::BadCurrency)
    }
}

/// Renders an amount the way the wire format requires: a decimal string
/// with exactly two fractional digits, e.g. `"100.00"`.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rejects_zero_and_negative() {
        assert_eq!(ensure_positive_two_dp(dec!(0.00)), Err(MoneyError::NotPositive));
        assert_eq!(ensure_positive_two_dp(dec!(-1.00)), Err(MoneyError::NotPositive));
    }

    #[test]
    fn rejects_extra_fractional_digits() {
        assert_eq!(ensure_positive_two_dp(dec!(1.005)), Err(MoneyError::BadScale));
    }

    #[test]
    fn accepts_two_dp_positive() {
        assert!(ensure_positive_two_dp(dec!(12.34)).is_ok());
        assert!(ensure_positive_two_dp(dec!(12)).is_ok());
    }

    #[test]
    fn currency_must_be_three_uppercase_letters() {
        assert!(ensure_currency("USD").is_ok());
        assert_eq!(ensure_currency("usd"), Err(MoneyError::BadCurrency));
        assert_eq!(ensure_currency("US"), Err(MoneyError::BadCurrency));
    }

    #[test]
    fn formats_with_two_fractional_digits() {
        assert_eq!(format_amount(dec!(100)), "100.00");
        assert_eq!(format_amount(dec!(99.5)), "99.50");
    }
}
