//! Pure price resolution: discount application, currency conversion, rounding.
//!
//! All math happens on `rust_decimal::Decimal` in the store's base currency
//! until the final conversion step. Nothing here touches the database.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Conversion data for one non-base currency.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ExchangeRate {
    pub code: String,
    pub exchange_rate: Decimal,
    pub correction_factor: Option<Decimal>,
}

/// Final price for one (product, user, currency) resolution.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Quote {
    pub price: Decimal,
    pub currency_code: String,
}

/// `base_price * (1 - percentage/100)`, unrounded.
pub fn apply_discount(base_price: Decimal, percentage: Decimal) -> Decimal {
    base_price * (Decimal::ONE - percentage / Decimal::ONE_HUNDRED)
}

/// Convert a base-currency amount into the target currency.
///
/// A missing correction factor means no correction (factor of 1).
pub fn convert(amount: Decimal, rate: &ExchangeRate) -> Decimal {
    amount * rate.exchange_rate * rate.correction_factor.unwrap_or(Decimal::ONE)
}

/// Round to 2 decimal places, half-up.
pub fn round_price(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// The full resolution: discount in base currency, then conversion, then
/// rounding. `requested_code` is echoed back verbatim even when no matching
/// currency row was found and the amount stayed in base currency.
pub fn quote(
    base_price: Decimal,
    discount: Option<Decimal>,
    target: Option<&ExchangeRate>,
    requested_code: &str,
) -> Quote {
    let discounted = match discount {
        Some(pct) => apply_discount(base_price, pct),
        None => base_price,
    };
    let amount = match target {
        Some(rate) => convert(discounted, rate),
        None => discounted,
    };
    Quote {
        price: round_price(amount),
        currency_code: requested_code.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn usd(rate: &str, correction: Option<&str>) -> ExchangeRate {
        ExchangeRate {
            code: "USD".into(),
            exchange_rate: dec(rate),
            correction_factor: correction.map(dec),
        }
    }

    #[test]
    fn test_no_discount_is_identity() {
        assert_eq!(apply_discount(dec("1000.00"), Decimal::ZERO), dec("1000.00"));
        assert_eq!(
            quote(dec("1000.00"), None, None, "RUB"),
            Quote { price: dec("1000.00"), currency_code: "RUB".into() }
        );
    }

    #[test]
    fn test_percentage_discount() {
        assert_eq!(apply_discount(dec("1000.00"), dec("10")), dec("900.0000"));
        assert_eq!(apply_discount(dec("1000.00"), dec("100")), Decimal::ZERO);
        // 1e-9 tolerance on an awkward percentage
        let got = apply_discount(dec("99.99"), dec("33.33"));
        let want = dec("66.663333");
        assert!((got - want).abs() < dec("0.000000001"));
    }

    #[test]
    fn test_conversion_is_linear() {
        let rate = usd("0.011", None);
        let k = dec("7");
        let amount = dec("1234.56");
        assert_eq!(convert(k * amount, &rate), k * convert(amount, &rate));
    }

    #[test]
    fn test_correction_factor_multiplies() {
        let plain = usd("0.011", None);
        let corrected = usd("0.011", Some("1.05"));
        assert_eq!(convert(dec("1000"), &plain), dec("11.000"));
        assert_eq!(convert(dec("1000"), &corrected), dec("11.55000"));
    }

    #[test]
    fn test_rounding_half_up_two_places() {
        assert_eq!(round_price(dec("11.005")), dec("11.01"));
        assert_eq!(round_price(dec("11.004")), dec("11.00"));
        assert_eq!(round_price(dec("900")), dec("900"));
        assert!(round_price(dec("3.14159")).scale() <= 2);
    }

    #[test]
    fn test_quote_discount_then_convert() {
        // 10% off 1000 RUB, then to USD at 0.011 = 9.90
        let q = quote(dec("1000.00"), Some(dec("10")), Some(&usd("0.011", None)), "USD");
        assert_eq!(q, Quote { price: dec("9.90"), currency_code: "USD".into() });
    }

    #[test]
    fn test_quote_discount_in_base_currency() {
        let q = quote(dec("1000.00"), Some(dec("10")), None, "RUB");
        assert_eq!(q, Quote { price: dec("900.00"), currency_code: "RUB".into() });
    }

    #[test]
    fn test_quote_conversion_no_discount() {
        let q = quote(dec("1000.00"), None, Some(&usd("0.011", None)), "USD");
        assert_eq!(q.price, dec("11.00"));
        assert_eq!(q.currency_code, "USD");
    }

    #[test]
    fn test_quote_unknown_currency_echoes_requested_code() {
        // No rate row found: amount stays in base currency, code is echoed.
        let q = quote(dec("1000.00"), None, None, "ZZZ");
        assert_eq!(q, Quote { price: dec("1000.00"), currency_code: "ZZZ".into() });
    }
}
