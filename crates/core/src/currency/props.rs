//! Property-based tests for currency conversion.

use proptest::prelude::*;
use reimburse_shared::types::CurrencyCode;
use rust_decimal::Decimal;

use super::converter::{ConversionError, CurrencyConverter};

/// Strategy to generate positive decimal amounts (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for the currencies in the reference table.
fn known_currency() -> impl Strategy<Value = CurrencyCode> {
    prop_oneof![
        Just(CurrencyCode::USD),
        Just(CurrencyCode::EUR),
        Just(CurrencyCode::GBP),
        Just(CurrencyCode::INR),
        Just(CurrencyCode::JPY),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Converting into the same currency never changes the amount.
    #[test]
    fn prop_same_currency_identity(amount in positive_amount(), currency in known_currency()) {
        let converter = CurrencyConverter::default();
        prop_assert_eq!(converter.convert(amount, currency, currency).unwrap(), amount);
    }

    /// Every pair in the reference table converts to a non-negative amount with
    /// at most two decimal places.
    #[test]
    fn prop_known_pairs_convert(
        amount in positive_amount(),
        from in known_currency(),
        to in known_currency(),
    ) {
        let converter = CurrencyConverter::default();
        let converted = converter.convert(amount, from, to).unwrap();
        prop_assert!(converted >= Decimal::ZERO);
        prop_assert!(converted.scale() <= 2 || from == to);
    }

    /// Unknown target currencies always fail with `ConversionUnavailable`.
    #[test]
    fn prop_unknown_currency_fails(amount in positive_amount(), from in known_currency()) {
        let converter = CurrencyConverter::default();
        let xyz = CurrencyCode::parse("XYZ").unwrap();
        let result = converter.convert(amount, from, xyz);
        let is_unavailable = matches!(result, Err(ConversionError::ConversionUnavailable { .. }));
        prop_assert!(is_unavailable);
    }
}
