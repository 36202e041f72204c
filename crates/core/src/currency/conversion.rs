//! Conversion of expense amounts into a company's base currency.
//!
//! Converted amounts keep two decimal places and use banker's rounding
//! (round half to even). The original amount and currency stay on the
//! expense next to the converted value.

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use rust_decimal_macros::dec;

/// Decimal places kept on converted expense amounts.
pub const CONVERTED_DECIMAL_PLACES: u32 = 2;

/// Largest amount an expense can carry: 13 integer digits and 2 decimals.
pub const MAX_AMOUNT: Decimal = dec!(9999999999999.99);

/// Converts an amount using the given exchange rate.
///
/// Returns `None` if the product does not fit in a `Decimal`.
#[must_use]
pub fn convert_amount(amount: Decimal, rate: Decimal, decimal_places: u32) -> Option<Decimal> {
    amount
        .checked_mul(rate)
        .map(|converted| {
            converted.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_amount() {
        // 100 USD * 74.5 = 7450 INR
        let result = convert_amount(dec!(100), dec!(74.5), CONVERTED_DECIMAL_PLACES);
        assert_eq!(result, Some(dec!(7450.00)));
    }

    #[test]
    fn test_convert_with_rounding() {
        // 12.34 EUR * 1.18 = 14.5612 USD -> 14.56
        let result = convert_amount(dec!(12.34), dec!(1.18), CONVERTED_DECIMAL_PLACES);
        assert_eq!(result, Some(dec!(14.56)));
    }

    #[test]
    fn test_bankers_rounding() {
        // 2.5 rounds to 2, 3.5 rounds to 4
        assert_eq!(convert_amount(dec!(1), dec!(2.5), 0), Some(dec!(2)));
        assert_eq!(convert_amount(dec!(1), dec!(3.5), 0), Some(dec!(4)));
        // 0.125 -> 0.12, 0.135 -> 0.14
        assert_eq!(convert_amount(dec!(0.125), Decimal::ONE, 2), Some(dec!(0.12)));
        assert_eq!(convert_amount(dec!(0.135), Decimal::ONE, 2), Some(dec!(0.14)));
    }

    #[test]
    fn test_overflow_is_none() {
        assert_eq!(convert_amount(Decimal::MAX, dec!(110), 2), None);
        assert_eq!(convert_amount(dec!(1000000000000000000000000000), dec!(110), 2), None);
    }
}
