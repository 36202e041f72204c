//! Exchange rate types and logic.

use reimburse_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exchange rate between two currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Source currency code.
    pub from_currency: CurrencyCode,
    /// Target currency code.
    pub to_currency: CurrencyCode,
    /// Exchange rate (1 from_currency = rate to_currency).
    pub rate: Decimal,
}

impl ExchangeRate {
    /// Creates a new exchange rate.
    #[must_use]
    pub const fn new(from_currency: CurrencyCode, to_currency: CurrencyCode, rate: Decimal) -> Self {
        Self {
            from_currency,
            to_currency,
            rate,
        }
    }

    /// Returns the inverse rate, or `None` when the rate is zero.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let rate = Decimal::ONE.checked_div(self.rate)?;
        Some(Self {
            from_currency: self.to_currency,
            to_currency: self.from_currency,
            rate,
        })
    }
}
