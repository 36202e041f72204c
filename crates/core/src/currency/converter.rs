//! Static-table currency converter.
//!
//! The converter is a pure function over reference data: no I/O, no retries.
//! A live-rate provider can replace the table without changing `convert`.

use std::collections::HashMap;

use reimburse_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

use super::conversion::{CONVERTED_DECIMAL_PLACES, MAX_AMOUNT, convert_amount};
use super::exchange::ExchangeRate;

/// Errors raised while converting an amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// No rate path exists between the two currencies.
    #[error("Currency conversion from {from} to {to} is not supported")]
    ConversionUnavailable {
        /// Source currency.
        from: CurrencyCode,
        /// Target currency.
        to: CurrencyCode,
    },

    /// Amount is zero or negative.
    #[error("Amount must be greater than zero, got {0}")]
    InvalidAmount(Decimal),

    /// Amount, before or after conversion, exceeds [`MAX_AMOUNT`].
    #[error("Amount {0} is too large to convert")]
    OutOfRange(Decimal),
}

impl ConversionError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        400
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ConversionUnavailable { .. } => "CONVERSION_UNAVAILABLE",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::OutOfRange(_) => "AMOUNT_OUT_OF_RANGE",
        }
    }
}

/// Directional rate table keyed by `(from, to)`.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: HashMap<(CurrencyCode, CurrencyCode), Decimal>,
}

impl RateTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from a list of rates.
    #[must_use]
    pub fn from_rates(rates: impl IntoIterator<Item = ExchangeRate>) -> Self {
        let mut table = Self::new();
        for rate in rates {
            table.insert(rate);
        }
        table
    }

    /// Inserts or replaces a directional rate.
    pub fn insert(&mut self, rate: ExchangeRate) {
        self.rates
            .insert((rate.from_currency, rate.to_currency), rate.rate);
    }

    /// Looks up the rate for `from -> to`.
    ///
    /// Falls back to the inverse of `to -> from` when only the opposite
    /// direction is listed.
    #[must_use]
    pub fn lookup(&self, from: CurrencyCode, to: CurrencyCode) -> Option<Decimal> {
        if let Some(rate) = self.rates.get(&(from, to)) {
            return Some(*rate);
        }
        let reverse = self.rates.get(&(to, from))?;
        ExchangeRate::new(to, from, *reverse)
            .inverse()
            .map(|inverse| inverse.rate)
    }

    /// Returns true if the table knows the currency on either side of a pair.
    #[must_use]
    pub fn supports(&self, currency: CurrencyCode) -> bool {
        self.rates
            .keys()
            .any(|(from, to)| *from == currency || *to == currency)
    }

    /// The built-in reference table for USD, EUR, GBP, INR and JPY.
    #[must_use]
    pub fn reference() -> Self {
        use CurrencyCode as C;

        Self::from_rates([
            ExchangeRate::new(C::USD, C::EUR, dec!(0.85)),
            ExchangeRate::new(C::USD, C::GBP, dec!(0.73)),
            ExchangeRate::new(C::USD, C::INR, dec!(74.5)),
            ExchangeRate::new(C::USD, C::JPY, dec!(110)),
            ExchangeRate::new(C::EUR, C::USD, dec!(1.18)),
            ExchangeRate::new(C::EUR, C::GBP, dec!(0.86)),
            ExchangeRate::new(C::EUR, C::INR, dec!(87.5)),
            ExchangeRate::new(C::EUR, C::JPY, dec!(129.5)),
            ExchangeRate::new(C::GBP, C::USD, dec!(1.37)),
            ExchangeRate::new(C::GBP, C::EUR, dec!(1.16)),
            ExchangeRate::new(C::GBP, C::INR, dec!(101.5)),
            ExchangeRate::new(C::GBP, C::JPY, dec!(150)),
            ExchangeRate::new(C::INR, C::USD, dec!(0.013)),
            ExchangeRate::new(C::INR, C::EUR, dec!(0.011)),
            ExchangeRate::new(C::INR, C::GBP, dec!(0.0098)),
            ExchangeRate::new(C::INR, C::JPY, dec!(1.47)),
            ExchangeRate::new(C::JPY, C::USD, dec!(0.0091)),
            ExchangeRate::new(C::JPY, C::EUR, dec!(0.0077)),
            ExchangeRate::new(C::JPY, C::GBP, dec!(0.0067)),
            ExchangeRate::new(C::JPY, C::INR, dec!(0.68)),
        ])
    }
}

/// Converts expense amounts into a company's base currency.
#[derive(Debug, Clone)]
pub struct CurrencyConverter {
    table: RateTable,
}

impl Default for CurrencyConverter {
    fn default() -> Self {
        Self::new(RateTable::reference())
    }
}

impl CurrencyConverter {
    /// Creates a converter over the given table.
    #[must_use]
    pub const fn new(table: RateTable) -> Self {
        Self { table }
    }

    /// Returns the underlying rate table.
    #[must_use]
    pub const fn table(&self) -> &RateTable {
        &self.table
    }

    /// Converts `amount` from one currency to another.
    ///
    /// Same-currency conversion returns the amount unchanged. Otherwise the
    /// result is rounded to two decimal places with banker's rounding.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::InvalidAmount` for non-positive amounts,
    /// `ConversionError::OutOfRange` when the amount or its conversion exceeds
    /// [`MAX_AMOUNT`] and `ConversionError::ConversionUnavailable` when no rate
    /// path exists.
    pub fn convert(
        &self,
        amount: Decimal,
        from: CurrencyCode,
        to: CurrencyCode,
    ) -> Result<Decimal, ConversionError> {
        if amount <= Decimal::ZERO {
            return Err(ConversionError::InvalidAmount(amount));
        }
        if amount > MAX_AMOUNT {
            return Err(ConversionError::OutOfRange(amount));
        }
        if from == to {
            return Ok(amount);
        }

        let rate = self
            .table
            .lookup(from, to)
            .ok_or(ConversionError::ConversionUnavailable { from, to })?;

        convert_amount(amount, rate, CONVERTED_DECIMAL_PLACES)
            .filter(|converted| *converted <= MAX_AMOUNT)
            .ok_or(ConversionError::OutOfRange(amount))
    }
}
