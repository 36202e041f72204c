//! Multi-currency handling and exchange rates.

pub mod conversion;
pub mod converter;
pub mod exchange;

#[cfg(test)]
mod props;

pub use conversion::{MAX_AMOUNT, convert_amount};
pub use converter::{ConversionError, CurrencyConverter, RateTable};
pub use exchange::ExchangeRate;
