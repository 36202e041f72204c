//! Currency codes carried on companies and expenses.

use serde::{Deserialize, Serialize};

/// ISO 4217-shaped currency code: exactly three uppercase ASCII letters.
///
/// Whether a rate exists for the code is decided by the converter, not here,
/// so `XYZ` is a valid code that simply cannot be converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    /// US Dollar.
    pub const USD: Self = Self(*b"USD");
    /// Euro.
    pub const EUR: Self = Self(*b"EUR");
    /// Pound Sterling.
    pub const GBP: Self = Self(*b"GBP");
    /// Indian Rupee.
    pub const INR: Self = Self(*b"INR");
    /// Japanese Yen.
    pub const JPY: Self = Self(*b"JPY");

    /// Parses a currency code, accepting lowercase input.
    ///
    /// # Errors
    ///
    /// Returns an error message if the input is not three ASCII letters.
    pub fn parse(s: &str) -> Result<Self, String> {
        let trimmed = s.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(format!("Invalid currency code: {s}"));
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
            bytes[2].to_ascii_uppercase(),
        ]))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ASCII letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_string()
    }
}
