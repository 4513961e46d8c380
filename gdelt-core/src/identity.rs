//! Identity types: country codes and the day-keyed cache granularity.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A two-letter, FIPS-10-4-style country code, always stored upper-case.
///
/// Compile-time can't stop a caller from passing a bad string, but this
/// type stops a bad string from ever reaching a query or a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode([u8; 2]);

/// Error returned when a string doesn't parse as a [`CountryCode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid country code: {0:?} (expected exactly two ASCII letters)")]
pub struct CountryCodeParseError(pub String);

impl CountryCode {
    /// Construct a `CountryCode` from two raw bytes, upper-casing them.
    ///
    /// Panics if either byte is not an ASCII letter; prefer [`FromStr`] at
    /// system boundaries where the input isn't already validated.
    pub fn new(a: u8, b: u8) -> Self {
        assert!(a.is_ascii_alphabetic() && b.is_ascii_alphabetic());
        Self([a.to_ascii_uppercase(), b.to_ascii_uppercase()])
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).expect("country code is always valid ASCII")
    }
}

impl FromStr for CountryCode {
    type Err = CountryCodeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(|b| b.is_ascii_alphabetic()) {
            return Err(CountryCodeParseError(s.to_string()));
        }
        Ok(Self::new(bytes[0], bytes[1]))
    }
}

impl TryFrom<String> for CountryCode {
    type Error = CountryCodeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CountryCode> for String {
    fn from(value: CountryCode) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(country, calendar day)` — the canonical cache granularity.
///
/// Used directly as the key for coverage evaluation, single-flight
/// coordination, and per-day store queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey {
    pub country: CountryCode,
    pub date: NaiveDate,
}

impl DayKey {
    pub fn new(country: CountryCode, date: NaiveDate) -> Self {
        Self { country, date }
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.country, self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_codes() {
        assert_eq!("ch".parse::<CountryCode>().unwrap().as_str(), "CH");
        assert_eq!("US".parse::<CountryCode>().unwrap().as_str(), "US");
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!("USA".parse::<CountryCode>().is_err());
        assert!("1S".parse::<CountryCode>().is_err());
        assert!("".parse::<CountryCode>().is_err());
    }

    #[test]
    fn day_key_displays_as_country_slash_date() {
        let key = DayKey::new(
            "CH".parse().unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 21).unwrap(),
        );
        assert_eq!(key.to_string(), "CH/2026-01-21");
    }
}
