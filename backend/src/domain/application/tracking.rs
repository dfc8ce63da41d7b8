//! Public tracking numbers.
//!
//! Format: `BA`, the last eight digits of the submission time in epoch
//! milliseconds, then four upper-case base-36 characters.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

const PREFIX: &str = "BA";
const TIMESTAMP_DIGITS: usize = 8;
const SUFFIX_LEN: usize = 4;
const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Tracking number did not match the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tracking number must look like BA########XXXX")]
pub struct TrackingNumberError;

/// Unique, immutable public reference for an application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingNumber(String);

impl TrackingNumber {
    /// Total length of a tracking number.
    pub const LEN: usize = PREFIX.len() + TIMESTAMP_DIGITS + SUFFIX_LEN;

    /// Generate a candidate for a submission at `now`.
    ///
    /// Candidates are not guaranteed unique; callers check the store and
    /// retry on collision.
    pub fn generate<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Self {
        let millis = now.timestamp_millis().rem_euclid(100_000_000);
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
            .collect();
        Self(format!("{PREFIX}{millis:0width$}{suffix}", width = TIMESTAMP_DIGITS))
    }

    /// Parse a tracking number, accepting lower-case input.
    pub fn parse(raw: &str) -> Result<Self, TrackingNumberError> {
        let candidate = raw.trim().to_ascii_uppercase();
        if !candidate.is_ascii() || candidate.len() != Self::LEN || !candidate.starts_with(PREFIX) {
            return Err(TrackingNumberError);
        }
        let (digits, suffix) = candidate[PREFIX.len()..].split_at(TIMESTAMP_DIGITS);
        let digits_ok = digits.bytes().all(|b| b.is_ascii_digit());
        let suffix_ok = suffix
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase());
        if !(digits_ok && suffix_ok) {
            return Err(TrackingNumberError);
        }
        Ok(Self(candidate))
    }

    /// Borrow the textual form.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TrackingNumber {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<TrackingNumber> for String {
    fn from(value: TrackingNumber) -> Self {
        value.0
    }
}

impl TryFrom<String> for TrackingNumber {
    type Error = TrackingNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}
