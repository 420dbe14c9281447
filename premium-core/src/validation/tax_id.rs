//! Taiwanese business registration number (統一編號) check-digit validation.
//!
//! Each of the eight digits is multiplied by its positional weight
//! `[1, 2, 1, 2, 1, 2, 4, 1]` and the product folded to a single digit by
//! repeated digit summing. The folded values are summed:
//!
//! - if the seventh digit is `7`, its folded value is counted as `0` and the
//!   number is valid when the sum modulo 5 is `0` or `1`;
//! - otherwise the number is valid when the sum modulo 5 is `0`.
//!
//! ```
//! use premium_core::validation::is_valid;
//!
//! assert!(is_valid("10458575"));
//! assert!(!is_valid("88117126"));
//! assert!(!is_valid("1234567"));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const WEIGHTS: [u32; 8] = [1, 2, 1, 2, 1, 2, 4, 1];

/// Position of the digit that switches to the lenient rule when it is `7`.
const SPECIAL_POSITION: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxIdError {
    #[error("tax id must be exactly 8 ASCII digits")]
    InvalidFormat,

    #[error("tax id check digit does not match")]
    ChecksumMismatch,
}

/// Returns `true` when `id` is a well-formed business number whose check
/// digit matches. Malformed input yields `false`, never an error.
pub fn is_valid(id: &str) -> bool {
    check(id).is_ok()
}

fn check(id: &str) -> Result<(), TaxIdError> {
    let digits = parse_digits(id).ok_or(TaxIdError::InvalidFormat)?;

    let mut folded = [0u32; 8];
    for (slot, (digit, weight)) in folded.iter_mut().zip(digits.iter().zip(WEIGHTS)) {
        *slot = fold_digits(digit * weight);
    }

    let special = digits[SPECIAL_POSITION] == 7;
    if special {
        folded[SPECIAL_POSITION] = 0;
    }

    let remainder = folded.iter().sum::<u32>() % 5;
    let valid = if special {
        remainder == 0 || remainder == 1
    } else {
        remainder == 0
    };

    if valid {
        Ok(())
    } else {
        Err(TaxIdError::ChecksumMismatch)
    }
}

/// Exactly eight ASCII digits, untrimmed.
fn parse_digits(id: &str) -> Option<[u32; 8]> {
    let bytes = id.as_bytes();
    if bytes.len() != 8 {
        return None;
    }

    let mut digits = [0u32; 8];
    for (slot, byte) in digits.iter_mut().zip(bytes) {
        if !byte.is_ascii_digit() {
            return None;
        }
        *slot = u32::from(byte - b'0');
    }
    Some(digits)
}

/// Sums decimal digits until a single digit remains (18 -> 9, 28 -> 10 -> 1).
fn fold_digits(mut value: u32) -> u32 {
    while value >= 10 {
        let mut sum = 0;
        while value > 0 {
            sum += value % 10;
            value /= 10;
        }
        value = sum;
    }
    value
}

/// A business registration number that passed [`is_valid`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaxId(String);

impl TaxId {
    /// Validates `id` exactly as typed.
    ///
    /// # Errors
    ///
    /// - [`TaxIdError::InvalidFormat`] if `id` is not exactly 8 ASCII digits
    /// - [`TaxIdError::ChecksumMismatch`] if the check digit is wrong
    pub fn parse(id: &str) -> Result<Self, TaxIdError> {
        check(id)?;
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TaxId {
    type Err = TaxIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TaxId {
    type Error = TaxIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        check(&value)?;
        Ok(Self(value))
    }
}

impl From<TaxId> for String {
    fn from(id: TaxId) -> Self {
        id.0
    }
}

impl AsRef<str> for TaxId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaxId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}
