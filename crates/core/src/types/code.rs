//! Referral code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ReferralCode`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum ReferralCodeError {
    /// The input string is empty.
    #[error("referral code cannot be empty")]
    Empty,
    /// The input string has the wrong length.
    #[error("referral code must be exactly {expected} characters (got {got})")]
    WrongLength {
        /// Required length.
        expected: usize,
        /// Length of the input.
        got: usize,
    },
    /// The input contains a character outside the code alphabet.
    #[error("referral code may only contain A-Z and 0-9")]
    InvalidCharacter,
}

/// A referral code.
///
/// Every registered user owns exactly one code (their "personal code"), and
/// may record at most one other user's code as the referral they arrived
/// through. Codes are fixed-length and drawn from an uppercase-alphanumeric
/// alphabet so they survive being typed from a phone keyboard.
///
/// ## Constraints
///
/// - Exactly 8 characters
/// - Characters limited to `A-Z` and `0-9`
///
/// ## Examples
///
/// ```
/// use tonlink_core::ReferralCode;
///
/// assert!(ReferralCode::parse("AB12CD34").is_ok());
///
/// assert!(ReferralCode::parse("").is_err());         // empty
/// assert!(ReferralCode::parse("short").is_err());    // wrong length
/// assert!(ReferralCode::parse("ab12cd34").is_err()); // lowercase
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ReferralCode(String);

impl ReferralCode {
    /// Fixed length of a referral code.
    pub const LENGTH: usize = 8;

    /// Alphabet codes are drawn from.
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    /// Parse a `ReferralCode` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty
    /// - Is not exactly [`Self::LENGTH`] characters
    /// - Contains characters outside `A-Z0-9`
    pub fn parse(s: &str) -> Result<Self, ReferralCodeError> {
        if s.is_empty() {
            return Err(ReferralCodeError::Empty);
        }

        if s.len() != Self::LENGTH {
            return Err(ReferralCodeError::WrongLength {
                expected: Self::LENGTH,
                got: s.len(),
            });
        }

        if !s.bytes().all(|b| Self::ALPHABET.contains(&b)) {
            return Err(ReferralCodeError::InvalidCharacter);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `ReferralCode` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ReferralCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
