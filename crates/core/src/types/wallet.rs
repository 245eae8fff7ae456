//! Wallet address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`WalletAddress`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum WalletAddressError {
    /// The input string is empty.
    #[error("wallet address cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("wallet address must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains whitespace or control characters.
    #[error("wallet address must not contain whitespace or control characters")]
    InvalidCharacter,
}

/// A TON wallet address, as reported by the wallet provider.
///
/// The service never verifies signatures or reads the chain; the address is
/// an opaque, client-attested string. Validation is limited to shape checks
/// that keep garbage out of the ledger: non-empty, bounded length, no
/// whitespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Maximum length of a wallet address.
    ///
    /// Raw and user-friendly TON address forms both fit well under this;
    /// the bound exists to reject abuse, not to validate encoding.
    pub const MAX_LENGTH: usize = 128;

    /// Parse a `WalletAddress` from a string.
    ///
    /// Leading and trailing whitespace is trimmed before validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`Self::MAX_LENGTH`], or contains whitespace or control characters.
    pub fn parse(s: &str) -> Result<Self, WalletAddressError> {
        let s = s.trim();

        if s.is_empty() {
            return Err(WalletAddressError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(WalletAddressError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(WalletAddressError::InvalidCharacter);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `WalletAddress` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let addr = WalletAddress::parse("EQabc123xyz").expect("valid address");
        assert_eq!(addr.as_str(), "EQabc123xyz");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let addr = WalletAddress::parse("  EQabc123xyz  ").expect("valid address");
        assert_eq!(addr.as_str(), "EQabc123xyz");
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(
            WalletAddress::parse(""),
            Err(WalletAddressError::Empty)
        ));
        assert!(matches!(
            WalletAddress::parse("   "),
            Err(WalletAddressError::Empty)
        ));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "E".repeat(WalletAddress::MAX_LENGTH + 1);
        assert!(matches!(
            WalletAddress::parse(&long),
            Err(WalletAddressError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_interior_whitespace() {
        assert!(matches!(
            WalletAddress::parse("EQ abc"),
            Err(WalletAddressError::InvalidCharacter)
        ));
        assert!(matches!(
            WalletAddress::parse("EQ\tabc"),
            Err(WalletAddressError::InvalidCharacter)
        ));
    }

    #[test]
    fn test_max_length_boundary() {
        let exact = "E".repeat(WalletAddress::MAX_LENGTH);
        assert!(WalletAddress::parse(&exact).is_ok());
    }
}
