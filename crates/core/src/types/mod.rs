//! Core types for TonLink.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod code;
pub mod id;
pub mod wallet;

pub use code::{ReferralCode, ReferralCodeError};
pub use id::*;
pub use wallet::{WalletAddress, WalletAddressError};
