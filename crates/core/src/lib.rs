//! TonLink Core - Shared types library.
//!
//! This crate provides common types used across all TonLink components:
//! - `service` - Registration service binary (Telegram bot loop + HTTP server)
//! - `integration-tests` - Cross-module scenario tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, referral codes, and
//!   wallet addresses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
