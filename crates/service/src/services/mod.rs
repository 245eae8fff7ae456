//! Business logic services.
//!
//! - [`registration`] - Wallet-link handshake and ledger orchestration
//! - [`rewards`] - Read-through client for the external reward counter

pub mod registration;
pub mod rewards;

pub use registration::{RegistrationService, SubmitError, SubmitOutcome};
pub use rewards::RewardsClient;
