//! TonLink service library.
//!
//! This crate provides the registration service as a library, allowing it to
//! be tested and reused. The binary in `main.rs` wires the two execution
//! contexts together: the Telegram long-poll loop and the axum HTTP server.
//! The two contexts never call each other - all coordination goes through
//! the SQLite store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bot;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod telegram;
