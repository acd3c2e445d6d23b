//! AuthGate Backend Library
//!
//! Account registration and credential login with signed 24-hour tokens.
//! Exposes the modules used by the `authgate` binary and the integration tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod middleware;
