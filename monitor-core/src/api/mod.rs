//! API Module
//!
//! Free-function surface over `MonitorHandle` for embedding callers.
//!
//! Usage:
//! - `api::start_monitoring(config, provider)` - validate + start a session
//! - `api::subscribe(&handle, SubscriptionKind::Change)` - untyped feed
//! - `api::stop_monitoring(handle)` - synchronous shutdown

pub mod commands;

pub use commands::*;
