//! Core domain + pipeline logic for the group transfer bot.
//!
//! This crate is intentionally framework-agnostic. The Telegram Bot API and
//! the high-privilege user API live behind ports (traits) implemented in
//! adapter crates; the transfer pipeline here only sees injected handles.

pub mod admins;
pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod governor;
pub mod logging;
pub mod ports;
pub mod roster;
pub mod transfer;

#[cfg(test)]
pub(crate) mod testutil;

pub use errors::{Error, Result};
