//! Platform-agnostic core of the Telegram ⇄ Messenger bridge.
//!
//! The platform SDKs live behind ports (traits) implemented in adapter
//! crates: teloxide in `tmb-telegram`, the Messenger client behind the
//! `MessengerApi` trait in `tmb-messenger`. This crate owns the normalized
//! message model, the composer, the attachment pipeline and the routing /
//! identity tables they share.

pub mod attach;
pub mod compose;
pub mod config;
pub mod errors;
pub mod identity;
pub mod logging;
pub mod message;
pub mod outbound;
pub mod routing;

pub use errors::{Error, Result};
