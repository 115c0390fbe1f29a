//! Messenger adapter.
//!
//! The chat-network client itself is an external collaborator behind the
//! [`api::MessengerApi`] trait; this crate owns everything around it: the
//! inbound event model, context extraction, the relay loop toward Telegram
//! and the outbound `MessengerPort` implementation.

pub mod api;
pub mod event;
pub mod extract;
pub mod relay;
pub mod send;
