//! Inbound adapters that present controller state.
//!
//! - **terminal**: plain-text screens for the `roster` binary.

pub mod terminal;
