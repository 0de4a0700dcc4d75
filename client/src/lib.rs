//! Client for the user directory API.
//!
//! The crate drives the user details and roles screens through an observable
//! fetch controller. The domain is transport agnostic; `outbound::directory`
//! provides the reqwest-backed directory source and `inbound::terminal`
//! renders controller state as text.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;
