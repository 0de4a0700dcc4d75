//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **directory**: reqwest-backed reader for the user directory REST API.
//!
//! Adapters translate between transport and domain types. They contain no
//! fetch lifecycle logic.

pub mod directory;
