//! Lifecycle phases of a UI-bound fetch.

use std::fmt;

/// Fieldless view of a [`FetchState`] used in logs, errors and outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Nothing requested yet.
    Idle,
    /// A request is in flight.
    Loading,
    /// The last request produced a payload.
    Success,
    /// The last request failed.
    Failure,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Failure => "failure",
        })
    }
}

/// Observable state of one controller.
///
/// ## Invariants
/// - Exactly one phase is current at any observable time.
/// - `Loading` is entered before a request starts and left exactly once when
///   it completes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchState<T> {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A request is in flight.
    Loading,
    /// The last request produced `payload`.
    Success {
        /// Decoded response body.
        payload: T,
    },
    /// The last request failed with a user-facing `message`.
    Failure {
        /// Generic, non-technical description of the failure.
        message: String,
    },
}

impl<T> FetchState<T> {
    /// Phase of this state.
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Loading => Phase::Loading,
            Self::Success { .. } => Phase::Success,
            Self::Failure { .. } => Phase::Failure,
        }
    }

    /// Whether a spinner should be shown.
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Whether an error panel with retry should be shown.
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Payload carried by a `Success` state.
    pub const fn payload(&self) -> Option<&T> {
        match self {
            Self::Success { payload } => Some(payload),
            _ => None,
        }
    }

    /// Message carried by a `Failure` state.
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Failure { message } => Some(message.as_str()),
            _ => None,
        }
    }
}
