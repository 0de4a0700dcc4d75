//! Runs exactly one request for a controller and normalises its result.
//!
//! The executor never touches the state store. It hands the controller an
//! [`Execution`] so the controller can discard stale results before writing.

use tracing::{debug, warn};

use super::ports::{ResourceQuery, ResourceSourceError};

/// Result of one executor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution<T> {
    /// The response decoded into the payload.
    Succeeded(T),
    /// The request failed; `message` is the generic text for the screen.
    Failed {
        /// User-facing message.
        message: &'static str,
        /// Underlying error, kept for logs and diagnostics only.
        error: ResourceSourceError,
    },
}

/// Issue one request through `query` and map the outcome.
pub async fn execute<Q: ResourceQuery>(query: &Q, request: &Q::Request) -> Execution<Q::Payload> {
    debug!(resource = Q::RESOURCE, request = ?request, "fetch started");
    match query.execute(request).await {
        Ok(payload) => {
            debug!(resource = Q::RESOURCE, "fetch succeeded");
            Execution::Succeeded(payload)
        }
        Err(error) => {
            warn!(
                resource = Q::RESOURCE,
                kind = %error.kind(),
                error = %error,
                "fetch failed"
            );
            Execution::Failed {
                message: Q::FAILURE_MESSAGE,
                error,
            }
        }
    }
}
