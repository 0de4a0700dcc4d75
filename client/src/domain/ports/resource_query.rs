//! Seam between a fetch controller and the resource it loads.
//!
//! A query binds one request descriptor type to one payload type and knows the
//! user-facing texts for its screen. Controllers stay generic over it.

use std::fmt;

use async_trait::async_trait;

use super::ResourceSourceError;

/// One kind of remote resource a controller can load.
#[async_trait]
pub trait ResourceQuery: Send + Sync + 'static {
    /// Validated request descriptor, retained for retry.
    type Request: Clone + fmt::Debug + Send + Sync + 'static;
    /// Decoded payload stored on success.
    type Payload: Clone + Send + Sync + 'static;

    /// Short resource name used in log fields.
    const RESOURCE: &'static str;
    /// Generic message shown for every fetch failure.
    const FAILURE_MESSAGE: &'static str;
    /// Notice shown when the identifier input is blank.
    const BLANK_INPUT_NOTICE: &'static str = "Identifier cannot be empty";

    /// Issue exactly one request for `request`.
    async fn execute(&self, request: &Self::Request)
    -> Result<Self::Payload, ResourceSourceError>;
}
