//! Driven port for reading the remote user directory.
//!
//! The domain owns the request and response shapes. Adapters own transport
//! details and map their failures into [`ResourceSourceError`] variants.

use std::fmt;

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{ResourceId, Role, UserProfile};

/// Coarse category of a source failure, used for logs and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The network call failed before a response arrived.
    Network,
    /// The call or the server timed out.
    Timeout,
    /// The server does not know the requested resource.
    NotFound,
    /// The server answered with another non-success status.
    Server,
    /// The body did not decode into the expected shape.
    Decode,
    /// The request could not be built.
    InvalidRequest,
    /// The caller gave up on the request before it finished.
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::NotFound => "not_found",
            Self::Server => "server",
            Self::Decode => "decode",
            Self::InvalidRequest => "invalid_request",
            Self::Cancelled => "cancelled",
        })
    }
}

define_port_error! {
    /// Errors surfaced while reading the user directory.
    pub enum ResourceSourceError: FailureKind {
        /// Network transport failed before receiving a response.
        Transport {
            /// Transport error detail.
            message: String
        } as Network => "directory transport failed: {message}",
        /// The request exceeded its timeout.
        Timeout {
            /// Timeout detail.
            message: String
        } as Timeout => "directory request timed out: {message}",
        /// The server reported the resource as missing.
        NotFound {
            /// Response detail.
            message: String
        } as NotFound => "directory resource not found: {message}",
        /// The server answered with a non-success status.
        Status {
            /// HTTP status code.
            status: u16,
            /// Response detail.
            message: String
        } as Server => "directory returned status {status}: {message}",
        /// The response body could not be decoded.
        Decode {
            /// Decoder error detail.
            message: String
        } as Decode => "directory response decode failed: {message}",
        /// The adapter could not build the request.
        InvalidRequest {
            /// Reason the request was rejected.
            message: String
        } as InvalidRequest => "directory request invalid: {message}",
        /// The request was abandoned before a response was handled.
        Cancelled {
            /// Why the request was abandoned.
            message: String
        } as Cancelled => "directory request cancelled: {message}",
    }
}

/// Port for reading user profiles and roles from the directory API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectorySource: Send + Sync {
    /// Fetch one user profile by identifier.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use roster_client::domain::ResourceId;
    /// use roster_client::domain::ports::UserDirectorySource;
    ///
    /// let id = ResourceId::parse("42")?;
    /// let profile = source.fetch_user_profile(&id).await?;
    /// assert_eq!(profile.id, "42");
    /// ```
    async fn fetch_user_profile(&self, id: &ResourceId)
    -> Result<UserProfile, ResourceSourceError>;

    /// Fetch every role, in server order.
    async fn list_roles(&self) -> Result<Vec<Role>, ResourceSourceError>;
}
