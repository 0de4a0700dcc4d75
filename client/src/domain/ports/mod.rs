//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod resource_query;
mod user_directory_source;

pub use resource_query::ResourceQuery;
#[cfg(test)]
pub(crate) use user_directory_source::MockUserDirectorySource;
pub use user_directory_source::{FailureKind, ResourceSourceError, UserDirectorySource};
