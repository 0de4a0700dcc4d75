//! Validated resource identifiers.
//!
//! Identifiers arrive as raw text from the presentation layer. Validation runs
//! synchronously before any request is issued and never suspends.

use std::fmt;

use thiserror::Error;

/// Validation errors returned by [`ResourceId::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResourceIdValidationError {
    /// Input is empty once surrounding whitespace is removed.
    #[error("identifier must not be blank")]
    Blank,
}

/// Identifier accepted by the input validator.
///
/// ## Invariants
/// - The value is trimmed and non-empty.
///
/// # Examples
/// ```
/// use roster_client::domain::ResourceId;
///
/// let id = ResourceId::parse("  42 ").expect("valid id");
/// assert_eq!(id.as_str(), "42");
/// assert!(ResourceId::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId(String);

impl ResourceId {
    /// Validate raw input, keeping the trimmed form.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ResourceIdValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ResourceIdValidationError::Blank);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ResourceId {
    type Error = ResourceIdValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}
