//! Role record returned by the directory API.

use serde::{Deserialize, Serialize};

/// One role in the directory catalogue.
///
/// Roles are kept in the order the server returns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Server-assigned identifier.
    pub id: String,
    /// Human readable role name.
    pub role_name: String,
    /// What the role grants.
    pub description: String,
}

impl Role {
    /// Build a role from its three fields.
    pub fn new(
        id: impl Into<String>,
        role_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role_name: role_name.into(),
            description: description.into(),
        }
    }
}
