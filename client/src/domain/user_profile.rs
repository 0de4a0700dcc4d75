//! User profile record returned by the directory API.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Account profile for one directory user.
///
/// Profiles are replaced wholesale by each successful fetch and never patched.
/// Decoding is structural only, so empty strings are accepted as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Server-assigned identifier.
    pub id: String,
    /// Login name.
    pub user_name: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Name shown in listings.
    pub display_name: String,
    /// Contact e-mail address.
    pub email_address: String,
    /// Free-form account description.
    pub description: String,
    /// Locale code such as `en-GB`.
    #[serde(rename = "localeISOCode")]
    pub locale_iso_code: String,
    /// Administrative level granted to the account.
    pub admin_level: f64,
    /// Profiles the user may switch between.
    pub available_profile_names: Vec<String>,
    /// Profile selected by default.
    pub preferred_profile_name: String,
    /// Whether the user may change their own password.
    pub can_change_password: bool,
    /// Whether the current password was issued as a temporary one.
    pub is_temporary_password: bool,
    /// Whether the last password change was made by an administrator.
    pub is_password_change_from_admin: bool,
    /// Whether the account is a security administrator.
    pub is_security_administrator: bool,
    /// Whether the account is enabled.
    pub is_enabled: bool,
    /// Whether the account is locked.
    pub is_locked: bool,
    /// Whether the account is hidden from listings.
    pub is_hidden: bool,
    /// Whether the account is soft-deleted.
    pub is_deleted: bool,
    /// Whether the account may be edited.
    pub is_editable: bool,
    /// ISO 8601 date or timestamp of the current password.
    pub password_creation_date: String,
    /// Days until the current password expires. The directory may send
    /// fractional values.
    pub password_expires_in_days: f64,
}

impl UserProfile {
    /// Calendar date on which the current password was created.
    ///
    /// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS` timestamps and
    /// plain `YYYY-MM-DD` dates. Returns `None` for anything else.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use roster_client::domain::UserProfile;
    ///
    /// let mut profile = UserProfile::default();
    /// profile.password_creation_date = "2024-03-05T10:15:00Z".to_owned();
    /// assert_eq!(
    ///     profile.password_created_on(),
    ///     NaiveDate::from_ymd_opt(2024, 3, 5)
    /// );
    /// ```
    pub fn password_created_on(&self) -> Option<NaiveDate> {
        let raw = self.password_creation_date.trim();
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
            return Some(timestamp.date_naive());
        }
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(timestamp.date());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }

    /// Given and family name joined for display.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}
