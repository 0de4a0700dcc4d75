//! Plain-text screens rendered from fetch state.
//!
//! Rendering is a pure function of the state handed in, so callers can
//! re-render from a subscription callback or a `watch` receiver.

use crate::domain::{FetchState, Role, UserProfile};

/// Shown while a request is in flight.
pub const LOADING_TEXT: &str = "Loading...";
/// Heading of the roles screen.
pub const ROLES_HEADING: &str = "Roles List";
/// Empty state of the roles screen.
pub const NO_ROLES_TEXT: &str = "No roles available";
/// Heading of the user details screen.
pub const USER_HEADING: &str = "User Details";
/// Shown when no profile has been loaded yet.
pub const NO_USER_TEXT: &str = "No user details available";
/// Hint printed under a failure message.
pub const RETRY_HINT: &str = "Retry to fetch the user again.";

/// Render the roles screen.
///
/// An `Idle` roles screen has not mounted yet and renders like `Loading`.
pub fn render_roles_screen(state: &FetchState<Vec<Role>>) -> String {
    match state {
        FetchState::Idle | FetchState::Loading => LOADING_TEXT.to_owned(),
        FetchState::Failure { message } => message.clone(),
        FetchState::Success { payload } if payload.is_empty() => {
            [ROLES_HEADING, NO_ROLES_TEXT].join("\n")
        }
        FetchState::Success { payload } => {
            let mut lines = vec![ROLES_HEADING.to_owned()];
            for role in payload {
                lines.push(format!("- {}", role.role_name));
                lines.push(format!("  {}", role.description));
            }
            lines.join("\n")
        }
    }
}

/// Render the user details screen.
///
/// After a failure the previously loaded profile stays on screen, so
/// `last_payload` is shown when the state itself carries none.
pub fn render_user_screen(
    state: &FetchState<UserProfile>,
    last_payload: Option<&UserProfile>,
) -> String {
    if state.is_loading() {
        return LOADING_TEXT.to_owned();
    }

    let mut lines = vec![USER_HEADING.to_owned()];
    match state.payload().or(last_payload) {
        Some(profile) => lines.extend(profile_lines(profile)),
        None => lines.push(NO_USER_TEXT.to_owned()),
    }
    if let Some(message) = state.failure_message() {
        lines.push(String::new());
        lines.push(message.to_owned());
        lines.push(RETRY_HINT.to_owned());
    }
    lines.join("\n")
}

fn profile_lines(profile: &UserProfile) -> Vec<String> {
    let password_created = profile.password_created_on().map_or_else(
        || profile.password_creation_date.clone(),
        |date| date.format("%Y-%m-%d").to_string(),
    );
    let fields = [
        ("Name", profile.full_name()),
        ("Username", profile.user_name.clone()),
        ("Email", profile.email_address.clone()),
        ("Display Name", profile.display_name.clone()),
        ("Description", profile.description.clone()),
        ("Preferred Profile Name", profile.preferred_profile_name.clone()),
        (
            "Available Profile Names",
            profile.available_profile_names.join(", "),
        ),
        ("Password Creation Date", password_created),
        (
            "Password Expires In Days",
            profile.password_expires_in_days.to_string(),
        ),
        ("Admin Level", profile.admin_level.to_string()),
        ("Can Change Password", yes_no(profile.can_change_password)),
        ("Temporary Password", yes_no(profile.is_temporary_password)),
        (
            "Password Change From Admin",
            yes_no(profile.is_password_change_from_admin),
        ),
        ("Locked", yes_no(profile.is_locked)),
        (
            "Security Administrator",
            yes_no(profile.is_security_administrator),
        ),
        ("Hidden", yes_no(profile.is_hidden)),
        ("Deleted", yes_no(profile.is_deleted)),
        ("Enabled", yes_no(profile.is_enabled)),
        ("Editable", yes_no(profile.is_editable)),
    ];
    fields
        .into_iter()
        .map(|(label, value)| format!("{label}: {value}"))
        .collect()
}

fn yes_no(flag: bool) -> String {
    if flag { "Yes" } else { "No" }.to_owned()
}
