//! Resource queries for the user directory screens.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use super::ports::{ResourceQuery, ResourceSourceError, UserDirectorySource};
use super::{FetchController, ResourceId, Role, TransitionError, TriggerOutcome, UserProfile};

/// Loads one user profile by identifier.
pub struct UserProfileLookup<S> {
    source: Arc<S>,
}

impl<S> UserProfileLookup<S> {
    /// Query reading profiles from `source`.
    pub const fn new(source: Arc<S>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S> ResourceQuery for UserProfileLookup<S>
where
    S: UserDirectorySource + 'static,
{
    type Request = ResourceId;
    type Payload = UserProfile;

    const RESOURCE: &'static str = "user_profile";
    const FAILURE_MESSAGE: &'static str = "Error fetching user";
    const BLANK_INPUT_NOTICE: &'static str = "User ID cannot be empty";

    async fn execute(&self, request: &ResourceId) -> Result<UserProfile, ResourceSourceError> {
        self.source.fetch_user_profile(request).await
    }
}

/// Loads the full role list.
pub struct RoleListing<S> {
    source: Arc<S>,
}

impl<S> RoleListing<S> {
    /// Query reading roles from `source`.
    pub const fn new(source: Arc<S>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S> ResourceQuery for RoleListing<S>
where
    S: UserDirectorySource + 'static,
{
    type Request = ();
    type Payload = Vec<Role>;

    const RESOURCE: &'static str = "roles";
    const FAILURE_MESSAGE: &'static str = "Error fetching roles";

    async fn execute(&self, _request: &()) -> Result<Vec<Role>, ResourceSourceError> {
        self.source.list_roles().await
    }
}

/// Controller behind the user details screen.
pub type UserProfileController<S> = FetchController<UserProfileLookup<S>>;

/// Controller behind the roles list screen.
pub type RolesController<S> = FetchController<RoleListing<S>>;

/// Idle controller for the user details screen.
pub fn user_profile_controller<S>(source: Arc<S>) -> UserProfileController<S>
where
    S: UserDirectorySource + 'static,
{
    FetchController::new(Arc::new(UserProfileLookup::new(source)))
}

/// Roles controller that starts loading as soon as it is created.
///
/// # Panics
///
/// Panics when called outside a Tokio runtime.
pub fn mount_roles_controller<S>(
    source: Arc<S>,
) -> (
    Arc<RolesController<S>>,
    JoinHandle<Result<TriggerOutcome, TransitionError>>,
)
where
    S: UserDirectorySource + 'static,
{
    FetchController::spawn_mounted(Arc::new(RoleListing::new(source)), ())
}
