//! Domain primitives and the fetch lifecycle.
//!
//! Purpose: model what a screen shows while it loads a remote resource. The
//! domain owns the state machine, identifier validation and the controller
//! that serialises requests; adapters plug in through [`ports`].
//!
//! Public surface:
//! - `FetchState` and `Phase`: the four observable lifecycle states.
//! - `StateStore`: validated, observable holder of one `FetchState`.
//! - `FetchController`: trigger, retry and teardown for one screen.
//! - `ResourceId`, `UserProfile`, `Role`: request and payload types.

pub mod directory_queries;
pub mod fetch_controller;
pub mod fetch_executor;
pub mod fetch_state;
pub mod ports;
pub mod resource_id;
pub mod role;
pub mod state_store;
pub mod user_profile;

pub use self::directory_queries::{
    RoleListing, RolesController, UserProfileController, UserProfileLookup,
    mount_roles_controller, user_profile_controller,
};
pub use self::fetch_controller::{FetchController, TriggerOutcome, ValidationNotice};
pub use self::fetch_executor::Execution;
pub use self::fetch_state::{FetchState, Phase};
pub use self::resource_id::{ResourceId, ResourceIdValidationError};
pub use self::role::Role;
pub use self::state_store::{
    Delivery, StateCallback, StateStore, SubscriptionId, TransitionError,
};
pub use self::user_profile::UserProfile;
