//! User aggregate and related types.

mod aggregate;
mod events;

pub use aggregate::User;
pub use events::{
    UserCreatedData, UserDescriptionUpdatedData, UserEvent, UserPasswordUpdatedData, UserRoleData,
};

use common::AggregateId;
use event_bus::{DomainEvent, EventRegistrar, EventRegistry};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Event types emitted by users.
pub const EVENT_TYPES: &[&str] = &[
    "UserCreated",
    "UserRoleAdded",
    "UserRoleRemoved",
    "UserDescriptionUpdated",
    "UserPasswordUpdated",
];

/// Longest allowed profile description, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 255;

/// What a user is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Author,
    Commenter,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Author => "AUTHOR",
            UserRole::Commenter => "COMMENTER",
            UserRole::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during user operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserError {
    /// A user must always hold at least one role.
    #[error("Cannot create user without a role")]
    MissingUserRoles,

    #[error("Description cannot exceed 255 characters (got {length})")]
    DescriptionTooLong { length: usize },

    #[error("User already has role {0}")]
    RoleAlreadyAssigned(UserRole),

    #[error("User does not have role {0}")]
    RoleNotAssigned(UserRole),
}

/// Registers the user event types.
pub struct UserEvents;

impl EventRegistrar for UserEvents {
    fn register_events(&self, registry: &EventRegistry) -> event_bus::Result<()> {
        let id = AggregateId::default();
        registry.register(
            UserEvent::user_created(id.clone(), "", "", "", "", Vec::new()).shared(),
            "Raised when a new user is created",
        )?;
        registry.register(
            UserEvent::user_role_added(id.clone(), UserRole::Author).shared(),
            "Raised when a new role is added to a user",
        )?;
        registry.register(
            UserEvent::user_role_removed(id.clone(), UserRole::Author).shared(),
            "Raised when a role is removed from a user",
        )?;
        registry.register(
            UserEvent::user_description_updated(id.clone(), "").shared(),
            "Raised when a user's description is updated",
        )?;
        registry.register(
            UserEvent::user_password_updated(id, "").shared(),
            "Raised when a user's password is updated",
        )
    }
}
