//! User domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_bus::DomainEvent;
use serde::{Deserialize, Serialize};

use super::UserRole;

/// Events that can occur on a user aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum UserEvent {
    /// User account was created.
    UserCreated(UserCreatedData),

    /// A role was granted.
    UserRoleAdded(UserRoleData),

    /// A role was revoked.
    UserRoleRemoved(UserRoleData),

    /// Profile description was changed.
    UserDescriptionUpdated(UserDescriptionUpdatedData),

    /// Password hash was replaced.
    UserPasswordUpdated(UserPasswordUpdatedData),
}

impl DomainEvent for UserEvent {
    fn event_type(&self) -> &'static str {
        match self {
            UserEvent::UserCreated(_) => "UserCreated",
            UserEvent::UserRoleAdded(_) => "UserRoleAdded",
            UserEvent::UserRoleRemoved(_) => "UserRoleRemoved",
            UserEvent::UserDescriptionUpdated(_) => "UserDescriptionUpdated",
            UserEvent::UserPasswordUpdated(_) => "UserPasswordUpdated",
        }
    }

    fn occurred_on(&self) -> DateTime<Utc> {
        match self {
            UserEvent::UserCreated(data) => data.occurred_on,
            UserEvent::UserRoleAdded(data) | UserEvent::UserRoleRemoved(data) => data.occurred_on,
            UserEvent::UserDescriptionUpdated(data) => data.occurred_on,
            UserEvent::UserPasswordUpdated(data) => data.occurred_on,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCreatedData {
    pub user_id: AggregateId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub description: String,
    pub roles: Vec<UserRole>,
    pub join_date: DateTime<Utc>,
    pub occurred_on: DateTime<Utc>,
}

/// Data for UserRoleAdded and UserRoleRemoved events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRoleData {
    pub user_id: AggregateId,
    pub role: UserRole,
    pub occurred_on: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDescriptionUpdatedData {
    pub user_id: AggregateId,
    pub description: String,
    pub occurred_on: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPasswordUpdatedData {
    pub user_id: AggregateId,
    pub password_hash: String,
    pub occurred_on: DateTime<Utc>,
}

impl UserEvent {
    pub fn user_created(
        user_id: AggregateId,
        email: impl Into<String>,
        username: impl Into<String>,
        password_hash: impl Into<String>,
        description: impl Into<String>,
        roles: Vec<UserRole>,
    ) -> Self {
        let now = Utc::now();
        UserEvent::UserCreated(UserCreatedData {
            user_id,
            email: email.into(),
            username: username.into(),
            password_hash: password_hash.into(),
            description: description.into(),
            roles,
            join_date: now,
            occurred_on: now,
        })
    }

    pub fn user_role_added(user_id: AggregateId, role: UserRole) -> Self {
        UserEvent::UserRoleAdded(UserRoleData {
            user_id,
            role,
            occurred_on: Utc::now(),
        })
    }

    pub fn user_role_removed(user_id: AggregateId, role: UserRole) -> Self {
        UserEvent::UserRoleRemoved(UserRoleData {
            user_id,
            role,
            occurred_on: Utc::now(),
        })
    }

    pub fn user_description_updated(user_id: AggregateId, description: impl Into<String>) -> Self {
        UserEvent::UserDescriptionUpdated(UserDescriptionUpdatedData {
            user_id,
            description: description.into(),
            occurred_on: Utc::now(),
        })
    }

    pub fn user_password_updated(user_id: AggregateId, password_hash: impl Into<String>) -> Self {
        UserEvent::UserPasswordUpdated(UserPasswordUpdatedData {
            user_id,
            password_hash: password_hash.into(),
            occurred_on: Utc::now(),
        })
    }

    /// Returns the id of the user this event belongs to.
    pub fn user_id(&self) -> &AggregateId {
        match self {
            UserEvent::UserCreated(data) => &data.user_id,
            UserEvent::UserRoleAdded(data) | UserEvent::UserRoleRemoved(data) => &data.user_id,
            UserEvent::UserDescriptionUpdated(data) => &data.user_id,
            UserEvent::UserPasswordUpdated(data) => &data.user_id,
        }
    }
}
