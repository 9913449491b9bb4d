use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_bus::DomainEvent;

use crate::aggregate::{EventAccumulator, EventAggregate};

use super::{MAX_DESCRIPTION_LENGTH, UserError, UserEvent, UserRole};

/// A registered user and the roles that decide what they may do.
///
/// A user always holds at least one role.
#[derive(Debug, Clone)]
pub struct User {
    events: EventAccumulator,
    email: String,
    username: String,
    password_hash: String,
    description: String,
    roles: BTreeSet<UserRole>,
    join_date: DateTime<Utc>,
}

impl User {
    /// Creates a user and records `UserCreated`.
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password_hash: impl Into<String>,
        description: impl Into<String>,
        roles: impl IntoIterator<Item = UserRole>,
    ) -> Result<Self, UserError> {
        let roles: BTreeSet<UserRole> = roles.into_iter().collect();
        if roles.is_empty() {
            return Err(UserError::MissingUserRoles);
        }
        let description = description.into();
        check_description(&description)?;

        let mut user = User {
            events: EventAccumulator::new(),
            email: String::new(),
            username: String::new(),
            password_hash: String::new(),
            description: String::new(),
            roles: BTreeSet::new(),
            join_date: Utc::now(),
        };
        user.raise(UserEvent::user_created(
            AggregateId::generate(),
            email,
            username,
            password_hash,
            description,
            roles.into_iter().collect(),
        ));
        Ok(user)
    }

    /// Grants a role.
    pub fn add_role(&mut self, role: UserRole) -> Result<(), UserError> {
        if self.roles.contains(&role) {
            return Err(UserError::RoleAlreadyAssigned(role));
        }

        self.raise(UserEvent::user_role_added(self.id(), role));
        Ok(())
    }

    /// Revokes a role. The last remaining role cannot be removed.
    pub fn remove_role(&mut self, role: UserRole) -> Result<(), UserError> {
        if !self.roles.contains(&role) {
            return Err(UserError::RoleNotAssigned(role));
        }
        if self.roles.len() == 1 {
            return Err(UserError::MissingUserRoles);
        }

        self.raise(UserEvent::user_role_removed(self.id(), role));
        Ok(())
    }

    pub fn update_description(&mut self, description: impl Into<String>) -> Result<(), UserError> {
        let description = description.into();
        check_description(&description)?;

        self.raise(UserEvent::user_description_updated(self.id(), description));
        Ok(())
    }

    /// Replaces the stored password hash. Hashing happens elsewhere.
    pub fn update_password_hash(&mut self, password_hash: impl Into<String>) {
        self.raise(UserEvent::user_password_updated(self.id(), password_hash));
    }

    fn raise(&mut self, event: UserEvent) {
        match &event {
            UserEvent::UserCreated(data) => {
                self.events.set_id(data.user_id.clone());
                self.email = data.email.clone();
                self.username = data.username.clone();
                self.password_hash = data.password_hash.clone();
                self.description = data.description.clone();
                self.roles = data.roles.iter().copied().collect();
                self.join_date = data.join_date;
            }
            UserEvent::UserRoleAdded(data) => {
                self.roles.insert(data.role);
            }
            UserEvent::UserRoleRemoved(data) => {
                self.roles.remove(&data.role);
            }
            UserEvent::UserDescriptionUpdated(data) => {
                self.description = data.description.clone();
            }
            UserEvent::UserPasswordUpdated(data) => {
                self.password_hash = data.password_hash.clone();
            }
        }
        self.events.record_event(event.shared());
    }
}

fn check_description(description: &str) -> Result<(), UserError> {
    let length = description.chars().count();
    if length > MAX_DESCRIPTION_LENGTH {
        return Err(UserError::DescriptionTooLong { length });
    }
    Ok(())
}

// Query methods
impl User {
    pub fn id(&self) -> AggregateId {
        self.events.id()
    }

    pub fn set_id(&self, id: AggregateId) {
        self.events.set_id(id);
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn join_date(&self) -> DateTime<Utc> {
        self.join_date
    }

    /// Returns the user's roles in a stable order.
    pub fn roles(&self) -> impl Iterator<Item = UserRole> + '_ {
        self.roles.iter().copied()
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.contains(&role)
    }

    pub fn can_create_post(&self) -> bool {
        self.has_role(UserRole::Author)
    }

    pub fn can_comment(&self) -> bool {
        self.has_role(UserRole::Commenter)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(UserRole::Admin)
    }
}

impl EventAggregate for User {
    fn aggregate_type(&self) -> &'static str {
        "User"
    }

    fn accumulator(&self) -> &EventAccumulator {
        &self.events
    }
}
