//! User registry service - core business logic
//!
//! Credential handling and token issuance live outside this service;
//! only the registry invariants are enforced here, notably the
//! single-super-admin constraint checked against the store at creation
//! time rather than held as in-process state.

use std::sync::Arc;

use mawid_domain::{MawidError, Result, Role, User};
use tracing::info;
use uuid::Uuid;

use super::ports::UserRepository;
use crate::clock::Clock;
use crate::groups::ports::GroupRepository;

/// Validated input for user creation
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// User registry use cases
pub struct UserService {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn GroupRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { users, groups, clock }
    }

    /// Register a user. Emails are unique; at most one super-admin may
    /// exist system-wide.
    pub async fn create(&self, input: CreateUser) -> Result<User> {
        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(MawidError::Conflict(format!(
                "email {} is already registered",
                input.email
            )));
        }

        if input.role == Role::SuperAdmin
            && self.users.count_with_role(Role::SuperAdmin).await? > 0
        {
            return Err(MawidError::Conflict("a super admin already exists".into()));
        }

        let now = self.clock.now().timestamp();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: input.email,
            name: input.name,
            role: input.role,
            appointment_ids: Vec::new(),
            group_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.users.create(user.clone()).await?;
        info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    pub async fn get(&self, id: &str) -> Result<User> {
        self.find_or_not_found(id).await
    }

    pub async fn update(
        &self,
        id: &str,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<User> {
        self.find_or_not_found(id).await?;

        if let Some(new_email) = email.as_deref() {
            if let Some(existing) = self.users.find_by_email(new_email).await? {
                if existing.id != id {
                    return Err(MawidError::Conflict(format!(
                        "email {new_email} is already registered"
                    )));
                }
            }
        }

        self.users.update_profile(id, name, email).await?;
        self.find_or_not_found(id).await
    }

    /// Delete a user, detaching their group memberships first. The
    /// appointments they created stay reachable for other attendees.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let user = self.find_or_not_found(id).await?;

        let removal = [id.to_string()];
        for group_id in &user.group_ids {
            self.groups.remove_members(group_id, &removal).await?;
        }

        self.users.delete(id).await?;
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    async fn find_or_not_found(&self, id: &str) -> Result<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| MawidError::NotFound(format!("user {id}")))
    }
}
