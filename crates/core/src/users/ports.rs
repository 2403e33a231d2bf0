//! Port interfaces for the user registry

use async_trait::async_trait;
use mawid_domain::{Result, Role, User};

/// Trait for persisting users
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn create(&self, user: User) -> Result<()>;

    async fn update_profile(
        &self,
        id: &str,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<()>;

    /// Remove the user and their own membership link rows.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Number of users holding `role`; backs the single-super-admin
    /// uniqueness check.
    async fn count_with_role(&self, role: Role) -> Result<u64>;

    async fn set_role(&self, id: &str, role: Role) -> Result<()>;

    /// Idempotent set-add into the user's appointment set.
    async fn add_appointment(&self, user_id: &str, appointment_id: &str) -> Result<()>;

    async fn remove_appointment(&self, user_id: &str, appointment_id: &str) -> Result<()>;

    /// Idempotent set-add into the user's group set.
    async fn add_group(&self, user_id: &str, group_id: &str) -> Result<()>;

    async fn remove_group(&self, user_id: &str, group_id: &str) -> Result<()>;
}
