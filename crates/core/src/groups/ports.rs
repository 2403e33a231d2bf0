//! Port interfaces for group persistence

use async_trait::async_trait;
use mawid_domain::{Group, Result};

/// Trait for persisting groups
#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Group>>;

    async fn create(&self, group: Group) -> Result<()>;

    async fn update_details(
        &self,
        id: &str,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Groups where the user is a member or the admin.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Group>>;

    async fn set_admin(&self, id: &str, admin_id: &str) -> Result<()>;

    /// Atomic set-add of members; ids already present are ignored.
    async fn add_members(&self, id: &str, member_ids: &[String]) -> Result<()>;

    async fn remove_members(&self, id: &str, member_ids: &[String]) -> Result<()>;

    /// Atomic set-add into the group's appointment list.
    async fn add_appointment(&self, id: &str, appointment_id: &str) -> Result<()>;

    async fn remove_appointment(&self, id: &str, appointment_id: &str) -> Result<()>;

    /// Whether the user administers any group other than `except_group`.
    /// Drives the outgoing-admin demotion on reassignment.
    async fn administers_other_group(&self, user_id: &str, except_group: &str) -> Result<bool>;
}
