//! Group service - core business logic
//!
//! Membership management and admin reassignment. Authorization for
//! member mutations is the three-way group-admin policy; reassignment
//! is stricter (super-admin or the current admin only).

use std::sync::Arc;

use mawid_domain::{Group, MawidError, Result, Role};
use tracing::{debug, info};
use uuid::Uuid;

use super::ports::GroupRepository;
use crate::clock::Clock;
use crate::policy::{self, Actor};
use crate::users::ports::UserRepository;

/// Validated input for group creation
#[derive(Debug, Clone, Default)]
pub struct CreateGroup {
    pub name: String,
    pub description: Option<String>,
    pub admin_id: String,
    pub members: Vec<String>,
}

/// Group management use cases
pub struct GroupService {
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl GroupService {
    pub fn new(
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { groups, users, clock }
    }

    /// Create a group. The admin is always part of the member set; the
    /// named users gain the group on their own records.
    pub async fn create(&self, input: CreateGroup) -> Result<Group> {
        let admin = self
            .users
            .find_by_id(&input.admin_id)
            .await?
            .ok_or_else(|| MawidError::NotFound(format!("user {}", input.admin_id)))?;

        let mut members = input.members;
        if !members.iter().any(|id| id == &admin.id) {
            members.push(admin.id.clone());
        }
        dedup_in_place(&mut members);

        let now = self.clock.now().timestamp();
        let group = Group {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            description: input.description,
            admin_id: admin.id,
            members,
            appointment_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.groups.create(group.clone()).await?;
        for member_id in &group.members {
            self.users.add_group(member_id, &group.id).await?;
        }

        info!(group_id = %group.id, members = group.members.len(), "group created");
        Ok(group)
    }

    pub async fn get(&self, id: &str) -> Result<Group> {
        self.find_or_not_found(id).await
    }

    /// Groups where the user is a member or the admin.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Group>> {
        self.groups.list_for_user(user_id).await
    }

    pub async fn update(
        &self,
        id: &str,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Group> {
        self.find_or_not_found(id).await?;
        self.groups.update_details(id, name, description).await?;
        self.find_or_not_found(id).await
    }

    /// Delete a group and detach it from every member's record.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let group = self.find_or_not_found(id).await?;

        self.groups.delete(id).await?;
        for member_id in &group.members {
            self.users.remove_group(member_id, id).await?;
        }

        info!(group_id = %id, "group deleted");
        Ok(())
    }

    /// Add members. Only genuinely new users are added; when every
    /// candidate is already present the call is a conflict, matching
    /// the duplicate-membership taxonomy.
    pub async fn add_members(
        &self,
        actor: &Actor,
        id: &str,
        member_ids: &[String],
    ) -> Result<Group> {
        let group = self.find_or_not_found(id).await?;
        self.require_group_admin(actor, &group, "only group admins or super admins can add members")?;

        let mut to_add: Vec<String> =
            member_ids.iter().filter(|m| !group.is_member(m)).cloned().collect();
        dedup_in_place(&mut to_add);

        if to_add.is_empty() {
            return Err(MawidError::Conflict(
                "all specified users are already members of the group".into(),
            ));
        }

        self.groups.add_members(id, &to_add).await?;
        for member_id in &to_add {
            self.users.add_group(member_id, id).await?;
        }

        debug!(group_id = %id, added = to_add.len(), "members added");
        self.find_or_not_found(id).await
    }

    /// Remove members; a call that removes nobody is a conflict.
    pub async fn remove_members(
        &self,
        actor: &Actor,
        id: &str,
        member_ids: &[String],
    ) -> Result<Group> {
        let group = self.find_or_not_found(id).await?;
        self.require_group_admin(
            actor,
            &group,
            "only group admins or super admins can remove members",
        )?;

        let to_remove: Vec<String> =
            member_ids.iter().filter(|m| group.is_member(m)).cloned().collect();

        if to_remove.is_empty() {
            return Err(MawidError::Conflict(
                "none of the specified users are members of the group".into(),
            ));
        }

        self.groups.remove_members(id, &to_remove).await?;
        for member_id in &to_remove {
            self.users.remove_group(member_id, id).await?;
        }

        debug!(group_id = %id, removed = to_remove.len(), "members removed");
        self.find_or_not_found(id).await
    }

    /// Reassign the group admin.
    ///
    /// Only a super-admin or the current admin may invoke this; the new
    /// admin must already be a member. The incoming admin is promoted to
    /// the `admin` role; the outgoing admin is demoted back to `user`
    /// when they administer no other group.
    pub async fn reassign_admin(
        &self,
        actor: &Actor,
        id: &str,
        new_admin_id: &str,
    ) -> Result<Group> {
        let group = self.find_or_not_found(id).await?;

        if !policy::can_reassign_admin(actor, &group) {
            return Err(MawidError::Forbidden(
                "only super admins or the current group admin can update the admin".into(),
            ));
        }
        if !group.is_member(new_admin_id) {
            return Err(MawidError::Validation(
                "new admin must be a member of the group".into(),
            ));
        }
        self.users
            .find_by_id(new_admin_id)
            .await?
            .ok_or_else(|| MawidError::NotFound(format!("user {new_admin_id}")))?;

        let outgoing_admin = group.admin_id.clone();

        self.groups.set_admin(id, new_admin_id).await?;
        self.users.set_role(new_admin_id, Role::Admin).await?;
        self.users.add_group(new_admin_id, id).await?;

        // Self-reassignment must not demote the admin that was just
        // set, and only the `admin` role is ever stepped down (a
        // super-admin keeps their role).
        if outgoing_admin != new_admin_id
            && !self.groups.administers_other_group(&outgoing_admin, id).await?
        {
            let outgoing = self.users.find_by_id(&outgoing_admin).await?;
            if outgoing.map_or(false, |user| user.role == Role::Admin) {
                self.users.set_role(&outgoing_admin, Role::User).await?;
            }
        }

        info!(group_id = %id, new_admin = %new_admin_id, "group admin reassigned");
        self.find_or_not_found(id).await
    }

    /// The group's appointment ids (read-side assembly of full records
    /// is the boundary layer's concern).
    pub async fn appointments(&self, id: &str) -> Result<Vec<String>> {
        Ok(self.find_or_not_found(id).await?.appointment_ids)
    }

    /// Detach an appointment from the group's list.
    pub async fn detach_appointment(
        &self,
        actor: &Actor,
        id: &str,
        appointment_id: &str,
    ) -> Result<Group> {
        let group = self.find_or_not_found(id).await?;
        self.require_group_admin(
            actor,
            &group,
            "only group admins or super admins can remove appointments",
        )?;

        self.groups.remove_appointment(id, appointment_id).await?;
        self.find_or_not_found(id).await
    }

    fn require_group_admin(&self, actor: &Actor, group: &Group, message: &str) -> Result<()> {
        if policy::is_group_admin(actor, group) {
            Ok(())
        } else {
            Err(MawidError::Forbidden(message.into()))
        }
    }

    async fn find_or_not_found(&self, id: &str) -> Result<Group> {
        self.groups
            .find_by_id(id)
            .await?
            .ok_or_else(|| MawidError::NotFound(format!("group {id}")))
    }
}

fn dedup_in_place(ids: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
}
