//! Authorization policy
//!
//! Capability checks shared by the appointment, rating and group
//! services. Role-based route gating happens upstream; these checks
//! guard the privileged mutations themselves.

use mawid_domain::{Appointment, Group, Role};
use serde::{Deserialize, Serialize};

/// Decoded caller identity attached to each request by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }
}

/// Whether the actor may act as admin of `group`.
///
/// True for a super-admin, for the group's current admin, or for any
/// global admin. The last arm is deliberate: global admins bypass the
/// group-specific admin check on every group.
pub fn is_group_admin(actor: &Actor, group: &Group) -> bool {
    actor.role == Role::SuperAdmin || group.admin_id == actor.id || actor.role == Role::Admin
}

/// Whether the actor may reassign the admin of `group`.
///
/// Stricter than [`is_group_admin`]: only a super-admin or the current
/// group admin qualifies; a plain global admin does not.
pub fn can_reassign_admin(actor: &Actor, group: &Group) -> bool {
    actor.role == Role::SuperAdmin || group.admin_id == actor.id
}

/// Whether the actor may submit a rating for `appointment`.
///
/// Global admins may always rate; ordinary users only once they have
/// accepted the invitation.
pub fn can_rate(actor: &Actor, appointment: &Appointment) -> bool {
    actor.role.is_global_admin() || appointment.has_accepted(&actor.id)
}
