//! Group types

use serde::{Deserialize, Serialize};

/// A coordination group
///
/// The admin must be drawn from `members` whenever reassigned; creation
/// enforces the same when both fields are supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Current group admin
    pub admin_id: String,
    pub members: Vec<String>,
    /// Appointments attached to this group
    pub appointment_ids: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Group {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|id| id == user_id)
    }
}
