//! User types
//!
//! Authentication lives outside this service; requests arrive with a
//! gateway-decoded identity. The user record here carries the role and
//! the membership sets the core maintains.

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// User role
///
/// Exactly one `super-admin` may exist system-wide, enforced at user
/// creation via a store uniqueness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "super-admin")]
    SuperAdmin,
}

impl_domain_status_conversions!(Role {
    User => "user",
    Admin => "admin",
    SuperAdmin => "super-admin",
});

impl Role {
    /// Global admins (admin or super-admin) bypass group-level checks.
    pub fn is_global_admin(self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }
}

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Appointments the user attends (set semantics, no duplicates)
    pub appointment_ids: Vec<String>,
    /// Groups the user belongs to
    pub group_ids: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}
