//! Attendance expansion
//!
//! Expands a group reference (or an explicit invitee list) into the
//! concrete attendee set at appointment-creation time.

use mawid_domain::{MawidError, Result};

use crate::groups::ports::GroupRepository;
use crate::policy::{self, Actor};

/// Result of expanding the requested groups/invitees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedAttendance {
    /// Eligible participants, deduplicated, no ordering guarantee
    pub attendance: Vec<String>,
    /// Source groups that contributed members
    pub group_ids: Vec<String>,
}

/// Derive the attendee set for a new appointment.
///
/// When group ids are supplied, every group must exist and the actor
/// must pass the group-admin policy for it; all members union into the
/// attendance set. Otherwise the explicitly supplied invitee list is
/// used. The creator is always included.
pub async fn derive_attendance(
    groups: &dyn GroupRepository,
    actor: &Actor,
    requested_groups: Option<&[String]>,
    requested_attendance: Option<&[String]>,
) -> Result<DerivedAttendance> {
    let mut attendance: Vec<String> = Vec::new();
    let mut group_ids: Vec<String> = Vec::new();

    match requested_groups {
        Some(ids) if !ids.is_empty() => {
            for group_id in ids {
                let group = groups
                    .find_by_id(group_id)
                    .await?
                    .ok_or_else(|| MawidError::NotFound(format!("group {group_id}")))?;

                if !policy::is_group_admin(actor, &group) {
                    return Err(MawidError::Forbidden(
                        "only group admins or super admins can create group appointments"
                            .into(),
                    ));
                }

                attendance.extend(group.members.iter().cloned());
                group_ids.push(group.id);
            }
        }
        _ => {
            if let Some(invitees) = requested_attendance {
                attendance.extend(invitees.iter().cloned());
            }
        }
    }

    // Always include the creator
    if !attendance.iter().any(|id| id == &actor.id) {
        attendance.push(actor.id.clone());
    }

    dedup_in_place(&mut attendance);
    dedup_in_place(&mut group_ids);

    Ok(DerivedAttendance { attendance, group_ids })
}

fn dedup_in_place(ids: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
}
