//! Appointment and rating ledger types
//!
//! Dates and times are stored as civil strings (`YYYY-MM-DD`, `HH:MM`)
//! interpreted in [`crate::constants::CIVIL_TIMEZONE`]. The persisted
//! status is only part of the story: the runtime status is derived from
//! the stored window by the resolver in the core crate.

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Appointment lifecycle status
///
/// `Pending` and the terminal states (`Rejected`, `Completed`) are
/// admin/rating-driven and never overridden by the clock; the remaining
/// three are derived from the appointment's civil window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Rejected,
    Inactive,
    Active,
    Expired,
    Completed,
}

impl_domain_status_conversions!(AppointmentStatus {
    Pending => "pending",
    Rejected => "rejected",
    Inactive => "inactive",
    Active => "active",
    Expired => "expired",
    Completed => "completed",
});

impl AppointmentStatus {
    /// Terminal states are never overridden by the resolver or the sweep.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Completed)
    }
}

/// A single per-title review inside a rating submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub title: String,
    pub points: i32,
}

/// One rated attendee inside a ledger entry
///
/// `cumulative_rating_points` is fixed at submission time as the sum of
/// the submitted review points and is never recomputed later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatedUserEntry {
    pub rated_user: String,
    pub cumulative_rating_points: i32,
    pub comment: String,
    pub reviews: Vec<Review>,
}

/// One rater's submitted batch of reviews
///
/// `rated_on` is the civil date of the submission in the fixed timezone;
/// it is what the once-per-day window check for ranged appointments
/// compares against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub rated_by: String,
    pub has_rated: bool,
    /// Submission instant (unix seconds)
    pub rated_at: i64,
    /// Civil date of the submission (`YYYY-MM-DD`)
    pub rated_on: String,
    pub users: Vec<RatedUserEntry>,
}

/// An appointment, group-based or individual
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub title: String,
    /// User who created the appointment
    pub creator_id: String,
    /// Source groups, empty for individual appointments
    pub group_ids: Vec<String>,
    /// Civil date (`YYYY-MM-DD`), required
    pub starting_date: String,
    /// Civil date; absent for single-day appointments
    pub ending_date: Option<String>,
    /// Civil time (`HH:MM`); defaults to start of day when absent
    pub starting_time: Option<String>,
    /// Civil time (`HH:MM`); defaults to end of day when absent
    pub ending_time: Option<String>,
    /// Admin-set status; the clock-derived status is computed on read
    pub status: AppointmentStatus,
    /// Eligible participants
    pub attendance: Vec<String>,
    /// Invitees who confirmed
    pub accepted_by: Vec<String>,
    /// Rating ledger, one entry per submission
    pub ratings: Vec<RatingEntry>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Appointment {
    /// True when the appointment spans a single civil day.
    ///
    /// An absent ending date, or an ending date equal to the starting
    /// date, both count as single-day.
    pub fn is_single_day(&self) -> bool {
        match &self.ending_date {
            None => true,
            Some(end) => end == &self.starting_date,
        }
    }

    pub fn is_attendee(&self, user_id: &str) -> bool {
        self.attendance.iter().any(|id| id == user_id)
    }

    pub fn has_accepted(&self, user_id: &str) -> bool {
        self.accepted_by.iter().any(|id| id == user_id)
    }
}
