//! Port interfaces for appointment persistence
//!
//! These traits define the boundaries between core business logic and
//! infrastructure implementations. Set-valued fields rely on the store's
//! atomic set-add/set-remove primitives; the two conditional operations
//! (`add_accepted_by`, `append_rating`) are compare-and-swap shaped so
//! concurrent duplicate submissions cannot race a read-then-write check.

use async_trait::async_trait;
use mawid_domain::{Appointment, AppointmentStatus, RatingEntry, Result};

/// Partial update applied to an appointment's own fields.
///
/// `None` leaves a field unchanged. Membership sets and the ledger have
/// dedicated operations and are not touched here.
#[derive(Debug, Clone, Default)]
pub struct AppointmentChanges {
    pub title: Option<String>,
    pub starting_date: Option<String>,
    pub ending_date: Option<String>,
    pub starting_time: Option<String>,
    pub ending_time: Option<String>,
}

/// Listing filter for the admin surface
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    /// Persisted status to match
    pub status: Option<AppointmentStatus>,
    /// Exact civil starting date
    pub date: Option<String>,
    /// Inclusive civil starting-date range
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// The eligible window a rating submission is checked against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatingWindow {
    /// Ranged appointment: at most one submission per rater per civil day
    OncePerDay { civil_date: String },
    /// Single-day appointment: at most one submission per rater, ever
    OnceEver,
}

/// Trait for persisting appointments
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Appointment>>;

    async fn create(&self, appointment: Appointment) -> Result<()>;

    /// Apply a partial field update; no-op fields stay untouched.
    async fn update_details(&self, id: &str, changes: AppointmentChanges) -> Result<()>;

    /// Remove the appointment and its own membership/ledger rows.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Overwrite the persisted status with a resolver output or an
    /// admin decision.
    async fn set_status(&self, id: &str, status: AppointmentStatus) -> Result<()>;

    /// Atomic set-add into `accepted_by`.
    ///
    /// Returns `Ok(false)` when the user was already present, so a
    /// concurrent duplicate acceptance loses cleanly.
    async fn add_accepted_by(&self, id: &str, user_id: &str) -> Result<bool>;

    /// Conditionally append a ledger entry.
    ///
    /// The uniqueness check for `window` and the append must happen in
    /// one atomic store operation. Returns `Ok(false)` when the window
    /// already holds a submission by the same rater. When
    /// `mark_completed` is set and the append wins, the persisted status
    /// moves to `completed` in the same operation.
    async fn append_rating(
        &self,
        id: &str,
        entry: RatingEntry,
        window: RatingWindow,
        mark_completed: bool,
    ) -> Result<bool>;

    /// Appointments in a user's appointment set.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Appointment>>;

    async fn list(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>>;

    /// Appointments whose persisted status is not terminal; the sweep's
    /// candidate set.
    async fn list_non_terminal(&self) -> Result<Vec<Appointment>>;
}
