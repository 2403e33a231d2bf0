//! Appointment service - core business logic

use std::sync::Arc;

use mawid_domain::{Appointment, AppointmentStatus, MawidError, Result};
use tracing::{debug, info};
use uuid::Uuid;

use super::attendance::{derive_attendance, DerivedAttendance};
use super::ports::{AppointmentChanges, AppointmentFilter, AppointmentRepository};
use crate::clock::Clock;
use crate::groups::ports::GroupRepository;
use crate::lifecycle;
use crate::policy::Actor;
use crate::users::ports::UserRepository;

/// Validated input for appointment creation
#[derive(Debug, Clone, Default)]
pub struct CreateAppointment {
    pub title: String,
    pub starting_date: String,
    pub ending_date: Option<String>,
    pub starting_time: Option<String>,
    pub ending_time: Option<String>,
    /// Source groups; when present, attendance is expanded from them
    pub group_ids: Option<Vec<String>>,
    /// Explicit invitees for individual appointments
    pub attendance: Option<Vec<String>>,
}

/// Validated input for appointment edits
pub type UpdateAppointment = AppointmentChanges;

/// Appointment use cases: creation, acceptance, status changes, queries
pub struct AppointmentService {
    appointments: Arc<dyn AppointmentRepository>,
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl AppointmentService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { appointments, groups, users, clock }
    }

    /// Create an appointment for the acting user.
    ///
    /// Expands group references into a concrete attendee set, enforces
    /// the future-start invariant (creation only; edits bypass it) and
    /// the ending-after-starting ordering, persists with `pending`
    /// status and an empty ledger, then registers the appointment on
    /// every source group.
    pub async fn create(&self, actor: &Actor, input: CreateAppointment) -> Result<Appointment> {
        let now = self.clock.now();

        validate_date_order(&input.starting_date, input.ending_date.as_deref())?;

        match lifecycle::starts_in_future(
            &input.starting_date,
            input.starting_time.as_deref(),
            now,
        ) {
            Some(true) => {}
            Some(false) => {
                return Err(MawidError::InvalidState(
                    "cannot create an appointment in the past or for the current time".into(),
                ))
            }
            None => {
                return Err(MawidError::Validation(format!(
                    "unparseable starting date/time: {} {}",
                    input.starting_date,
                    input.starting_time.as_deref().unwrap_or_default()
                )))
            }
        }

        let DerivedAttendance { attendance, group_ids } = derive_attendance(
            self.groups.as_ref(),
            actor,
            input.group_ids.as_deref(),
            input.attendance.as_deref(),
        )
        .await?;

        let appointment = Appointment {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            creator_id: actor.id.clone(),
            group_ids: group_ids.clone(),
            starting_date: input.starting_date,
            ending_date: input.ending_date,
            starting_time: input.starting_time,
            ending_time: input.ending_time,
            status: AppointmentStatus::Pending,
            attendance,
            accepted_by: Vec::new(),
            ratings: Vec::new(),
            created_at: now.timestamp(),
            updated_at: now.timestamp(),
        };

        self.appointments.create(appointment.clone()).await?;

        for group_id in &group_ids {
            self.groups.add_appointment(group_id, &appointment.id).await?;
        }

        info!(
            appointment_id = %appointment.id,
            creator = %actor.id,
            groups = group_ids.len(),
            attendees = appointment.attendance.len(),
            "appointment created"
        );
        Ok(appointment)
    }

    /// Fetch one appointment, with its runtime status resolved.
    pub async fn get(&self, id: &str) -> Result<Appointment> {
        let mut appointment = self.find_or_not_found(id).await?;
        appointment.status = lifecycle::resolve(&appointment, self.clock.now());
        Ok(appointment)
    }

    /// Apply a field edit. Edits deliberately bypass the future-start
    /// check, but the date ordering invariant still holds.
    pub async fn update(&self, id: &str, changes: UpdateAppointment) -> Result<Appointment> {
        let current = self.find_or_not_found(id).await?;

        let starting = changes.starting_date.as_deref().unwrap_or(&current.starting_date);
        let ending = changes.ending_date.as_deref().or(current.ending_date.as_deref());
        validate_date_order(starting, ending)?;

        self.appointments.update_details(id, changes).await?;
        self.find_or_not_found(id).await
    }

    /// Delete an appointment and retract its membership side-effects:
    /// the group appointment lists and the attendees' appointment sets.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let appointment = self.find_or_not_found(id).await?;

        self.appointments.delete(id).await?;

        for group_id in &appointment.group_ids {
            self.groups.remove_appointment(group_id, id).await?;
        }
        for user_id in &appointment.attendance {
            self.users.remove_appointment(user_id, id).await?;
        }

        info!(appointment_id = %id, "appointment deleted");
        Ok(())
    }

    /// Accept an invitation.
    ///
    /// Only invited users may accept, and only once. The appointment
    /// mutation persists before the user's membership mutation is
    /// attempted; a failure in the second step is not rolled back, and a
    /// retry converges through the idempotent set-add.
    pub async fn accept(&self, appointment_id: &str, user_id: &str) -> Result<Appointment> {
        let appointment = self.find_or_not_found(appointment_id).await?;

        if appointment.has_accepted(user_id) {
            return Err(MawidError::Conflict(
                "you have already accepted this appointment".into(),
            ));
        }
        if !appointment.is_attendee(user_id) {
            return Err(MawidError::Forbidden(
                "only invited users can accept this appointment".into(),
            ));
        }

        // CAS add: a concurrent duplicate acceptance loses here even
        // though the membership check above passed on a stale read.
        if !self.appointments.add_accepted_by(appointment_id, user_id).await? {
            return Err(MawidError::Conflict(
                "you have already accepted this appointment".into(),
            ));
        }

        self.users.add_appointment(user_id, appointment_id).await?;

        debug!(appointment_id = %appointment_id, user = %user_id, "invitation accepted");
        self.find_or_not_found(appointment_id).await
    }

    /// Admin accept/reject and manual overrides. This is the only path
    /// that clears `pending`.
    pub async fn change_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<Appointment> {
        self.find_or_not_found(id).await?;
        self.appointments.set_status(id, status).await?;
        info!(appointment_id = %id, status = %status, "appointment status changed");
        self.find_or_not_found(id).await
    }

    /// Appointments in a user's appointment set, statuses resolved.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Appointment>> {
        let now = self.clock.now();
        let mut appointments = self.appointments.list_for_user(user_id).await?;
        for appointment in &mut appointments {
            appointment.status = lifecycle::resolve(appointment, now);
        }
        Ok(appointments)
    }

    /// Filtered listing over persisted fields (admin surface).
    pub async fn list(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>> {
        self.appointments.list(filter).await
    }

    /// Listing filtered by the *derived* status: every candidate is
    /// resolved on read and matched, without persisting the result.
    pub async fn list_by_computed_status(
        &self,
        status: AppointmentStatus,
        filter: AppointmentFilter,
    ) -> Result<Vec<Appointment>> {
        let now = self.clock.now();
        let mut appointments = self.appointments.list(filter).await?;
        appointments.retain_mut(|appointment| {
            let resolved = lifecycle::resolve(appointment, now);
            appointment.status = resolved;
            resolved == status
        });
        Ok(appointments)
    }

    async fn find_or_not_found(&self, id: &str) -> Result<Appointment> {
        self.appointments
            .find_by_id(id)
            .await?
            .ok_or_else(|| MawidError::NotFound(format!("appointment {id}")))
    }
}

/// `ending_date`, when present and parseable, must not precede
/// `starting_date`. Unparseable dates are reported as validation
/// failures here (the read-side resolver fails open instead).
fn validate_date_order(starting_date: &str, ending_date: Option<&str>) -> Result<()> {
    let Some(ending_date) = ending_date else { return Ok(()) };

    let start = lifecycle::combine(starting_date, "00:00")
        .ok_or_else(|| MawidError::Validation(format!("unparseable starting date: {starting_date}")))?;
    let end = lifecycle::combine(ending_date, "00:00")
        .ok_or_else(|| MawidError::Validation(format!("unparseable ending date: {ending_date}")))?;

    if end < start {
        return Err(MawidError::Validation(
            "ending date must be equal to or after starting date".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_order_accepts_equal_dates() {
        assert!(validate_date_order("2025-03-10", Some("2025-03-10")).is_ok());
        assert!(validate_date_order("2025-03-10", Some("2025-03-12")).is_ok());
        assert!(validate_date_order("2025-03-10", None).is_ok());
    }

    #[test]
    fn date_order_rejects_inverted_range() {
        let err = validate_date_order("2025-03-10", Some("2025-03-09")).unwrap_err();
        assert!(matches!(err, MawidError::Validation(_)));
    }

    #[test]
    fn date_order_rejects_garbage() {
        let err = validate_date_order("10-03-2025", Some("2025-03-11")).unwrap_err();
        assert!(matches!(err, MawidError::Validation(_)));
    }
}
