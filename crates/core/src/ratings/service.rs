//! Rating ledger service - core business logic
//!
//! Accumulates per-attendee ratings exactly once per eligible window:
//! once per civil day for ranged appointments, once ever for single-day
//! ones. The window check and the ledger append are a single atomic
//! store operation so concurrent duplicate submissions cannot both win.

use std::sync::Arc;

use mawid_domain::{Appointment, AppointmentStatus, MawidError, RatedUserEntry, RatingEntry, Result, Review};
use tracing::info;

use crate::appointments::ports::{AppointmentRepository, RatingWindow};
use crate::clock::Clock;
use crate::lifecycle;
use crate::policy::{self, Actor};

/// One rater's batch of per-title reviews
#[derive(Debug, Clone, Default)]
pub struct RatingSubmission {
    pub reviews: Vec<Review>,
    pub comment: Option<String>,
}

/// Rating submission use case
pub struct RatingService {
    appointments: Arc<dyn AppointmentRepository>,
    clock: Arc<dyn Clock>,
}

impl RatingService {
    pub fn new(appointments: Arc<dyn AppointmentRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { appointments, clock }
    }

    /// Submit a rating batch for an appointment.
    ///
    /// Preconditions, in order: the appointment exists; its resolved
    /// status is `active`; the rater is a global admin or has accepted
    /// the invitation. The submission appends one ledger entry carrying
    /// one [`RatedUserEntry`] per currently-accepted user, each with the
    /// submitted reviews and their summed points. Single-day
    /// appointments move to `completed` in the same operation.
    pub async fn submit(
        &self,
        actor: &Actor,
        appointment_id: &str,
        submission: RatingSubmission,
    ) -> Result<Appointment> {
        let appointment = self
            .appointments
            .find_by_id(appointment_id)
            .await?
            .ok_or_else(|| MawidError::NotFound(format!("appointment {appointment_id}")))?;

        let now = self.clock.now();
        let resolved = lifecycle::resolve(&appointment, now);
        if resolved != AppointmentStatus::Active {
            return Err(MawidError::InvalidState(format!(
                "rating is only permitted while the appointment is active (currently {resolved})"
            )));
        }

        if !policy::can_rate(actor, &appointment) {
            return Err(MawidError::Forbidden(
                "only admins or accepted attendees can rate this appointment".into(),
            ));
        }

        let today = lifecycle::civil_today(now);
        let window = if appointment.is_single_day() {
            RatingWindow::OnceEver
        } else {
            RatingWindow::OncePerDay { civil_date: today.clone() }
        };

        // Fast-path rejection on the loaded ledger; the append below
        // re-checks atomically so a concurrent duplicate still loses.
        check_window(&appointment, &actor.id, &window)?;

        let entry = build_entry(&appointment, &actor.id, &submission, now.timestamp(), today);
        let mark_completed = appointment.is_single_day();

        if !self
            .appointments
            .append_rating(appointment_id, entry, window.clone(), mark_completed)
            .await?
        {
            return Err(duplicate_error(&window));
        }

        info!(
            appointment_id = %appointment_id,
            rater = %actor.id,
            completed = mark_completed,
            "rating submitted"
        );

        self.appointments
            .find_by_id(appointment_id)
            .await?
            .ok_or_else(|| MawidError::NotFound(format!("appointment {appointment_id}")))
    }
}

fn check_window(appointment: &Appointment, rater_id: &str, window: &RatingWindow) -> Result<()> {
    let duplicate = match window {
        RatingWindow::OncePerDay { civil_date } => appointment
            .ratings
            .iter()
            .any(|entry| entry.rated_by == rater_id && &entry.rated_on == civil_date),
        RatingWindow::OnceEver => appointment
            .ratings
            .iter()
            .any(|entry| entry.rated_by == rater_id && entry.has_rated),
    };

    if duplicate {
        Err(duplicate_error(window))
    } else {
        Ok(())
    }
}

fn duplicate_error(window: &RatingWindow) -> MawidError {
    match window {
        RatingWindow::OncePerDay { .. } => {
            MawidError::Conflict("you have already rated this appointment today".into())
        }
        RatingWindow::OnceEver => {
            MawidError::Conflict("you have already rated this appointment".into())
        }
    }
}

/// Build the ledger entry for a submission: one rated-user record per
/// currently accepted attendee, each carrying the full review batch and
/// the points sum, fixed at submission time.
fn build_entry(
    appointment: &Appointment,
    rater_id: &str,
    submission: &RatingSubmission,
    rated_at: i64,
    rated_on: String,
) -> RatingEntry {
    let cumulative: i32 = submission.reviews.iter().map(|review| review.points).sum();
    let comment = submission.comment.clone().unwrap_or_default();

    let users = appointment
        .accepted_by
        .iter()
        .map(|user_id| RatedUserEntry {
            rated_user: user_id.clone(),
            cumulative_rating_points: cumulative,
            comment: comment.clone(),
            reviews: submission.reviews.clone(),
        })
        .collect();

    RatingEntry { rated_by: rater_id.to_string(), has_rated: true, rated_at, rated_on, users }
}
