//! Status sweep - periodic re-resolution of persisted statuses
//!
//! The sweep only ever overwrites `persisted_status` with the resolver's
//! pure output, so it is idempotent, at-least-once, and safe to run
//! concurrently with request handling.

use std::sync::Arc;

use tracing::{debug, info};

use crate::appointments::ports::AppointmentRepository;
use crate::clock::Clock;
use crate::lifecycle;

/// Re-resolves and persists appointment statuses
pub struct StatusSweepService {
    appointments: Arc<dyn AppointmentRepository>,
    clock: Arc<dyn Clock>,
}

impl StatusSweepService {
    pub fn new(appointments: Arc<dyn AppointmentRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { appointments, clock }
    }

    /// Run one sweep pass; returns the number of updated appointments.
    ///
    /// Terminal appointments are excluded from the candidate set, and
    /// `pending` candidates resolve to themselves, so only genuine
    /// inactive/active/expired transitions are written back.
    pub async fn run_once(&self) -> mawid_domain::Result<usize> {
        let now = self.clock.now();
        let candidates = self.appointments.list_non_terminal().await?;
        let total = candidates.len();

        let mut updated = 0;
        for appointment in candidates {
            let resolved = lifecycle::resolve(&appointment, now);
            if resolved != appointment.status {
                self.appointments.set_status(&appointment.id, resolved).await?;
                debug!(
                    appointment_id = %appointment.id,
                    from = %appointment.status,
                    to = %resolved,
                    "status swept"
                );
                updated += 1;
            }
        }

        info!(candidates = total, updated, "status sweep finished");
        Ok(updated)
    }
}
