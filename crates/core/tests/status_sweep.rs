//! Integration tests for the periodic status sweep

mod support;

use std::sync::Arc;

use mawid_core::StatusSweepService;
use mawid_domain::AppointmentStatus;
use support::{make_appointment, FixedClock, InMemoryStore};

fn service(store: &Arc<InMemoryStore>, clock: &Arc<FixedClock>) -> StatusSweepService {
    StatusSweepService::new(store.clone(), clock.clone())
}

#[tokio::test]
async fn sweep_persists_resolver_output_for_live_appointments() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::at("2025-03-10", "12:00"));

    // Became active today
    store.seed_appointment(make_appointment("apt-live", "2025-03-10", AppointmentStatus::Inactive));
    // Over since last week
    store.seed_appointment(make_appointment("apt-old", "2025-03-01", AppointmentStatus::Active));
    // Awaiting admin approval: the sweep must not touch it
    store.seed_appointment(make_appointment("apt-pending", "2025-03-10", AppointmentStatus::Pending));
    // Terminal: excluded from the candidate set entirely
    store.seed_appointment(make_appointment("apt-done", "2025-03-01", AppointmentStatus::Completed));

    let sweep = service(&store, &clock);
    let updated = sweep.run_once().await.unwrap();
    assert_eq!(updated, 2);

    assert_eq!(store.appointment("apt-live").unwrap().status, AppointmentStatus::Active);
    assert_eq!(store.appointment("apt-old").unwrap().status, AppointmentStatus::Expired);
    assert_eq!(store.appointment("apt-pending").unwrap().status, AppointmentStatus::Pending);
    assert_eq!(store.appointment("apt-done").unwrap().status, AppointmentStatus::Completed);
}

#[tokio::test]
async fn sweep_is_idempotent() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::at("2025-03-10", "12:00"));
    store.seed_appointment(make_appointment("apt-1", "2025-03-01", AppointmentStatus::Inactive));

    let sweep = service(&store, &clock);
    assert_eq!(sweep.run_once().await.unwrap(), 1);
    // Second pass finds everything already projected
    assert_eq!(sweep.run_once().await.unwrap(), 0);
}

#[tokio::test]
async fn sweep_leaves_unparseable_bounds_alone() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::at("2025-03-10", "12:00"));
    let mut appointment = make_appointment("apt-1", "garbage", AppointmentStatus::Inactive);
    appointment.starting_time = Some("also garbage".into());
    store.seed_appointment(appointment);

    let sweep = service(&store, &clock);
    assert_eq!(sweep.run_once().await.unwrap(), 0);
    assert_eq!(store.appointment("apt-1").unwrap().status, AppointmentStatus::Inactive);
}
