//! Integration tests for the rating ledger

mod support;

use std::sync::Arc;

use mawid_core::{Actor, RatingService, RatingSubmission};
use mawid_domain::{Appointment, AppointmentStatus, MawidError, Review, Role};
use support::{make_appointment, FixedClock, InMemoryStore};

fn service(store: &Arc<InMemoryStore>, clock: &Arc<FixedClock>) -> RatingService {
    RatingService::new(store.clone(), clock.clone())
}

/// An approved appointment on 2025-03-10, 09:00-17:00, with accepted
/// attendees.
fn single_day_appointment(accepted: &[&str]) -> Appointment {
    let mut appointment = make_appointment("apt-1", "2025-03-10", AppointmentStatus::Inactive);
    appointment.starting_time = Some("09:00".into());
    appointment.ending_time = Some("17:00".into());
    appointment.attendance = accepted.iter().map(|s| (*s).to_string()).collect();
    appointment.accepted_by = accepted.iter().map(|s| (*s).to_string()).collect();
    appointment
}

fn ranged_appointment(accepted: &[&str]) -> Appointment {
    let mut appointment = single_day_appointment(accepted);
    appointment.ending_date = Some("2025-03-12".into());
    appointment.ending_time = Some("23:00".into());
    appointment
}

fn submission() -> RatingSubmission {
    RatingSubmission {
        reviews: vec![
            Review { title: "punctuality".into(), points: 4 },
            Review { title: "courtesy".into(), points: 5 },
        ],
        comment: None,
    }
}

#[tokio::test]
async fn rating_outside_active_window_is_invalid_state() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::at("2025-03-10", "08:00"));
    store.seed_appointment(single_day_appointment(&["user-2"]));
    let service = service(&store, &clock);
    let actor = Actor::new("user-2", Role::User);

    // Before the window
    let err = service.submit(&actor, "apt-1", submission()).await.unwrap_err();
    assert!(matches!(err, MawidError::InvalidState(_)));

    // After the window
    clock.set("2025-03-10", "18:00");
    let err = service.submit(&actor, "apt-1", submission()).await.unwrap_err();
    assert!(matches!(err, MawidError::InvalidState(_)));
}

#[tokio::test]
async fn pending_appointment_cannot_be_rated() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::at("2025-03-10", "10:00"));
    let mut appointment = single_day_appointment(&["user-2"]);
    appointment.status = AppointmentStatus::Pending;
    store.seed_appointment(appointment);
    let service = service(&store, &clock);

    let err = service
        .submit(&Actor::new("user-2", Role::User), "apt-1", submission())
        .await
        .unwrap_err();
    assert!(matches!(err, MawidError::InvalidState(_)));
}

#[tokio::test]
async fn non_accepted_attendee_is_forbidden() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::at("2025-03-10", "10:00"));
    let mut appointment = single_day_appointment(&["user-2"]);
    appointment.attendance.push("user-3".into()); // invited but never accepted
    store.seed_appointment(appointment);
    let service = service(&store, &clock);

    let err = service
        .submit(&Actor::new("user-3", Role::User), "apt-1", submission())
        .await
        .unwrap_err();
    assert!(matches!(err, MawidError::Forbidden(_)));
}

#[tokio::test]
async fn admin_may_rate_without_accepting() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::at("2025-03-10", "10:00"));
    store.seed_appointment(single_day_appointment(&["user-2"]));
    let service = service(&store, &clock);

    let updated = service
        .submit(&Actor::new("admin-9", Role::Admin), "apt-1", submission())
        .await
        .unwrap();
    assert_eq!(updated.ratings.len(), 1);
}

#[tokio::test]
async fn single_day_submission_completes_and_blocks_repeats() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::at("2025-03-10", "10:00"));
    store.seed_appointment(single_day_appointment(&["user-2", "user-3"]));
    let service = service(&store, &clock);
    let actor = Actor::new("user-2", Role::User);

    let updated = service.submit(&actor, "apt-1", submission()).await.unwrap();

    // One rated-user record per accepted attendee, points summed once
    assert_eq!(updated.ratings.len(), 1);
    let entry = &updated.ratings[0];
    assert_eq!(entry.rated_by, "user-2");
    assert_eq!(entry.users.len(), 2);
    assert!(entry.users.iter().all(|rated| rated.cumulative_rating_points == 9));

    // Single-day submission is terminal
    assert_eq!(updated.status, AppointmentStatus::Completed);

    // A second attempt fails: the appointment is no longer active
    let err = service.submit(&actor, "apt-1", submission()).await.unwrap_err();
    assert!(matches!(err, MawidError::InvalidState(_)));
}

#[tokio::test]
async fn single_day_rater_submits_at_most_once_ever() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::at("2025-03-10", "10:00"));
    let mut appointment = single_day_appointment(&["user-2"]);
    // A prior submission by the same rater, appointment still active
    appointment.ratings.push(mawid_domain::RatingEntry {
        rated_by: "user-2".into(),
        has_rated: true,
        rated_at: 0,
        rated_on: "2025-03-10".into(),
        users: vec![],
    });
    store.seed_appointment(appointment);
    let service = service(&store, &clock);

    let err = service
        .submit(&Actor::new("user-2", Role::User), "apt-1", submission())
        .await
        .unwrap_err();
    assert!(matches!(err, MawidError::Conflict(_)));
}

#[tokio::test]
async fn ranged_rater_submits_once_per_civil_day() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::at("2025-03-10", "10:00"));
    store.seed_appointment(ranged_appointment(&["user-2"]));
    let service = service(&store, &clock);
    let actor = Actor::new("user-2", Role::User);

    // First submission of the day succeeds and does not complete
    let updated = service.submit(&actor, "apt-1", submission()).await.unwrap();
    assert_eq!(updated.ratings.len(), 1);
    assert_eq!(updated.status, AppointmentStatus::Inactive);

    // Same civil day: rejected
    clock.set("2025-03-10", "15:00");
    let err = service.submit(&actor, "apt-1", submission()).await.unwrap_err();
    assert!(matches!(err, MawidError::Conflict(_)));

    // Next civil day inside the range: accepted again
    clock.set("2025-03-11", "10:00");
    let updated = service.submit(&actor, "apt-1", submission()).await.unwrap();
    assert_eq!(updated.ratings.len(), 2);

    // Another rater on the same day is unaffected
    let other = Actor::new("admin-9", Role::Admin);
    let updated = service.submit(&other, "apt-1", submission()).await.unwrap();
    assert_eq!(updated.ratings.len(), 3);
}

#[tokio::test]
async fn unknown_appointment_is_not_found() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::at("2025-03-10", "10:00"));
    let service = service(&store, &clock);

    let err = service
        .submit(&Actor::new("user-2", Role::User), "missing", submission())
        .await
        .unwrap_err();
    assert!(matches!(err, MawidError::NotFound(_)));
}

#[tokio::test]
async fn ledger_entries_snapshot_accepted_set_at_submission_time() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::at("2025-03-10", "10:00"));
    store.seed_appointment(ranged_appointment(&["user-2"]));
    let service = service(&store, &clock);

    let updated = service
        .submit(&Actor::new("user-2", Role::User), "apt-1", submission())
        .await
        .unwrap();
    assert_eq!(updated.ratings[0].users.len(), 1);

    // A later acceptance widens only future entries
    {
        let mut guard = store.appointments.lock().unwrap();
        let appointment = guard.get_mut("apt-1").unwrap();
        appointment.accepted_by.push("user-3".into());
    }
    clock.set("2025-03-11", "10:00");
    let updated = service
        .submit(&Actor::new("user-2", Role::User), "apt-1", submission())
        .await
        .unwrap();
    assert_eq!(updated.ratings[0].users.len(), 1);
    assert_eq!(updated.ratings[1].users.len(), 2);
}
