//! Appointment lifecycle status derivation
//!
//! Translates an appointment's stored civil date/time strings plus its
//! persisted status into the authoritative runtime status. Resolution is
//! a pure, idempotent projection: it never mutates anything and is safe
//! to call repeatedly. Callers decide whether to persist the result.
//!
//! All comparisons happen on civil (naive) date-times in the fixed
//! timezone, which matches how the strings were written and sidesteps
//! DST gap/fold ambiguity on the conversion back from the wall clock.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use mawid_domain::constants::{
    CIVIL_DATE_FORMAT, CIVIL_TIMEZONE, CIVIL_TIME_FORMAT, DEFAULT_ENDING_TIME,
    DEFAULT_STARTING_TIME,
};
use mawid_domain::{Appointment, AppointmentStatus};

/// Resolve the runtime status of an appointment at instant `now`.
///
/// - Terminal statuses (`rejected`, `completed`) pass through unchanged;
///   they are admin/rating-driven and the clock must never override them.
/// - `pending` also passes through: only an explicit admin action clears
///   it, never the clock, so an un-approved appointment is never silently
///   promoted to `active`.
/// - Unparseable bounds fail open to the persisted status.
/// - Otherwise the civil window classifies `now` as inactive / active /
///   expired, with both boundary instants counting as `active`.
pub fn resolve(appointment: &Appointment, now: DateTime<Utc>) -> AppointmentStatus {
    let persisted = appointment.status;
    if persisted.is_terminal() || persisted == AppointmentStatus::Pending {
        return persisted;
    }

    let Some((start, end)) = civil_window(appointment) else {
        return persisted;
    };

    let now_civil = civil_now(now);
    if now_civil < start {
        AppointmentStatus::Inactive
    } else if now_civil <= end {
        AppointmentStatus::Active
    } else {
        AppointmentStatus::Expired
    }
}

/// The appointment's civil window, `None` when any bound fails to parse.
///
/// A single-day appointment (no ending date) uses the starting date for
/// both bounds; missing times fall back to start/end of day.
pub fn civil_window(appointment: &Appointment) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let starting_time =
        appointment.starting_time.as_deref().unwrap_or(DEFAULT_STARTING_TIME);
    let ending_time = appointment.ending_time.as_deref().unwrap_or(DEFAULT_ENDING_TIME);
    let ending_date =
        appointment.ending_date.as_deref().unwrap_or(&appointment.starting_date);

    let start = combine(&appointment.starting_date, starting_time)?;
    let end = combine(ending_date, ending_time)?;
    Some((start, end))
}

/// Combine a civil date string and a civil time string.
pub fn combine(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date, CIVIL_DATE_FORMAT).ok()?;
    let time = NaiveTime::parse_from_str(time, CIVIL_TIME_FORMAT).ok()?;
    Some(date.and_time(time))
}

/// The instant `now` expressed as a civil date-time in the fixed zone.
pub fn civil_now(now: DateTime<Utc>) -> NaiveDateTime {
    now.with_timezone(&CIVIL_TIMEZONE).naive_local()
}

/// The civil date of instant `now` (`YYYY-MM-DD`), used as the eligible
/// window key for ranged-appointment ratings.
pub fn civil_today(now: DateTime<Utc>) -> String {
    civil_now(now).format(CIVIL_DATE_FORMAT).to_string()
}

/// True when the combined starting instant lies strictly in the future.
///
/// Returns `None` when the bounds do not parse; the creation path treats
/// that as a validation failure rather than failing open.
pub fn starts_in_future(
    starting_date: &str,
    starting_time: Option<&str>,
    now: DateTime<Utc>,
) -> Option<bool> {
    let start = combine(starting_date, starting_time.unwrap_or(DEFAULT_STARTING_TIME))?;
    Some(start > civil_now(now))
}
