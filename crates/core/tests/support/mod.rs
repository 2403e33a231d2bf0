//! Shared test support: an in-memory store implementing the repository
//! ports and a settable clock.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use mawid_core::appointments::ports::{
    AppointmentChanges, AppointmentFilter, AppointmentRepository, RatingWindow,
};
use mawid_core::clock::Clock;
use mawid_core::groups::ports::GroupRepository;
use mawid_core::users::ports::UserRepository;
use mawid_domain::constants::CIVIL_TIMEZONE;
use mawid_domain::{
    Appointment, AppointmentStatus, Group, MawidError, RatingEntry, Result, Role, User,
};

/// Build a UTC instant from a Cairo civil date and time.
pub fn civil(date: &str, time: &str) -> DateTime<Utc> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    let time = NaiveTime::parse_from_str(time, "%H:%M").unwrap();
    CIVIL_TIMEZONE
        .from_local_datetime(&date.and_time(time))
        .unwrap()
        .with_timezone(&Utc)
}

/// Clock with a settable instant
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(date: &str, time: &str) -> Self {
        Self { now: Mutex::new(civil(date, time)) }
    }

    pub fn set(&self, date: &str, time: &str) {
        *self.now.lock().unwrap() = civil(date, time);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Single in-memory store implementing all repository ports, mirroring
/// the one-authoritative-store model the services assume.
#[derive(Default)]
pub struct InMemoryStore {
    pub appointments: Mutex<HashMap<String, Appointment>>,
    pub groups: Mutex<HashMap<String, Group>>,
    pub users: Mutex<HashMap<String, User>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id.clone(), user);
    }

    pub fn seed_group(&self, group: Group) {
        self.groups.lock().unwrap().insert(group.id.clone(), group);
    }

    pub fn seed_appointment(&self, appointment: Appointment) {
        self.appointments.lock().unwrap().insert(appointment.id.clone(), appointment);
    }

    pub fn appointment(&self, id: &str) -> Option<Appointment> {
        self.appointments.lock().unwrap().get(id).cloned()
    }

    pub fn group(&self, id: &str) -> Option<Group> {
        self.groups.lock().unwrap().get(id).cloned()
    }

    pub fn user(&self, id: &str) -> Option<User> {
        self.users.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Appointment>> {
        Ok(self.appointments.lock().unwrap().get(id).cloned())
    }

    async fn create(&self, appointment: Appointment) -> Result<()> {
        self.appointments.lock().unwrap().insert(appointment.id.clone(), appointment);
        Ok(())
    }

    async fn update_details(&self, id: &str, changes: AppointmentChanges) -> Result<()> {
        let mut guard = self.appointments.lock().unwrap();
        let appointment = guard
            .get_mut(id)
            .ok_or_else(|| MawidError::NotFound(format!("appointment {id}")))?;
        if let Some(title) = changes.title {
            appointment.title = title;
        }
        if let Some(starting_date) = changes.starting_date {
            appointment.starting_date = starting_date;
        }
        if let Some(ending_date) = changes.ending_date {
            appointment.ending_date = Some(ending_date);
        }
        if let Some(starting_time) = changes.starting_time {
            appointment.starting_time = Some(starting_time);
        }
        if let Some(ending_time) = changes.ending_time {
            appointment.ending_time = Some(ending_time);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.appointments.lock().unwrap().remove(id);
        Ok(())
    }

    async fn set_status(&self, id: &str, status: AppointmentStatus) -> Result<()> {
        let mut guard = self.appointments.lock().unwrap();
        let appointment = guard
            .get_mut(id)
            .ok_or_else(|| MawidError::NotFound(format!("appointment {id}")))?;
        appointment.status = status;
        Ok(())
    }

    async fn add_accepted_by(&self, id: &str, user_id: &str) -> Result<bool> {
        let mut guard = self.appointments.lock().unwrap();
        let appointment = guard
            .get_mut(id)
            .ok_or_else(|| MawidError::NotFound(format!("appointment {id}")))?;
        if appointment.accepted_by.iter().any(|existing| existing == user_id) {
            return Ok(false);
        }
        appointment.accepted_by.push(user_id.to_string());
        Ok(true)
    }

    async fn append_rating(
        &self,
        id: &str,
        entry: RatingEntry,
        window: RatingWindow,
        mark_completed: bool,
    ) -> Result<bool> {
        let mut guard = self.appointments.lock().unwrap();
        let appointment = guard
            .get_mut(id)
            .ok_or_else(|| MawidError::NotFound(format!("appointment {id}")))?;

        let duplicate = match &window {
            RatingWindow::OncePerDay { civil_date } => appointment
                .ratings
                .iter()
                .any(|prior| prior.rated_by == entry.rated_by && &prior.rated_on == civil_date),
            RatingWindow::OnceEver => appointment
                .ratings
                .iter()
                .any(|prior| prior.rated_by == entry.rated_by && prior.has_rated),
        };
        if duplicate {
            return Ok(false);
        }

        appointment.ratings.push(entry);
        if mark_completed {
            appointment.status = AppointmentStatus::Completed;
        }
        Ok(true)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Appointment>> {
        let ids = self
            .users
            .lock()
            .unwrap()
            .get(user_id)
            .map(|user| user.appointment_ids.clone())
            .unwrap_or_default();
        let guard = self.appointments.lock().unwrap();
        Ok(ids.iter().filter_map(|id| guard.get(id).cloned()).collect())
    }

    async fn list(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>> {
        let guard = self.appointments.lock().unwrap();
        let mut results: Vec<Appointment> = guard
            .values()
            .filter(|apt| filter.status.map_or(true, |status| apt.status == status))
            .filter(|apt| filter.date.as_deref().map_or(true, |d| apt.starting_date == d))
            .filter(|apt| filter.from.as_deref().map_or(true, |d| apt.starting_date.as_str() >= d))
            .filter(|apt| filter.to.as_deref().map_or(true, |d| apt.starting_date.as_str() <= d))
            .cloned()
            .collect();
        results.sort_by(|a, b| {
            a.starting_date.cmp(&b.starting_date).then_with(|| a.id.cmp(&b.id))
        });
        let offset = filter.offset.unwrap_or(0) as usize;
        let results: Vec<Appointment> = results.into_iter().skip(offset).collect();
        match filter.limit {
            Some(limit) => Ok(results.into_iter().take(limit as usize).collect()),
            None => Ok(results),
        }
    }

    async fn list_non_terminal(&self) -> Result<Vec<Appointment>> {
        let guard = self.appointments.lock().unwrap();
        Ok(guard.values().filter(|apt| !apt.status.is_terminal()).cloned().collect())
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Group>> {
        Ok(self.groups.lock().unwrap().get(id).cloned())
    }

    async fn create(&self, group: Group) -> Result<()> {
        self.groups.lock().unwrap().insert(group.id.clone(), group);
        Ok(())
    }

    async fn update_details(
        &self,
        id: &str,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<()> {
        let mut guard = self.groups.lock().unwrap();
        let group =
            guard.get_mut(id).ok_or_else(|| MawidError::NotFound(format!("group {id}")))?;
        if let Some(name) = name {
            group.name = name;
        }
        if let Some(description) = description {
            group.description = Some(description);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.groups.lock().unwrap().remove(id);
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Group>> {
        let guard = self.groups.lock().unwrap();
        Ok(guard
            .values()
            .filter(|group| group.admin_id == user_id || group.is_member(user_id))
            .cloned()
            .collect())
    }

    async fn set_admin(&self, id: &str, admin_id: &str) -> Result<()> {
        let mut guard = self.groups.lock().unwrap();
        let group =
            guard.get_mut(id).ok_or_else(|| MawidError::NotFound(format!("group {id}")))?;
        group.admin_id = admin_id.to_string();
        Ok(())
    }

    async fn add_members(&self, id: &str, member_ids: &[String]) -> Result<()> {
        let mut guard = self.groups.lock().unwrap();
        let group =
            guard.get_mut(id).ok_or_else(|| MawidError::NotFound(format!("group {id}")))?;
        for member_id in member_ids {
            if !group.members.contains(member_id) {
                group.members.push(member_id.clone());
            }
        }
        Ok(())
    }

    async fn remove_members(&self, id: &str, member_ids: &[String]) -> Result<()> {
        let mut guard = self.groups.lock().unwrap();
        let group =
            guard.get_mut(id).ok_or_else(|| MawidError::NotFound(format!("group {id}")))?;
        group.members.retain(|member| !member_ids.contains(member));
        Ok(())
    }

    async fn add_appointment(&self, id: &str, appointment_id: &str) -> Result<()> {
        let mut guard = self.groups.lock().unwrap();
        let group =
            guard.get_mut(id).ok_or_else(|| MawidError::NotFound(format!("group {id}")))?;
        if !group.appointment_ids.iter().any(|existing| existing == appointment_id) {
            group.appointment_ids.push(appointment_id.to_string());
        }
        Ok(())
    }

    async fn remove_appointment(&self, id: &str, appointment_id: &str) -> Result<()> {
        let mut guard = self.groups.lock().unwrap();
        let group =
            guard.get_mut(id).ok_or_else(|| MawidError::NotFound(format!("group {id}")))?;
        group.appointment_ids.retain(|existing| existing != appointment_id);
        Ok(())
    }

    async fn administers_other_group(&self, user_id: &str, except_group: &str) -> Result<bool> {
        let guard = self.groups.lock().unwrap();
        Ok(guard.values().any(|group| group.id != except_group && group.admin_id == user_id))
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let guard = self.users.lock().unwrap();
        Ok(guard.values().find(|user| user.email == email).cloned())
    }

    async fn create(&self, user: User) -> Result<()> {
        self.users.lock().unwrap().insert(user.id.clone(), user);
        Ok(())
    }

    async fn update_profile(
        &self,
        id: &str,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<()> {
        let mut guard = self.users.lock().unwrap();
        let user =
            guard.get_mut(id).ok_or_else(|| MawidError::NotFound(format!("user {id}")))?;
        if let Some(name) = name {
            user.name = name;
        }
        if let Some(email) = email {
            user.email = email;
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.users.lock().unwrap().remove(id);
        Ok(())
    }

    async fn count_with_role(&self, role: Role) -> Result<u64> {
        let guard = self.users.lock().unwrap();
        Ok(guard.values().filter(|user| user.role == role).count() as u64)
    }

    async fn set_role(&self, id: &str, role: Role) -> Result<()> {
        let mut guard = self.users.lock().unwrap();
        let user =
            guard.get_mut(id).ok_or_else(|| MawidError::NotFound(format!("user {id}")))?;
        user.role = role;
        Ok(())
    }

    async fn add_appointment(&self, user_id: &str, appointment_id: &str) -> Result<()> {
        let mut guard = self.users.lock().unwrap();
        let user = guard
            .get_mut(user_id)
            .ok_or_else(|| MawidError::NotFound(format!("user {user_id}")))?;
        if !user.appointment_ids.iter().any(|existing| existing == appointment_id) {
            user.appointment_ids.push(appointment_id.to_string());
        }
        Ok(())
    }

    async fn remove_appointment(&self, user_id: &str, appointment_id: &str) -> Result<()> {
        let mut guard = self.users.lock().unwrap();
        // Attendees may have been deleted already; retraction is best-effort
        if let Some(user) = guard.get_mut(user_id) {
            user.appointment_ids.retain(|existing| existing != appointment_id);
        }
        Ok(())
    }

    async fn add_group(&self, user_id: &str, group_id: &str) -> Result<()> {
        let mut guard = self.users.lock().unwrap();
        let user = guard
            .get_mut(user_id)
            .ok_or_else(|| MawidError::NotFound(format!("user {user_id}")))?;
        if !user.group_ids.iter().any(|existing| existing == group_id) {
            user.group_ids.push(group_id.to_string());
        }
        Ok(())
    }

    async fn remove_group(&self, user_id: &str, group_id: &str) -> Result<()> {
        let mut guard = self.users.lock().unwrap();
        if let Some(user) = guard.get_mut(user_id) {
            user.group_ids.retain(|existing| existing != group_id);
        }
        Ok(())
    }
}

// =============================================================================
// Builders
// =============================================================================

pub fn make_user(id: &str, role: Role) -> User {
    User {
        id: id.into(),
        email: format!("{id}@example.com"),
        name: format!("User {id}"),
        role,
        appointment_ids: vec![],
        group_ids: vec![],
        created_at: 0,
        updated_at: 0,
    }
}

pub fn make_group(id: &str, admin_id: &str, members: &[&str]) -> Group {
    Group {
        id: id.into(),
        name: format!("Group {id}"),
        description: None,
        admin_id: admin_id.into(),
        members: members.iter().map(|s| (*s).to_string()).collect(),
        appointment_ids: vec![],
        created_at: 0,
        updated_at: 0,
    }
}

pub fn make_appointment(id: &str, starting_date: &str, status: AppointmentStatus) -> Appointment {
    Appointment {
        id: id.into(),
        title: format!("Appointment {id}"),
        creator_id: "creator".into(),
        group_ids: vec![],
        starting_date: starting_date.into(),
        ending_date: None,
        starting_time: None,
        ending_time: None,
        status,
        attendance: vec![],
        accepted_by: vec![],
        ratings: vec![],
        created_at: 0,
        updated_at: 0,
    }
}
