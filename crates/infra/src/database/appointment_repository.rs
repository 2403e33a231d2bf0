//! Appointment repository implementation using SQLite
//!
//! Membership sets live in junction tables, so set-add is one
//! `INSERT OR IGNORE` and the acceptance CAS falls out of the primary
//! key. The rating window check and the ledger append share one
//! immediate transaction, which is what makes the once-per-window
//! invariant hold under concurrent submissions.

use std::sync::Arc;

use async_trait::async_trait;
use mawid_core::appointments::ports::{
    AppointmentChanges, AppointmentFilter, AppointmentRepository, RatingWindow,
};
use mawid_domain::{
    Appointment, AppointmentStatus, MawidError, RatedUserEntry, RatingEntry,
    Result as DomainResult,
};
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use tokio::task;

use super::{map_join_error, map_sql_error, query_strings, DbManager};

/// SQLite-backed implementation of `AppointmentRepository`
pub struct SqliteAppointmentRepository {
    db: Arc<DbManager>,
}

impl SqliteAppointmentRepository {
    /// Create a new repository instance
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AppointmentRepository for SqliteAppointmentRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Appointment>> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<Appointment>> {
            let conn = db.get_connection()?;
            load_appointment(&conn, &id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn create(&self, appointment: Appointment) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;

            tx.execute(
                "INSERT INTO appointments (
                    id, title, creator_id, starting_date, ending_date,
                    starting_time, ending_time, status, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    &appointment.id,
                    &appointment.title,
                    &appointment.creator_id,
                    &appointment.starting_date,
                    &appointment.ending_date,
                    &appointment.starting_time,
                    &appointment.ending_time,
                    appointment.status.to_string(),
                    appointment.created_at,
                    appointment.updated_at,
                ],
            )
            .map_err(map_sql_error)?;

            for user_id in &appointment.attendance {
                tx.execute(
                    "INSERT OR IGNORE INTO appointment_attendance (appointment_id, user_id)
                     VALUES (?1, ?2)",
                    params![&appointment.id, user_id],
                )
                .map_err(map_sql_error)?;
            }

            tx.commit().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update_details(&self, id: &str, changes: AppointmentChanges) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE appointments SET
                    title = COALESCE(?2, title),
                    starting_date = COALESCE(?3, starting_date),
                    ending_date = COALESCE(?4, ending_date),
                    starting_time = COALESCE(?5, starting_time),
                    ending_time = COALESCE(?6, ending_time),
                    updated_at = CAST(strftime('%s','now') AS INTEGER)
                 WHERE id = ?1",
                params![
                    &id,
                    &changes.title,
                    &changes.starting_date,
                    &changes.ending_date,
                    &changes.starting_time,
                    &changes.ending_time,
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;

            for statement in [
                "DELETE FROM appointments WHERE id = ?1",
                "DELETE FROM appointment_attendance WHERE appointment_id = ?1",
                "DELETE FROM appointment_accepted WHERE appointment_id = ?1",
                "DELETE FROM appointment_ratings WHERE appointment_id = ?1",
                "DELETE FROM group_appointments WHERE appointment_id = ?1",
                "DELETE FROM user_appointments WHERE appointment_id = ?1",
            ] {
                tx.execute(statement, params![&id]).map_err(map_sql_error)?;
            }

            tx.commit().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn set_status(&self, id: &str, status: AppointmentStatus) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE appointments SET status = ?2,
                    updated_at = CAST(strftime('%s','now') AS INTEGER)
                 WHERE id = ?1",
                params![&id, status.to_string()],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn add_accepted_by(&self, id: &str, user_id: &str) -> DomainResult<bool> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> DomainResult<bool> {
            let conn = db.get_connection()?;
            // The primary key makes this a natural compare-and-swap: a
            // concurrent duplicate insert changes zero rows.
            let changed = conn
                .execute(
                    "INSERT OR IGNORE INTO appointment_accepted (appointment_id, user_id, accepted_at)
                     VALUES (?1, ?2, CAST(strftime('%s','now') AS INTEGER))",
                    params![&id, &user_id],
                )
                .map_err(map_sql_error)?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn append_rating(
        &self,
        id: &str,
        entry: RatingEntry,
        window: RatingWindow,
        mark_completed: bool,
    ) -> DomainResult<bool> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> DomainResult<bool> {
            let mut conn = db.get_connection()?;
            // Immediate transaction: the window check and the append
            // must not interleave with a concurrent submission.
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(map_sql_error)?;

            let duplicate: bool = match &window {
                RatingWindow::OncePerDay { civil_date } => tx
                    .query_row(
                        "SELECT EXISTS(
                            SELECT 1 FROM appointment_ratings
                            WHERE appointment_id = ?1 AND rated_by = ?2 AND rated_on = ?3
                         )",
                        params![&id, &entry.rated_by, civil_date],
                        |row| row.get(0),
                    )
                    .map_err(map_sql_error)?,
                RatingWindow::OnceEver => tx
                    .query_row(
                        "SELECT EXISTS(
                            SELECT 1 FROM appointment_ratings
                            WHERE appointment_id = ?1 AND rated_by = ?2 AND has_rated = 1
                         )",
                        params![&id, &entry.rated_by],
                        |row| row.get(0),
                    )
                    .map_err(map_sql_error)?,
            };

            if duplicate {
                return Ok(false);
            }

            let users_json = serde_json::to_string(&entry.users)
                .map_err(|err| MawidError::Internal(format!("ledger serialization: {err}")))?;

            tx.execute(
                "INSERT INTO appointment_ratings
                    (appointment_id, rated_by, has_rated, rated_at, rated_on, users_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    &id,
                    &entry.rated_by,
                    i64::from(entry.has_rated),
                    entry.rated_at,
                    &entry.rated_on,
                    &users_json,
                ],
            )
            .map_err(map_sql_error)?;

            if mark_completed {
                tx.execute(
                    "UPDATE appointments SET status = ?2,
                        updated_at = CAST(strftime('%s','now') AS INTEGER)
                     WHERE id = ?1",
                    params![&id, AppointmentStatus::Completed.to_string()],
                )
                .map_err(map_sql_error)?;
            }

            tx.commit().map_err(map_sql_error)?;
            Ok(true)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<Appointment>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> DomainResult<Vec<Appointment>> {
            let conn = db.get_connection()?;
            let ids = query_strings(
                &conn,
                "SELECT a.id FROM appointments a
                 JOIN user_appointments ua ON ua.appointment_id = a.id
                 WHERE ua.user_id = ?1
                 ORDER BY a.starting_date, a.id",
                &user_id,
            )?;
            load_many(&conn, &ids)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list(&self, filter: AppointmentFilter) -> DomainResult<Vec<Appointment>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<Appointment>> {
            let conn = db.get_connection()?;

            let mut clauses: Vec<&str> = Vec::new();
            let mut values: Vec<String> = Vec::new();
            if let Some(status) = filter.status {
                clauses.push("status = ?");
                values.push(status.to_string());
            }
            if let Some(date) = &filter.date {
                clauses.push("starting_date = ?");
                values.push(date.clone());
            }
            if let Some(from) = &filter.from {
                clauses.push("starting_date >= ?");
                values.push(from.clone());
            }
            if let Some(to) = &filter.to {
                clauses.push("starting_date <= ?");
                values.push(to.clone());
            }

            let mut sql = String::from("SELECT id FROM appointments");
            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }
            sql.push_str(" ORDER BY starting_date, id");
            if let Some(limit) = filter.limit {
                sql.push_str(&format!(" LIMIT {limit}"));
                if let Some(offset) = filter.offset {
                    sql.push_str(&format!(" OFFSET {offset}"));
                }
            }

            let mut statement = conn.prepare(&sql).map_err(map_sql_error)?;
            let ids = statement
                .query_map(params_from_iter(values.iter()), |row| row.get::<_, String>(0))
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<String>>>()
                .map_err(map_sql_error)?;
            drop(statement);

            load_many(&conn, &ids)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_non_terminal(&self) -> DomainResult<Vec<Appointment>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<Appointment>> {
            let conn = db.get_connection()?;
            let mut statement = conn
                .prepare(
                    "SELECT id FROM appointments
                     WHERE status NOT IN ('rejected', 'completed')
                     ORDER BY starting_date, id",
                )
                .map_err(map_sql_error)?;
            let ids = statement
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<String>>>()
                .map_err(map_sql_error)?;
            drop(statement);

            load_many(&conn, &ids)
        })
        .await
        .map_err(map_join_error)?
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn map_appointment_row(row: &Row) -> rusqlite::Result<Appointment> {
    let status: String = row.get(7)?;
    let status = status.parse::<AppointmentStatus>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, err.into())
    })?;

    Ok(Appointment {
        id: row.get(0)?,
        title: row.get(1)?,
        creator_id: row.get(2)?,
        starting_date: row.get(3)?,
        ending_date: row.get(4)?,
        starting_time: row.get(5)?,
        ending_time: row.get(6)?,
        status,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        group_ids: Vec::new(),
        attendance: Vec::new(),
        accepted_by: Vec::new(),
        ratings: Vec::new(),
    })
}

/// Load one appointment with its membership sets and ledger.
fn load_appointment(conn: &Connection, id: &str) -> DomainResult<Option<Appointment>> {
    let header = conn.query_row(
        "SELECT id, title, creator_id, starting_date, ending_date,
                starting_time, ending_time, status, created_at, updated_at
         FROM appointments WHERE id = ?1",
        params![id],
        map_appointment_row,
    );

    let mut appointment = match header {
        Ok(appointment) => appointment,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(err) => return Err(map_sql_error(err)),
    };

    appointment.group_ids = query_strings(
        conn,
        "SELECT group_id FROM group_appointments WHERE appointment_id = ?1 ORDER BY group_id",
        id,
    )?;
    appointment.attendance = query_strings(
        conn,
        "SELECT user_id FROM appointment_attendance WHERE appointment_id = ?1 ORDER BY user_id",
        id,
    )?;
    appointment.accepted_by = query_strings(
        conn,
        "SELECT user_id FROM appointment_accepted
         WHERE appointment_id = ?1 ORDER BY accepted_at, user_id",
        id,
    )?;
    appointment.ratings = load_ratings(conn, id)?;

    Ok(Some(appointment))
}

fn load_many(conn: &Connection, ids: &[String]) -> DomainResult<Vec<Appointment>> {
    let mut appointments = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(appointment) = load_appointment(conn, id)? {
            appointments.push(appointment);
        }
    }
    Ok(appointments)
}

fn load_ratings(conn: &Connection, appointment_id: &str) -> DomainResult<Vec<RatingEntry>> {
    let mut statement = conn
        .prepare(
            "SELECT rated_by, has_rated, rated_at, rated_on, users_json
             FROM appointment_ratings WHERE appointment_id = ?1 ORDER BY id",
        )
        .map_err(map_sql_error)?;

    let rows = statement
        .query_map(params![appointment_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })
        .map_err(map_sql_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(map_sql_error)?;

    let mut entries = Vec::with_capacity(rows.len());
    for (rated_by, has_rated, rated_at, rated_on, users_json) in rows {
        let users: Vec<RatedUserEntry> = serde_json::from_str(&users_json)
            .map_err(|err| MawidError::Internal(format!("ledger deserialization: {err}")))?;
        entries.push(RatingEntry { rated_by, has_rated: has_rated != 0, rated_at, rated_on, users });
    }
    Ok(entries)
}
