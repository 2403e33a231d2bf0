//! User repository implementation using SQLite

use std::sync::Arc;

use async_trait::async_trait;
use mawid_core::users::ports::UserRepository;
use mawid_domain::{Result as DomainResult, Role, User};
use rusqlite::{params, Connection, Row};
use tokio::task;

use super::{map_join_error, map_sql_error, query_strings, DbManager};

/// SQLite-backed implementation of `UserRepository`
pub struct SqliteUserRepository {
    db: Arc<DbManager>,
}

impl SqliteUserRepository {
    /// Create a new repository instance
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<User>> {
            let conn = db.get_connection()?;
            load_user_by(&conn, "id", &id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let db = Arc::clone(&self.db);
        let email = email.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<User>> {
            let conn = db.get_connection()?;
            load_user_by(&conn, "email", &email)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn create(&self, user: User) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO users (id, email, name, role, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    &user.id,
                    &user.email,
                    &user.name,
                    user.role.to_string(),
                    user.created_at,
                    user.updated_at,
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update_profile(
        &self,
        id: &str,
        name: Option<String>,
        email: Option<String>,
    ) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE users SET
                    name = COALESCE(?2, name),
                    email = COALESCE(?3, email),
                    updated_at = CAST(strftime('%s','now') AS INTEGER)
                 WHERE id = ?1",
                params![&id, &name, &email],
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
                "DELETE FROM users WHERE id = ?1",
                "DELETE FROM user_appointments WHERE user_id = ?1",
                "DELETE FROM user_groups WHERE user_id = ?1",
            ] {
                tx.execute(statement, params![&id]).map_err(map_sql_error)?;
            }

            tx.commit().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn count_with_role(&self, role: Role) -> DomainResult<u64> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<u64> {
            let conn = db.get_connection()?;
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM users WHERE role = ?1",
                    params![role.to_string()],
                    |row| row.get(0),
                )
                .map_err(map_sql_error)?;
            Ok(count as u64)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn set_role(&self, id: &str, role: Role) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE users SET role = ?2,
                    updated_at = CAST(strftime('%s','now') AS INTEGER)
                 WHERE id = ?1",
                params![&id, role.to_string()],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn add_appointment(&self, user_id: &str, appointment_id: &str) -> DomainResult<()> {
        self.link(
            "INSERT OR IGNORE INTO user_appointments (user_id, appointment_id) VALUES (?1, ?2)",
            user_id,
            appointment_id,
        )
        .await
    }

    async fn remove_appointment(&self, user_id: &str, appointment_id: &str) -> DomainResult<()> {
        self.link(
            "DELETE FROM user_appointments WHERE user_id = ?1 AND appointment_id = ?2",
            user_id,
            appointment_id,
        )
        .await
    }

    async fn add_group(&self, user_id: &str, group_id: &str) -> DomainResult<()> {
        self.link(
            "INSERT OR IGNORE INTO user_groups (user_id, group_id) VALUES (?1, ?2)",
            user_id,
            group_id,
        )
        .await
    }

    async fn remove_group(&self, user_id: &str, group_id: &str) -> DomainResult<()> {
        self.link(
            "DELETE FROM user_groups WHERE user_id = ?1 AND group_id = ?2",
            user_id,
            group_id,
        )
        .await
    }
}

impl SqliteUserRepository {
    /// Run one two-parameter membership statement on the blocking pool.
    async fn link(&self, sql: &'static str, first: &str, second: &str) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let first = first.to_string();
        let second = second.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(sql, params![&first, &second]).map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn map_user_row(row: &Row) -> rusqlite::Result<User> {
    let role: String = row.get(3)?;
    let role = role.parse::<Role>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, err.into())
    })?;

    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        appointment_ids: Vec::new(),
        group_ids: Vec::new(),
    })
}

/// Load one user (by id or email) with their membership sets.
fn load_user_by(conn: &Connection, column: &str, value: &str) -> DomainResult<Option<User>> {
    let sql = format!(
        "SELECT id, email, name, role, created_at, updated_at FROM users WHERE {column} = ?1"
    );
    let header = conn.query_row(&sql, params![value], map_user_row);

    let mut user = match header {
        Ok(user) => user,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(err) => return Err(map_sql_error(err)),
    };

    user.appointment_ids = query_strings(
        conn,
        "SELECT appointment_id FROM user_appointments WHERE user_id = ?1 ORDER BY appointment_id",
        &user.id,
    )?;
    user.group_ids = query_strings(
        conn,
        "SELECT group_id FROM user_groups WHERE user_id = ?1 ORDER BY group_id",
        &user.id,
    )?;

    Ok(Some(user))
}
