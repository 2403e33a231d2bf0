//! SQLite persistence layer
//!
//! Repository implementations of the core ports. All queries run on the
//! blocking thread pool; connections come from a shared r2d2 pool.

pub mod appointment_repository;
pub mod group_repository;
pub mod manager;
pub mod user_repository;

pub use appointment_repository::SqliteAppointmentRepository;
pub use group_repository::SqliteGroupRepository;
pub use manager::DbManager;
pub use user_repository::SqliteUserRepository;

use mawid_domain::MawidError;
use rusqlite::{params, Connection};
use tokio::task;

pub(crate) fn map_sql_error(err: rusqlite::Error) -> MawidError {
    MawidError::Database(format!("SQLite error: {err}"))
}

/// Collect a single TEXT column keyed by one parameter.
pub(crate) fn query_strings(
    conn: &Connection,
    sql: &str,
    param: &str,
) -> mawid_domain::Result<Vec<String>> {
    let mut statement = conn.prepare(sql).map_err(map_sql_error)?;
    let values = statement
        .query_map(params![param], |row| row.get::<_, String>(0))
        .map_err(map_sql_error)?
        .collect::<rusqlite::Result<Vec<String>>>()
        .map_err(map_sql_error)?;
    Ok(values)
}

pub(crate) fn map_pool_error(err: r2d2::Error) -> MawidError {
    MawidError::Database(format!("Connection pool error: {err}"))
}

pub(crate) fn map_join_error(err: task::JoinError) -> MawidError {
    MawidError::Internal(format!("Task join error: {err}"))
}
