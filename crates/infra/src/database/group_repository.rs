//! Group repository implementation using SQLite

use std::sync::Arc;

use async_trait::async_trait;
use mawid_core::groups::ports::GroupRepository;
use mawid_domain::{Group, Result as DomainResult};
use rusqlite::{params, Connection, Row};
use tokio::task;

use super::{map_join_error, map_sql_error, query_strings, DbManager};

/// SQLite-backed implementation of `GroupRepository`
pub struct SqliteGroupRepository {
    db: Arc<DbManager>,
}

impl SqliteGroupRepository {
    /// Create a new repository instance
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GroupRepository for SqliteGroupRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Group>> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<Group>> {
            let conn = db.get_connection()?;
            load_group(&conn, &id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn create(&self, group: Group) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;

            tx.execute(
                "INSERT INTO groups (id, name, description, admin_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    &group.id,
                    &group.name,
                    &group.description,
                    &group.admin_id,
                    group.created_at,
                    group.updated_at,
                ],
            )
            .map_err(map_sql_error)?;

            for member_id in &group.members {
                tx.execute(
                    "INSERT OR IGNORE INTO group_members (group_id, user_id) VALUES (?1, ?2)",
                    params![&group.id, member_id],
                )
                .map_err(map_sql_error)?;
            }

            tx.commit().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update_details(
        &self,
        id: &str,
        name: Option<String>,
        description: Option<String>,
    ) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE groups SET
                    name = COALESCE(?2, name),
                    description = COALESCE(?3, description),
                    updated_at = CAST(strftime('%s','now') AS INTEGER)
                 WHERE id = ?1",
                params![&id, &name, &description],
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
                "DELETE FROM groups WHERE id = ?1",
                "DELETE FROM group_members WHERE group_id = ?1",
                "DELETE FROM group_appointments WHERE group_id = ?1",
            ] {
                tx.execute(statement, params![&id]).map_err(map_sql_error)?;
            }

            tx.commit().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<Group>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> DomainResult<Vec<Group>> {
            let conn = db.get_connection()?;
            let ids = query_strings(
                &conn,
                "SELECT DISTINCT g.id FROM groups g
                 LEFT JOIN group_members m ON m.group_id = g.id
                 WHERE g.admin_id = ?1 OR m.user_id = ?1
                 ORDER BY g.id",
                &user_id,
            )?;

            let mut groups = Vec::with_capacity(ids.len());
            for id in &ids {
                if let Some(group) = load_group(&conn, id)? {
                    groups.push(group);
                }
            }
            Ok(groups)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn set_admin(&self, id: &str, admin_id: &str) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();
        let admin_id = admin_id.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE groups SET admin_id = ?2,
                    updated_at = CAST(strftime('%s','now') AS INTEGER)
                 WHERE id = ?1",
                params![&id, &admin_id],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn add_members(&self, id: &str, member_ids: &[String]) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();
        let member_ids = member_ids.to_vec();

        task::spawn_blocking(move || -> DomainResult<()> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            for member_id in &member_ids {
                tx.execute(
                    "INSERT OR IGNORE INTO group_members (group_id, user_id) VALUES (?1, ?2)",
                    params![&id, member_id],
                )
                .map_err(map_sql_error)?;
            }
            tx.commit().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn remove_members(&self, id: &str, member_ids: &[String]) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();
        let member_ids = member_ids.to_vec();

        task::spawn_blocking(move || -> DomainResult<()> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            for member_id in &member_ids {
                tx.execute(
                    "DELETE FROM group_members WHERE group_id = ?1 AND user_id = ?2",
                    params![&id, member_id],
                )
                .map_err(map_sql_error)?;
            }
            tx.commit().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn add_appointment(&self, id: &str, appointment_id: &str) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();
        let appointment_id = appointment_id.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT OR IGNORE INTO group_appointments (group_id, appointment_id)
                 VALUES (?1, ?2)",
                params![&id, &appointment_id],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn remove_appointment(&self, id: &str, appointment_id: &str) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();
        let appointment_id = appointment_id.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "DELETE FROM group_appointments WHERE group_id = ?1 AND appointment_id = ?2",
                params![&id, &appointment_id],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn administers_other_group(
        &self,
        user_id: &str,
        except_group: &str,
    ) -> DomainResult<bool> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();
        let except_group = except_group.to_string();

        task::spawn_blocking(move || -> DomainResult<bool> {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM groups WHERE admin_id = ?1 AND id != ?2)",
                params![&user_id, &except_group],
                |row| row.get(0),
            )
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn map_group_row(row: &Row) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        admin_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        members: Vec::new(),
        appointment_ids: Vec::new(),
    })
}

/// Load one group with its member and appointment sets.
fn load_group(conn: &Connection, id: &str) -> DomainResult<Option<Group>> {
    let header = conn.query_row(
        "SELECT id, name, description, admin_id, created_at, updated_at
         FROM groups WHERE id = ?1",
        params![id],
        map_group_row,
    );

    let mut group = match header {
        Ok(group) => group,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(err) => return Err(map_sql_error(err)),
    };

    group.members = query_strings(
        conn,
        "SELECT user_id FROM group_members WHERE group_id = ?1 ORDER BY user_id",
        id,
    )?;
    group.appointment_ids = query_strings(
        conn,
        "SELECT appointment_id FROM group_appointments WHERE group_id = ?1 ORDER BY appointment_id",
        id,
    )?;

    Ok(Some(group))
}
