use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use vidhub_core::StoreResult;
use vidhub_core::store::{CredentialStore, ProfileUpdate};
use vidhub_types::models::UserRecord;

use crate::{Database, select_by_ids, timestamp_at, uuid_at};

const USER_COLUMNS: &str =
    "id, username, email, full_name, avatar, cover_image, password, refresh_token, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: uuid_at(row, 0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        full_name: row.get(3)?,
        avatar: row.get(4)?,
        cover_image: row.get(5)?,
        password_hash: row.get(6)?,
        refresh_token: row.get(7)?,
        created_at: timestamp_at(row, 8)?,
    })
}

fn query_user_where(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRecord>> {
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
    let user = conn.query_row(&sql, [value], user_from_row).optional()?;
    Ok(user)
}

impl CredentialStore for Database {
    fn insert_user(&self, user: &UserRecord) -> StoreResult<()> {
        self.write(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, full_name, avatar, cover_image, password, refresh_token, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    user.id.to_string(),
                    user.username,
                    user.email,
                    user.full_name,
                    user.avatar,
                    user.cover_image,
                    user.password_hash,
                    user.refresh_token,
                    user.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    fn user_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        self.read(|conn| query_user_where(conn, "id", &id.to_string()))
    }

    fn user_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        self.read(|conn| query_user_where(conn, "username", username))
    }

    fn user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        self.read(|conn| query_user_where(conn, "email", email))
    }

    fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<UserRecord>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        self.read(|conn| select_by_ids(conn, "users", USER_COLUMNS, ids, user_from_row))
    }

    fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> StoreResult<()> {
        self.write(|conn| {
            conn.execute(
                "UPDATE users SET
                    full_name   = COALESCE(?2, full_name),
                    email       = COALESCE(?3, email),
                    avatar      = COALESCE(?4, avatar),
                    cover_image = COALESCE(?5, cover_image)
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    update.full_name.as_deref(),
                    update.email.as_deref(),
                    update.avatar.as_deref(),
                    update.cover_image.as_deref(),
                ],
            )?;
            Ok(())
        })
    }

    fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        self.write(|conn| {
            conn.execute(
                "UPDATE users SET password = ?2 WHERE id = ?1",
                params![id.to_string(), password_hash],
            )?;
            Ok(())
        })
    }

    fn set_refresh_fingerprint(&self, id: Uuid, fingerprint: Option<&str>) -> StoreResult<()> {
        self.write(|conn| {
            conn.execute(
                "UPDATE users SET refresh_token = ?2 WHERE id = ?1",
                params![id.to_string(), fingerprint],
            )?;
            Ok(())
        })
    }

    fn swap_refresh_fingerprint(&self, id: Uuid, expected: &str, next: &str) -> StoreResult<bool> {
        self.write(|conn| {
            let changed = conn.execute(
                "UPDATE users SET refresh_token = ?3 WHERE id = ?1 AND refresh_token = ?2",
                params![id.to_string(), expected, next],
            )?;
            Ok(changed == 1)
        })
    }
}
