use anyhow::Context;
use axum::{Json, extract::State};
use libsql::Value;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::AppState;
use crate::auth::AuthUser;
use crate::database::{Db, from_millis, to_millis, value_as_opt_string};
use crate::error::ApiError;
use crate::models::{DeletedAccount, PublicUser, User};
use crate::response::{Data, Envelope, data};

const USER_COLUMNS: &str = "id, username, name, password_hash, created_at";

/// Credential store: user records and their password hashes.
#[derive(Clone)]
pub struct UserStore {
    db: Db,
}

pub fn extract_user_from_row(row: libsql::Row) -> anyhow::Result<User> {
    let id: String = row.get(0).context("Failed to get user id")?;
    let username: String = row.get(1).context("Failed to get username")?;
    let name = value_as_opt_string(row.get_value(2)?)?;
    let password_hash: String = row.get(3).context("Failed to get password hash")?;
    let created_at: i64 = row.get(4).context("Failed to get user created_at")?;

    Ok(User {
        id,
        username,
        name,
        password_hash,
        created_at: from_millis(created_at)?,
    })
}

impl UserStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Inserts a user. A taken username surfaces as a `UNIQUE constraint`
    /// error, see [`crate::database::is_unique_violation`].
    pub async fn insert(
        &self,
        id: &str,
        username: &str,
        name: Option<&str>,
        password_hash: &str,
        created_at: OffsetDateTime,
    ) -> anyhow::Result<User> {
        let conn = self.db.write().await;
        conn.execute(
            "INSERT INTO users (id, username, name, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
            (
                id,
                username,
                name.map_or(Value::Null, |n| Value::Text(n.to_string())),
                password_hash,
                to_millis(created_at),
            ),
        )
        .await?;

        Ok(User {
            id: id.to_string(),
            username: username.to_string(),
            name: name.map(str::to_string),
            password_hash: password_hash.to_string(),
            created_at,
        })
    }

    pub async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        self.find_one(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"),
            username,
        )
        .await
    }

    pub async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<User>> {
        self.find_one(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"), id)
            .await
    }

    pub async fn exists(&self, username: &str) -> anyhow::Result<bool> {
        let conn = self.db.read().await;
        let mut rows = conn
            .query("SELECT 1 FROM users WHERE username = ?", [username])
            .await?;
        Ok(rows.next().await?.is_some())
    }

    async fn find_one(&self, sql: &str, key: &str) -> anyhow::Result<Option<User>> {
        let conn = self.db.read().await;
        let mut rows = conn.query(sql, [key]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(extract_user_from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Removes a user together with all of their entries. Returns the number of
    /// entries removed, or `None` when no such user exists.
    pub async fn delete(&self, id: &str) -> anyhow::Result<Option<u64>> {
        let conn = self.db.write().await;
        let tx = conn.transaction().await?;

        let removed_entries = tx
            .execute("DELETE FROM entries WHERE user_id = ?", [id])
            .await?;
        let removed_users = tx.execute("DELETE FROM users WHERE id = ?", [id]).await?;

        if removed_users == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        debug!(user_id = %id, removed_entries, "user deleted");
        Ok(Some(removed_entries))
    }
}

pub async fn me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Envelope<Data<PublicUser>>>, ApiError> {
    let user = state
        .users
        .find_by_id(&identity.user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(data(user.public()))
}

pub async fn delete_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Envelope<Data<DeletedAccount>>>, ApiError> {
    let removed_entries = state
        .users
        .delete(&identity.user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    info!(user_id = %identity.user_id, removed_entries, "account deleted");
    Ok(data(DeletedAccount {
        id: identity.user_id,
        removed_entries,
        message: "Account deleted successfully.".to_string(),
    }))
}
