//! # User Repository
//!
//! Staff accounts. The password hash only ever leaves this module inside a
//! [`UserRecord`], which the login handler uses for verification and then
//! drops.
//!
//! ## Last Admin Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  update(role != admin | is_active = false) ─┐                           │
//! │  delete(id) ────────────────────────────────┤                           │
//! │                                             ▼                           │
//! │                      target is an active admin?                         │
//! │                         │ yes                                           │
//! │                         ▼                                               │
//! │                 other active admins == 0 ──► DbError::Conflict          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The count and the write share one SQL transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::password::hash_password;
use tally_core::input::{NewUser, UserUpdate};
use tally_core::{Role, User};

const USER_COLUMNS: &str =
    "id, username, full_name, email, role, is_active, last_login_at, created_at, updated_at";

/// A user together with their password hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// All users ordered by username.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY username",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Case-insensitive lookup including the hash, for login.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {}, password_hash FROM users WHERE username = ?1",
            USER_COLUMNS
        ))
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Lookup including the hash, for password changes.
    pub async fn get_record_by_id(&self, id: &str) -> DbResult<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {}, password_hash FROM users WHERE id = ?1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Creates an active user, hashing the password.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username taken (case-insensitive)
    pub async fn insert(&self, new: &NewUser) -> DbResult<User> {
        debug!(username = %new.username, role = %new.role, "Inserting user");

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let password_hash = hash_password(&new.password)?;

        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, full_name, email, role, password_hash,
                is_active, last_login_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, NULL, ?7, ?7)
            "#,
        )
        .bind(&id)
        .bind(&new.username)
        .bind(&new.full_name)
        .bind(&new.email)
        .bind(new.role)
        .bind(&password_hash)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&new.username))?;

        info!(id = %id, username = %new.username, role = %new.role, "User created");

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("User", &id))
    }

    /// Applies a partial update.
    ///
    /// ## Returns
    /// * `Err(DbError::Conflict)` - would leave no active admin
    pub async fn update(&self, id: &str, update: &UserUpdate) -> DbResult<User> {
        debug!(id = %id, "Updating user");

        let mut tx = self.pool.begin().await?;

        if update.revokes_admin() {
            guard_last_admin(&mut tx, id).await?;
        }

        // An empty email clears the column
        let email = update.email.as_ref().map(|e| e.trim().to_string());
        let (set_email, email_value) = match email {
            Some(e) if e.is_empty() => (true, None),
            Some(e) => (true, Some(e)),
            None => (false, None),
        };

        let result = sqlx::query(
            r#"
            UPDATE users SET
                full_name = COALESCE(?2, full_name),
                email = CASE WHEN ?3 THEN ?4 ELSE email END,
                role = COALESCE(?5, role),
                is_active = COALESCE(?6, is_active),
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&update.full_name)
        .bind(set_email)
        .bind(email_value)
        .bind(update.role)
        .bind(update.is_active)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Replaces the password hash.
    pub async fn set_password(&self, id: &str, password: &str) -> DbResult<()> {
        let password_hash = hash_password(password)?;

        let result =
            sqlx::query("UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(&password_hash)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(id = %id, "Password changed");
        Ok(())
    }

    /// Records a successful login.
    pub async fn touch_last_login(&self, id: &str) -> DbResult<()> {
        sqlx::query("UPDATE users SET last_login_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Deletes a user who has never recorded a sale.
    ///
    /// ## Returns
    /// * `Err(DbError::Conflict)` - last active admin, or the user owns
    ///   transactions (deactivate instead)
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        guard_last_admin(&mut tx, id).await?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::ForeignKeyViolation { .. } => DbError::conflict(
                    "User has recorded transactions; deactivate the account instead",
                ),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        tx.commit().await?;

        info!(id = %id, "User deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_active_admins(&self) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        count_active_admins(&mut conn).await
    }

    /// Active users per role, in [`Role::ALL`] order, zeros included.
    pub async fn count_active_by_role(&self) -> DbResult<Vec<(Role, i64)>> {
        let rows: Vec<(Role, i64)> = sqlx::query_as(
            "SELECT role, COUNT(*) FROM users WHERE is_active = 1 GROUP BY role",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(Role::ALL
            .iter()
            .map(|role| {
                let count = rows
                    .iter()
                    .find(|(r, _)| r == role)
                    .map(|(_, c)| *c)
                    .unwrap_or(0);
                (*role, count)
            })
            .collect())
    }
}

async fn count_active_admins(conn: &mut SqliteConnection) -> DbResult<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin' AND is_active = 1")
            .fetch_one(&mut *conn)
            .await?;
    Ok(count)
}

/// Fails if `id` is the only active admin.
async fn guard_last_admin(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let target: Option<(Role, bool)> =
        sqlx::query_as("SELECT role, is_active FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    let Some((role, is_active)) = target else {
        return Err(DbError::not_found("User", id));
    };

    if role == Role::Admin && is_active && count_active_admins(conn).await? <= 1 {
        return Err(DbError::conflict("Cannot remove the last active admin"));
    }

    Ok(())
}
