//! User repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{unique_violation, DbError};
use crate::db::migrations::{EMAIL_UNIQUE, USERNAME_UNIQUE};
use crate::models::{Email, Username};

/// User record from database
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// bcrypt hash
    pub password: String,
    pub about: Option<String>,
    /// Id of the refresh token currently allowed; cleared on logout
    pub refresh_token: Option<String>,
    pub confirmed: bool,
    /// false when banned
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new account
#[derive(Debug)]
pub struct NewUser {
    pub username: Username,
    pub email: Email,
    pub password_hash: String,
    pub about: Option<String>,
}

const USER_COLUMNS: &str = "id, username, email, password, about, refresh_token, \
                            confirmed, is_active, created_at, updated_at";

/// User repository
pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user. Username and email are unique case-insensitively.
    pub async fn create(&self, user: NewUser) -> Result<User, DbError> {
        let sql = format!(
            "INSERT INTO users (username, email, password, about) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let result = sqlx::query_as::<_, User>(&sql)
            .bind(user.username.as_str())
            .bind(user.email.as_str())
            .bind(&user.password_hash)
            .bind(user.about.as_deref())
            .fetch_one(self.pool)
            .await;

        match result {
            Ok(created) => {
                tracing::info!(user_id = created.id, username = %created.username, "user created");
                Ok(created)
            }
            Err(e) => match unique_violation(&e).as_deref() {
                Some(USERNAME_UNIQUE) => Err(DbError::Conflict {
                    reason: "Username already taken",
                }),
                Some(EMAIL_UNIQUE) => Err(DbError::Conflict {
                    reason: "Account with this email already exists",
                }),
                Some(_) => Err(DbError::Conflict {
                    reason: "User already exists",
                }),
                None => Err(e.into()),
            },
        }
    }

    /// Get a user by id.
    pub async fn get(&self, id: i64) -> Result<User, DbError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound {
                resource: "user",
                id: id.to_string(),
            })
    }

    /// Look a user up by email, ignoring case.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<User>, DbError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Replace the stored refresh token id (`None` logs the user out).
    pub async fn set_refresh_token(&self, id: i64, token_id: Option<&str>) -> Result<(), DbError> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(token_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "user",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Swap the refresh token id only if `expected` is still current.
    ///
    /// Returns false when another refresh or a logout got there first.
    pub async fn rotate_refresh_token(
        &self,
        id: i64,
        expected: &str,
        next: &str,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = $3, updated_at = NOW() \
             WHERE id = $1 AND refresh_token = $2",
        )
        .bind(id)
        .bind(expected)
        .bind(next)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
