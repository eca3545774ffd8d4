//! Passwords saved for users that opted in to "remember me".
//!
//! Each user is a separate row keyed by name. Rows are only ever removed on
//! explicit request.

use std::path::Path;

use schannel_shared::uac::Username;
use secrecy::{ExposeSecret as _, SecretString};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    #[error("credential database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored password for '{username}' is not valid UTF-8")]
    CorruptPassword { username: Username },
}

/// A user the store knows about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownUser {
    pub username: Username,
    pub has_password: bool,
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    pool: SqlitePool,
}

impl CredentialStore {
    /// Opens (creating if needed) the store at `path`
    #[tracing::instrument(err(Debug))]
    pub async fn open(path: &Path) -> Result<Self, CredentialStoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    /// A store that lives only as long as this value
    #[tracing::instrument(err(Debug))]
    pub async fn in_memory() -> Result<Self, CredentialStoreError> {
        // Every sqlite connection to ":memory:" is its own database so the pool
        // must keep exactly one connection alive forever
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, CredentialStoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                passwd BLOB
            );",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    /// Saves (or overwrites) the password of `username`.
    ///
    /// Overwriting keeps the user's original position in
    /// [`Self::list_known_users`]
    #[tracing::instrument(skip(self, password), err(Debug))]
    pub async fn save_password(
        &self,
        username: &Username,
        password: &SecretString,
    ) -> Result<(), CredentialStoreError> {
        sqlx::query(
            "INSERT INTO users (name, passwd) VALUES (?, ?)
            ON CONFLICT(name) DO UPDATE SET passwd = excluded.passwd;",
        )
        .bind(username.as_ref())
        .bind(password.expose_secret().as_bytes())
        .execute(&self.pool)
        .await?;
        debug!("password saved");
        Ok(())
    }

    /// Returns `None` for users that were never saved or whose password was
    /// forgotten
    #[tracing::instrument(skip(self), err(Debug))]
    pub async fn load_password(
        &self,
        username: &Username,
    ) -> Result<Option<SecretString>, CredentialStoreError> {
        let row: Option<(Option<Vec<u8>>,)> =
            sqlx::query_as("SELECT passwd FROM users WHERE name = ?;")
                .bind(username.as_ref())
                .fetch_optional(&self.pool)
                .await?;
        let Some((Some(bytes),)) = row else {
            return Ok(None);
        };
        let password =
            String::from_utf8(bytes).map_err(|_| CredentialStoreError::CorruptPassword {
                username: username.clone(),
            })?;
        Ok(Some(password.into()))
    }

    /// Users in the order they were first saved
    #[tracing::instrument(skip(self), err(Debug))]
    pub async fn list_known_users(&self) -> Result<Vec<Username>, CredentialStoreError> {
        Ok(self
            .known_users()
            .await?
            .into_iter()
            .map(|user| user.username)
            .collect())
    }

    /// Same order as [`Self::list_known_users`] but also reports which users
    /// have a saved password
    #[tracing::instrument(skip(self), err(Debug))]
    pub async fn known_users(&self) -> Result<Vec<KnownUser>, CredentialStoreError> {
        let rows: Vec<(String, bool)> =
            sqlx::query_as("SELECT name, passwd IS NOT NULL FROM users ORDER BY id;")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(name, has_password)| match Username::try_from(name) {
                Ok(username) => Some(KnownUser {
                    username,
                    has_password,
                }),
                Err(err) => {
                    warn!(?err, "skipping stored user with an invalid name");
                    None
                }
            })
            .collect())
    }

    /// Clears the saved password but keeps the user in the known list.
    /// Returns `false` if the user was not known
    #[tracing::instrument(skip(self), ret, err(Debug))]
    pub async fn forget_password(&self, username: &Username) -> Result<bool, CredentialStoreError> {
        let result = sqlx::query("UPDATE users SET passwd = NULL WHERE name = ?;")
            .bind(username.as_ref())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Removes the user completely. Returns `false` if the user was not known
    #[tracing::instrument(skip(self), ret, err(Debug))]
    pub async fn remove_user(&self, username: &Username) -> Result<bool, CredentialStoreError> {
        let result = sqlx::query("DELETE FROM users WHERE name = ?;")
            .bind(username.as_ref())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
