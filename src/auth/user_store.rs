//! User Storage
//! Mission: Persist accounts and roles in SQLite

use crate::auth::models::{Account, NewAccount};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

/// Failure modes of an account insert
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already exists")]
    DuplicateUsername,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Account persistence consumed by the auth service
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>>;

    /// Insert a new account; the store assigns `user_id` and enforces username uniqueness.
    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError>;
}

/// Role existence lookup consumed by the register pre-check
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn role_exists(&self, role_name: &str) -> Result<bool>;
}

/// User storage with SQLite backend
#[derive(Clone)]
pub struct UserStore {
    conn: Arc<Mutex<Connection>>,
}

impl UserStore {
    /// Open (or create) the database and initialize the schema
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).context("open auth db")?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "foreign_keys", "ON")
            .context("enable foreign keys")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS roles (
                role_id INTEGER PRIMARY KEY AUTOINCREMENT,
                role_name TEXT UNIQUE NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL,
                role_id INTEGER NOT NULL,
                FOREIGN KEY (role_id) REFERENCES roles(role_id)
            )",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert a role if missing and return its id
    pub async fn ensure_role(&self, role_name: &str) -> Result<i64> {
        let conn = self.conn.lock().await;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO roles (role_name) VALUES (?1)",
                params![role_name],
            )
            .context("Failed to insert role")?;

        if inserted > 0 {
            info!("🏷️  Created role: {}", role_name);
        }

        conn.query_row(
            "SELECT role_id FROM roles WHERE role_name = ?1",
            params![role_name],
            |row| row.get(0),
        )
        .context("Failed to read role id")
    }

    /// Make sure every listed role exists
    pub async fn seed_roles<S: AsRef<str>>(&self, role_names: &[S]) -> Result<()> {
        for role_name in role_names {
            let role_name = role_name.as_ref().trim();
            if role_name.is_empty() {
                continue;
            }
            self.ensure_role(role_name).await?;
        }
        Ok(())
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[async_trait]
impl AccountStore for UserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT u.user_id, u.username, u.password, r.role_name
             FROM users u JOIN roles r ON r.role_id = u.role_id
             WHERE u.username = ?1",
        )?;

        let account_result = stmt.query_row(params![username], |row| {
            Ok(Account {
                user_id: row.get(0)?,
                username: row.get(1)?,
                password_hash: row.get(2)?,
                role_name: row.get(3)?,
            })
        });

        match account_result {
            Ok(account) => Ok(Some(account)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to look up user")),
        }
    }

    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let conn = self.conn.lock().await;

        let role_id: i64 = match conn.query_row(
            "SELECT role_id FROM roles WHERE role_name = ?1",
            params![account.role_name],
            |row| row.get(0),
        ) {
            Ok(id) => id,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(anyhow!("role '{}' does not exist", account.role_name).into())
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to read role id").into()),
        };

        if let Err(e) = conn.execute(
            "INSERT INTO users (username, password, role_id) VALUES (?1, ?2, ?3)",
            params![account.username, account.password_hash, role_id],
        ) {
            if is_unique_violation(&e) {
                return Err(StoreError::DuplicateUsername);
            }
            return Err(anyhow::Error::new(e).context("Failed to insert user").into());
        }

        let user_id = conn.last_insert_rowid();

        info!("✅ Created user: {} ({})", account.username, account.role_name);

        Ok(Account {
            user_id,
            username: account.username,
            password_hash: account.password_hash,
            role_name: account.role_name,
        })
    }
}

#[async_trait]
impl RoleDirectory for UserStore {
    async fn role_exists(&self, role_name: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM roles WHERE role_name = ?1",
                params![role_name],
                |row| row.get(0),
            )
            .context("Failed to check role")?;
        Ok(count > 0)
    }
}
