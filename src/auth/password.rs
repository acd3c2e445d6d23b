//! Password Hashing
//! Mission: One-way bcrypt hashing at a configurable work factor

use anyhow::{bail, Context, Result};
use bcrypt::{hash, verify};

/// bcrypt only reads this many bytes; anything longer would be silently cut.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// bcrypt hasher bound to the process-wide cost
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a plaintext password
    pub fn hash(&self, password: &str) -> Result<String> {
        if password.len() > MAX_PASSWORD_BYTES {
            bail!("password exceeds {} bytes", MAX_PASSWORD_BYTES);
        }
        hash(password, self.cost).context("Failed to hash password")
    }

    /// Check a plaintext password against a stored hash.
    /// Passwords longer than bcrypt's input never match.
    pub fn verify(&self, password: &str, password_hash: &str) -> Result<bool> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        verify(password, password_hash).context("Failed to verify password")
    }

    /// Hash on the blocking pool; bcrypt is deliberately slow.
    pub async fn hash_blocking(&self, password: String) -> Result<String> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .context("Password hashing task failed")?
    }

    pub async fn verify_blocking(&self, password: String, password_hash: String) -> Result<bool> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.verify(&password, &password_hash))
            .await
            .context("Password verification task failed")?
    }
}
