//! Service Configuration
//! Mission: Load signing key and hashing cost once at startup, refuse insecure defaults
//!
//! Environment:
//!   JWT_SECRET      - HMAC signing secret (required)
//!   BCRYPT_ROUNDS   - bcrypt work factor, 4..=31 (required)
//!   AUTH_DB_PATH    - SQLite file (default: authgate.db)
//!   BIND_ADDR       - Listen address (default: 0.0.0.0:3000)
//!   AUTH_SEED_ROLES - Comma-separated roles created at startup (default: admin,instructor,student)

use clap::Parser;
use std::fmt;
use std::net::SocketAddr;
use thiserror::Error;

pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must not be empty")]
    EmptySecret,
    #[error("BCRYPT_ROUNDS must be between 4 and 31, got {0}")]
    CostOutOfRange(u32),
}

/// Process-wide auth settings, injected into the service
#[derive(Clone)]
pub struct AuthConfig {
    jwt_secret: String,
    bcrypt_cost: u32,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, bcrypt_cost: u32) -> Result<Self, ConfigError> {
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(ConfigError::CostOutOfRange(bcrypt_cost));
        }
        Ok(Self {
            jwt_secret,
            bcrypt_cost,
        })
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

#[derive(Parser)]
#[command(name = "authgate")]
#[command(about = "Account registration and JWT login service")]
pub struct ServerArgs {
    /// HMAC secret used to sign tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// bcrypt work factor
    #[arg(long, env = "BCRYPT_ROUNDS")]
    pub bcrypt_rounds: u32,

    /// SQLite database path
    #[arg(long, env = "AUTH_DB_PATH", default_value = "authgate.db")]
    pub db_path: String,

    /// Address the HTTP server binds to
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind_addr: SocketAddr,

    /// Roles created at startup when missing (comma-separated)
    #[arg(
        long,
        env = "AUTH_SEED_ROLES",
        value_delimiter = ',',
        default_value = "admin,instructor,student"
    )]
    pub seed_roles: Vec<String>,
}

impl ServerArgs {
    pub fn auth_config(&self) -> Result<AuthConfig, ConfigError> {
        AuthConfig::new(self.jwt_secret.clone(), self.bcrypt_rounds)
    }
}

impl fmt::Debug for ServerArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerArgs")
            .field("jwt_secret", &"<redacted>")
            .field("bcrypt_rounds", &self.bcrypt_rounds)
            .field("db_path", &self.db_path)
            .field("bind_addr", &self.bind_addr)
            .field("seed_roles", &self.seed_roles)
            .finish()
    }
}
