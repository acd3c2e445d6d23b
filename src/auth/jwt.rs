//! JWT Token Handler
//! Mission: Mint and validate 24-hour identity tokens

use crate::auth::models::{Account, Claims};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

/// Lifetime of every issued token
pub const TOKEN_TTL_HOURS: i64 = 24;

/// JWT Handler for token operations
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_hours: i64,
}

impl JwtHandler {
    /// Create a new JWT handler with secret key
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_hours: TOKEN_TTL_HOURS,
        }
    }

    /// Build the claim set for an account as of `issued_at`
    pub fn build_claims(
        &self,
        user_id: i64,
        username: &str,
        role_name: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<Claims> {
        let expiration = issued_at
            .checked_add_signed(Duration::hours(self.expiration_hours))
            .context("Invalid timestamp")?;

        Ok(Claims {
            subject: user_id,
            username: username.to_string(),
            role_name: role_name.to_string(),
            iat: issued_at.timestamp(),
            exp: expiration.timestamp(),
        })
    }

    /// Generate a JWT token for an account, issued now
    pub fn generate_token(&self, account: &Account) -> Result<String> {
        self.generate_token_at(account, Utc::now())
    }

    /// Generate a JWT token for an account with an explicit issue time
    pub fn generate_token_at(&self, account: &Account, issued_at: DateTime<Utc>) -> Result<String> {
        let claims = self.build_claims(
            account.user_id,
            &account.username,
            &account.role_name,
            issued_at,
        )?;

        debug!(
            "Generating JWT for user {} ({}), expires in {}h",
            account.username, account.user_id, self.expiration_hours
        );

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to generate JWT")
    }

    /// Validate a JWT token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        // No grace period past `exp`
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let decoded = decode::<Claims>(token, &self.decoding_key, &validation)
            .context("Invalid or expired token")?;

        debug!("Validated JWT for user {}", decoded.claims.username);

        Ok(decoded.claims)
    }
}
