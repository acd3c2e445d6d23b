//! Authentication Models
//! Mission: Define account, token and request/response shapes for register and login

use serde::{Deserialize, Serialize};

/// Stored account record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub user_id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub role_name: String,
}

/// Account about to be inserted (password already hashed)
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub role_name: String,
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub subject: i64, // user_id
    pub username: String,
    pub role_name: String,
    pub iat: i64, // issued-at timestamp
    pub exp: i64, // expiration timestamp
}

/// Register request body
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role_name: String,
}

/// Login request body
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

impl LoginResponse {
    pub fn welcome_back(username: &str, token: String) -> Self {
        Self {
            message: format!("{} is back!", username),
            token,
        }
    }
}

/// Account response (sanitized)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountResponse {
    pub user_id: i64,
    pub username: String,
    pub role_name: String,
}

impl AccountResponse {
    pub fn from_account(account: &Account) -> Self {
        Self {
            user_id: account.user_id,
            username: account.username.clone(),
            role_name: account.role_name.clone(),
        }
    }
}

/// Current caller, as seen through a validated token
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub subject: i64,
    pub username: String,
    pub role_name: String,
    pub exp: i64,
}

impl From<&Claims> for MeResponse {
    fn from(claims: &Claims) -> Self {
        Self {
            subject: claims.subject,
            username: claims.username.clone(),
            role_name: claims.role_name.clone(),
            exp: claims.exp,
        }
    }
}
