//! Authentication Module
//! Mission: Register accounts, verify credentials, issue signed 24-hour tokens

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod user_store;

pub use api::AuthState;
pub use jwt::JwtHandler;
pub use middleware::auth_middleware;
pub use service::{AuthError, AuthService};
pub use user_store::{AccountStore, RoleDirectory, UserStore};
