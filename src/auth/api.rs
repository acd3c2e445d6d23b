//! Authentication API Endpoints
//! Mission: Expose register, login and token introspection over HTTP

use crate::auth::{
    middleware::extract_claims,
    models::{AccountResponse, LoginRequest, LoginResponse, MeResponse, RegisterRequest},
    service::{AuthError, AuthService, INVALID_CREDENTIALS},
};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub service: Arc<AuthService>,
}

impl AuthState {
    pub fn new(service: Arc<AuthService>) -> Self {
        Self { service }
    }
}

/// Register endpoint - POST /api/auth/register
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AuthApiError> {
    let account = state.service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    let response = state
        .service
        .login(&payload.username, &payload.password)
        .await?;
    Ok(Json(response))
}

/// Get current user info - GET /api/auth/me
/// Answered from the JWT claims alone (no database lookup)
pub async fn get_current_user(req: Request) -> Result<Json<MeResponse>, AuthApiError> {
    let claims = extract_claims(&req).ok_or(AuthApiError::Unauthorized)?;
    Ok(Json(MeResponse::from(claims)))
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    Validation(String),
    InvalidCredentials,
    Unauthorized,
    Conflict(String),
    InternalError,
}

impl From<AuthError> for AuthApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => AuthApiError::Validation(msg),
            AuthError::InvalidCredentials => AuthApiError::InvalidCredentials,
            AuthError::Conflict(msg) => AuthApiError::Conflict(msg),
            AuthError::Infrastructure(e) => {
                error!("Auth infrastructure error: {:#}", e);
                AuthApiError::InternalError
            }
        }
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS.to_string())
            }
            AuthApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Authentication required".to_string())
            }
            AuthApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AuthApiError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
