//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation

use crate::auth::{jwt::JwtHandler, models::Claims};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Auth middleware that validates JWT tokens
pub async fn auth_middleware(
    State(jwt_handler): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, TokenError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(TokenError::MissingToken)?;

    let token = header
        .to_str()
        .ok()
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or(TokenError::InvalidFormat)?;

    let claims = jwt_handler
        .validate_token(token)
        .map_err(|_| TokenError::InvalidToken)?;

    // Handlers read the claims back out of the request extensions
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extract claims from request (use after auth middleware)
pub fn extract_claims(req: &Request) -> Option<&Claims> {
    req.extensions().get::<Claims>()
}

/// Token rejection reasons
#[derive(Debug)]
pub enum TokenError {
    MissingToken,
    InvalidFormat,
    InvalidToken,
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        let message = match self {
            TokenError::MissingToken => "Missing authorization token",
            TokenError::InvalidFormat => "Invalid authorization format. Use: Bearer {token}",
            TokenError::InvalidToken => "Invalid or expired token",
        };

        (StatusCode::UNAUTHORIZED, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_token_error_responses() {
        let missing = TokenError::MissingToken.into_response();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let invalid_format = TokenError::InvalidFormat.into_response();
        assert_eq!(invalid_format.status(), StatusCode::UNAUTHORIZED);

        let invalid_token = TokenError::InvalidToken.into_response();
        assert_eq!(invalid_token.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_extract_claims_from_request() {
        let mut req = Request::new(Body::empty());

        assert!(extract_claims(&req).is_none());

        let claims = Claims {
            subject: 1,
            username: "test".to_string(),
            role_name: "student".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_086_400,
        };
        req.extensions_mut().insert(claims);

        let extracted = extract_claims(&req);
        assert!(extracted.is_some());
        assert_eq!(extracted.unwrap().username, "test");
    }
}
