//! Request authentication. Bearer tokens are verified against the auth
//! service on every request; there is no local session store.

pub mod client;
pub mod handlers;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::client::AuthError;
use crate::errors::AppError;
use crate::state::AppState;

/// The authenticated caller. Add it as a handler argument to require a token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub access_token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Access token required".to_string()))?;

        let identity = state.auth.get_user(token).await.map_err(|e| match e {
            AuthError::Rejected { .. } => {
                AppError::Unauthorized("Invalid or expired token".to_string())
            }
            other => {
                warn!("Token verification failed: {other}");
                AppError::AuthService(other.to_string())
            }
        })?;

        Ok(AuthUser {
            id: identity.id,
            email: identity.email.clone().unwrap_or_default(),
            role: identity.role(),
            access_token: token.to_string(),
        })
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Role-based access check.
pub fn require_role(user: &AuthUser, allowed: &[&str]) -> Result<(), AppError> {
    if allowed.contains(&user.role.as_str()) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Insufficient permissions".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn user_with_role(role: &str) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "dev@example.com".to_string(),
            role: role.to_string(),
            access_token: "token".to_string(),
        }
    }

    #[test]
    fn test_bearer_token_extracted() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def")), Some("abc.def"));
    }

    #[test]
    fn test_missing_or_malformed_header_yields_none() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers_with("Basic Zm9vOmJhcg==")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
    }

    #[test]
    fn test_require_role() {
        assert!(require_role(&user_with_role("admin"), &["user", "admin"]).is_ok());
        assert!(matches!(
            require_role(&user_with_role("guest"), &["user", "admin"]),
            Err(AppError::Forbidden(_))
        ));
    }
}
