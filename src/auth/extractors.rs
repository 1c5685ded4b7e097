use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use tracing::warn;

use super::jwt::{JwtKeys, TokenError};

/// Validates the `Authorization: Bearer` session token and yields its user id.
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "missing Authorization header".into()))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or((StatusCode::UNAUTHORIZED, "invalid auth scheme".into()))?;

        let keys = JwtKeys::from_ref(state);
        match keys.parse_and_validate(token) {
            Ok(user_id) => Ok(AuthUser(user_id)),
            Err(TokenError::Expired) => {
                warn!("expired token");
                Err((StatusCode::UNAUTHORIZED, "token expired".into()))
            }
            Err(e) => {
                warn!(error = %e, "rejected token");
                Err((StatusCode::UNAUTHORIZED, "invalid token".into()))
            }
        }
    }
}
