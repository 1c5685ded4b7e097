use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::claims::Claims;
use crate::{config::JwtConfig, state::AppState};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// HS256 keys derived from the server secret, plus the session lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self::new(&cfg.secret, Duration::hours(cfg.ttl_hours))
    }

    /// Signs a session for `user_id` expiring `ttl` from now.
    pub fn sign(&self, user_id: i64) -> Result<String, TokenError> {
        let expires_at = OffsetDateTime::now_utc().checked_add(self.ttl).ok_or_else(|| {
            TokenError::Signing(format!("session lifetime {} is out of range", self.ttl))
        })?;
        self.sign_until(user_id, expires_at)
    }

    pub fn sign_until(&self, user_id: i64, expires_at: OffsetDateTime) -> Result<String, TokenError> {
        let claims = Claims {
            user_id,
            iat: OffsetDateTime::now_utc().unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;
        debug!(user_id = data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }

    pub fn parse_and_validate(&self, token: &str) -> Result<i64, TokenError> {
        self.verify(token).map(|c| c.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(secret: &str) -> JwtKeys {
        JwtKeys::new(secret, Duration::hours(24))
    }

    #[test]
    fn sign_and_parse_roundtrip() {
        let keys = keys("dev-secret");
        let token = keys.sign(42).expect("sign");
        assert_eq!(keys.parse_and_validate(&token).expect("validate"), 42);
    }

    #[test]
    fn expiry_is_a_day_out() {
        let keys = keys("dev-secret");
        let token = keys.sign(1).unwrap();
        let claims = keys.verify(&token).unwrap();
        let lifetime = claims.exp - claims.iat;
        assert!((24 * 3600 - 2..=24 * 3600 + 2).contains(&lifetime), "{lifetime}");
    }

    #[test]
    fn past_expiry_is_rejected() {
        let keys = keys("dev-secret");
        let token = keys
            .sign_until(7, OffsetDateTime::now_utc() - Duration::seconds(5))
            .unwrap();
        assert!(matches!(keys.parse_and_validate(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn foreign_secret_is_an_invalid_signature() {
        let token = keys("one-secret").sign(1).unwrap();
        let err = keys("other-secret").parse_and_validate(&token).unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let keys = keys("dev-secret");
        assert!(matches!(keys.parse_and_validate("not.a.jwt"), Err(TokenError::Malformed)));
        assert!(matches!(keys.parse_and_validate(""), Err(TokenError::Malformed)));
    }

    #[test]
    fn unrepresentable_expiry_is_a_signing_error() {
        let keys = JwtKeys::new("dev-secret", Duration::hours(100_000_000));
        assert!(matches!(keys.sign(1), Err(TokenError::Signing(_))));
    }

    #[test]
    fn claim_uses_user_id_key() {
        let json = serde_json::to_value(Claims { user_id: 3, iat: 0, exp: 1 }).unwrap();
        assert_eq!(json["userID"], 3);
    }
}
