//! JWT access tokens and the password-change staleness check.

use crate::config::AppConfig;
use crate::error::AppError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

pub fn sign_token(config: &AppConfig, user_id: Uuid) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp(),
        exp: (now + Duration::days(config.jwt_expires_in_days)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token signing: {}", e)))
}

/// Decode and verify a token. Expired and malformed tokens are operational
/// 401s with tailored messages.
pub fn verify_token(config: &AppConfig, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("Your token has expired. Please log in again".into())
        }
        _ => AppError::Unauthorized("Invalid token. Please log in again".into()),
    })
}

/// True when the password changed after the token was issued, which means the
/// token must be rejected.
pub fn password_changed_after(changed_at: Option<DateTime<Utc>>, token_iat_secs: i64) -> bool {
    match changed_at {
        Some(ts) => ts.timestamp() > token_iat_secs,
        None => false,
    }
}

/// Http-only auth cookie mirroring the signed token.
pub fn auth_cookie(config: &AppConfig, token: &str) -> String {
    let max_age = Duration::days(config.jwt_expires_in_days).num_seconds();
    let mut cookie = format!(
        "jwt={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        token, max_age
    );
    if config.environment == crate::config::Environment::Production {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Short-lived dummy cookie that overwrites the auth cookie on logout.
pub fn logout_cookie() -> String {
    "jwt=loggedout; HttpOnly; Path=/; Max-Age=10; SameSite=Lax".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/test".into(),
            bind_addr: "0.0.0.0:3000".into(),
            environment: crate::config::Environment::Development,
            jwt_secret: "a-test-secret-that-is-long-enough!!".into(),
            jwt_expires_in_days: 90,
        }
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let config = config();
        let user_id = Uuid::new_v4();
        let token = sign_token(&config, user_id).unwrap();
        let claims = verify_token(&config, &token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_token_is_unauthorized() {
        let config = config();
        let token = sign_token(&config, Uuid::new_v4()).unwrap();
        let mut other = config.clone();
        other.jwt_secret = "a-different-secret-also-long-enough".into();
        let err = verify_token(&other, &token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn password_change_after_issuance_invalidates_token() {
        let iat = Utc::now().timestamp();
        let later = Utc::now() + Duration::seconds(30);
        let earlier = Utc::now() - Duration::seconds(30);
        assert!(password_changed_after(Some(later), iat));
        assert!(!password_changed_after(Some(earlier), iat));
        assert!(!password_changed_after(None, iat));
    }

    #[test]
    fn auth_cookie_is_http_only() {
        let cookie = auth_cookie(&config(), "abc");
        assert!(cookie.starts_with("jwt=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Secure")); // development
    }
}
