//! Application configuration from environment variables.

use crate::error::AppError;

/// Deployment environment. Threaded explicitly into the error formatter and
/// cookie settings instead of being read from globals at use sites.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub environment: Environment,
    pub jwt_secret: String,
    /// Access token lifetime in days.
    pub jwt_expires_in_days: i64,
}

impl AppConfig {
    /// Read config from the environment. `JWT_SECRET` is required; everything
    /// else has a development default.
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/tourbook".into());
        let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
        let environment = Environment::from_str(
            &std::env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
        );
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::Internal("JWT_SECRET must be set".into()))?;
        if jwt_secret.len() < 32 {
            return Err(AppError::Internal(
                "JWT_SECRET must be at least 32 characters".into(),
            ));
        }
        let jwt_expires_in_days = std::env::var("JWT_EXPIRES_IN_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(90);

        Ok(AppConfig {
            database_url,
            bind_addr: format!("0.0.0.0:{}", port),
            environment,
            jwt_secret,
            jwt_expires_in_days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing_defaults_to_development() {
        assert_eq!(Environment::from_str("production"), Environment::Production);
        assert_eq!(Environment::from_str("prod"), Environment::Production);
        assert_eq!(Environment::from_str("development"), Environment::Development);
        assert_eq!(Environment::from_str("staging"), Environment::Development);
    }
}
