//! Typed errors, operational classification, and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Environment;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Invalid input data. {0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("You do not have permission to perform this action")]
    Forbidden,
    #[error("Duplicate field value: {0}. Please use another value")]
    Duplicate(String),
    #[error("Too many requests from this client, please try again later")]
    TooManyRequests,
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("password hashing: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this failure. Recognized database shapes are translated
    /// here: row-not-found to 404, unique violation to 400.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) | AppError::Duplicate(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AppError::Db(e) => match e {
                sqlx::Error::RowNotFound => StatusCode::NOT_FOUND,
                _ if is_unique_violation(e) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Hash(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// "fail" for 4xx, "error" otherwise.
    pub fn status_category(&self) -> &'static str {
        if self.status_code().is_client_error() {
            "fail"
        } else {
            "error"
        }
    }

    /// Operational failures carry a message safe to show to clients.
    pub fn is_operational(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Client-facing message. Recognized database shapes get tailored text,
    /// everything non-operational collapses to a generic message.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Db(sqlx::Error::RowNotFound) => "No document found with that ID".into(),
            AppError::Db(e) if is_unique_violation(e) => {
                "Duplicate field value. Please use another value".into()
            }
            _ if self.is_operational() => self.to_string(),
            _ => "Something went very wrong".into(),
        }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Formats errors for clients. Constructed with an explicit environment so the
/// verbosity decision is visible at assembly time, not read from globals.
#[derive(Clone, Copy, Debug)]
pub struct ErrorFormatter {
    env: Environment,
}

impl ErrorFormatter {
    pub fn new(env: Environment) -> Self {
        ErrorFormatter { env }
    }

    pub fn render(&self, err: &AppError) -> Response {
        match self.env {
            Environment::Development => {
                let body = ErrorBody {
                    status: err.status_category(),
                    message: err.to_string(),
                    error: Some(format!("{:?}", err)),
                };
                (err.status_code(), Json(body)).into_response()
            }
            Environment::Production => {
                let status = if err.is_operational() {
                    err.status_code()
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                let body = ErrorBody {
                    status: if err.is_operational() {
                        err.status_category()
                    } else {
                        "error"
                    },
                    message: err.client_message(),
                    error: None,
                };
                (status, Json(body)).into_response()
            }
        }
    }
}

/// The default rendering is the production-safe one; the error itself rides
/// along in response extensions so the formatter middleware can re-render with
/// development detail and log unexpected failures with full context.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut res = ErrorFormatter::new(Environment::Production).render(&self);
        res.extensions_mut().insert(Arc::new(self));
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_xx_is_fail_five_xx_is_error() {
        assert_eq!(AppError::NotFound("x".into()).status_category(), "fail");
        assert_eq!(AppError::Validation("x".into()).status_category(), "fail");
        assert_eq!(AppError::Internal("x".into()).status_category(), "error");
    }

    #[test]
    fn operational_flags() {
        assert!(AppError::NotFound("x".into()).is_operational());
        assert!(AppError::Duplicate("email".into()).is_operational());
        assert!(AppError::Unauthorized("bad token".into()).is_operational());
        assert!(!AppError::Internal("boom".into()).is_operational());
        assert!(!AppError::Db(sqlx::Error::PoolClosed).is_operational());
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err = AppError::Db(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.client_message(), "No document found with that ID");
        assert!(err.is_operational());
    }

    #[test]
    fn production_hides_unexpected_detail() {
        let formatter = ErrorFormatter::new(Environment::Production);
        let res = formatter.render(&AppError::Internal("secret detail".into()));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn development_keeps_status() {
        let formatter = ErrorFormatter::new(Environment::Development);
        let res = formatter.render(&AppError::NotFound("gone".into()));
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
