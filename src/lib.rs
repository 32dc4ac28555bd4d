//! Tourbook: tour-booking REST backend on PostgreSQL.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod mail;
pub mod middleware;
pub mod migration;
pub mod model;
pub mod payment;
pub mod query;
pub mod response;
pub mod routes;
pub mod sanitize;
pub mod service;
pub mod state;

pub use config::{AppConfig, Environment};
pub use error::{AppError, ErrorFormatter};
pub use migration::apply_migrations;
pub use routes::{app, app_with_limiter};
pub use state::AppState;
