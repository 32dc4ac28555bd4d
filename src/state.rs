//! Shared application state for all routes.

use crate::config::AppConfig;
use crate::mail::Mailer;
use crate::payment::CheckoutProvider;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub checkout: Arc<dyn CheckoutProvider>,
    pub mailer: Arc<dyn Mailer>,
}
