//! Mail collaborator seam. Reset tokens go out-of-band through this trait;
//! the shipped implementation only logs, real transport lives elsewhere.

use crate::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, reset_url: &str) -> Result<(), AppError>;
}

pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, to: &str, reset_url: &str) -> Result<(), AppError> {
        tracing::info!(%to, %reset_url, "password reset mail (log transport)");
        Ok(())
    }
}
