//! Hosted-checkout collaborator. The real provider lives outside this crate;
//! the trait is the seam and a deterministic local implementation ships for
//! demos and tests.

use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct CheckoutRequest {
    pub tour_id: Uuid,
    pub tour_name: String,
    pub user_id: Uuid,
    pub price: f64,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Completion event delivered out-of-band by the provider once payment went
/// through; a Booking is recorded from it.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutCompleted {
    pub session_id: String,
    pub tour_id: Uuid,
    pub user_id: Uuid,
    pub price: f64,
}

#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    async fn create_session(&self, req: CheckoutRequest) -> Result<CheckoutSession, AppError>;
}

/// In-process provider: session ids are derived from the request so demo
/// flows are reproducible.
pub struct LocalCheckout;

#[async_trait]
impl CheckoutProvider for LocalCheckout {
    async fn create_session(&self, req: CheckoutRequest) -> Result<CheckoutSession, AppError> {
        let id = format!("cs_local_{}_{}", req.tour_id.simple(), req.user_id.simple());
        let url = format!("{}?session_id={}", req.success_url, id);
        tracing::info!(session = %id, tour = %req.tour_id, "checkout session created");
        Ok(CheckoutSession { id, url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_sessions_are_deterministic() {
        let req = CheckoutRequest {
            tour_id: Uuid::nil(),
            tour_name: "Sea Explorer".into(),
            user_id: Uuid::nil(),
            price: 500.0,
            success_url: "https://example.com/ok".into(),
            cancel_url: "https://example.com/no".into(),
        };
        let a = LocalCheckout.create_session(req.clone()).await.unwrap();
        let b = LocalCheckout.create_session(req).await.unwrap();
        assert_eq!(a.id, b.id);
        assert!(a.url.contains(&a.id));
    }
}
