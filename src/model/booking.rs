//! Booking entity, recorded when the payment collaborator confirms a session.

use crate::error::AppError;
use crate::query::{EntityMeta, IncludeKind, IncludeSelect};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub static BOOKINGS: EntityMeta = EntityMeta {
    table: "bookings",
    columns: &[
        ("id", "uuid"),
        ("tour_id", "uuid"),
        ("user_id", "uuid"),
        ("price", "double precision"),
        ("paid", "boolean"),
        ("created_at", "timestamptz"),
    ],
    public_columns: &["id", "tour_id", "user_id", "price", "paid", "created_at"],
    default_sort: "created_at",
    hidden: None,
};

pub static BOOKED_TOUR_INCLUDE: IncludeSelect = IncludeSelect {
    name: "tour",
    kind: IncludeKind::ToOne { fk: "tour_id" },
    table: "tours",
    columns: &["id", "name", "slug", "price", "image_cover"],
    hidden: Some("secret_tour = TRUE"),
};

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub user_id: Uuid,
    pub price: f64,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
}

/// Admin corrections only; the tour and user references are immutable.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBooking {
    pub price: Option<f64>,
    pub paid: Option<bool>,
}

impl UpdateBooking {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(price) = self.price {
            if price <= 0.0 {
                return Err(AppError::Validation(
                    "A booking must have a positive price".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_price_must_stay_positive() {
        let mut u = UpdateBooking::default();
        assert!(u.validate().is_ok());
        u.price = Some(0.0);
        assert!(u.validate().is_err());
        u.price = Some(99.0);
        assert!(u.validate().is_ok());
    }
}
