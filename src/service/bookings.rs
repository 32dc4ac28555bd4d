//! Booking records and checkout-session orchestration.

use super::translate_write_error;
use crate::error::AppError;
use crate::model::booking::{Booking, UpdateBooking, BOOKED_TOUR_INCLUDE, BOOKINGS};
use crate::payment::{CheckoutCompleted, CheckoutRequest, CheckoutProvider, CheckoutSession};
use crate::query::{fetch_all_docs, fetch_optional_doc, select_by_id, select_list, QuerySpec, Visibility};
use serde_json::Value;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use uuid::Uuid;

/// Start a hosted checkout for one tour on behalf of the logged-in user.
pub async fn create_checkout_session(
    pool: &PgPool,
    provider: &dyn CheckoutProvider,
    tour_id: Uuid,
    user_id: Uuid,
    success_url: String,
    cancel_url: String,
) -> Result<CheckoutSession, AppError> {
    let row = sqlx::query("SELECT name, price FROM tours WHERE id = $1 AND NOT secret_tour")
        .bind(tour_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("No tour found with that ID".into()))?;
    let req = CheckoutRequest {
        tour_id,
        tour_name: row.try_get("name")?,
        user_id,
        price: row.try_get("price")?,
        success_url,
        cancel_url,
    };
    provider.create_session(req).await
}

/// Record the booking once the provider confirms payment. A completion event
/// naming a tour or user that no longer exists is a client-level 404, not a
/// server fault.
pub async fn record_completed(pool: &PgPool, event: CheckoutCompleted) -> Result<Booking, AppError> {
    let booking = sqlx::query_as::<_, Booking>(
        r#"
        INSERT INTO bookings (tour_id, user_id, price, paid)
        VALUES ($1, $2, $3, TRUE)
        RETURNING id, tour_id, user_id, price, paid, created_at
        "#,
    )
    .bind(event.tour_id)
    .bind(event.user_id)
    .bind(event.price)
    .fetch_one(pool)
    .await
    .map_err(|e| translate_write_error(e, "booking"))?;
    tracing::info!(session = %event.session_id, booking = %booking.id, "booking recorded");
    Ok(booking)
}

pub async fn list(pool: &PgPool, params: HashMap<String, String>) -> Result<Vec<Value>, AppError> {
    let spec = QuerySpec::from_params(params);
    let q = select_list(&BOOKINGS, &spec, Visibility::Default, &[&BOOKED_TOUR_INCLUDE]);
    fetch_all_docs(pool, &q).await
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Value, AppError> {
    let q = select_by_id(&BOOKINGS, id, Visibility::Default, &[&BOOKED_TOUR_INCLUDE]);
    fetch_optional_doc(pool, &q)
        .await?
        .ok_or_else(|| AppError::NotFound("No booking found with that ID".into()))
}

/// Bookings of one user, booked tour populated.
pub async fn for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Value>, AppError> {
    let params = HashMap::from([("user_id".to_string(), user_id.to_string())]);
    list(pool, params).await
}

/// Admin correction of price or paid state.
pub async fn update(pool: &PgPool, id: Uuid, payload: UpdateBooking) -> Result<Value, AppError> {
    payload.validate()?;
    let row = sqlx::query(
        r#"
        UPDATE bookings
        SET price = COALESCE($1, price), paid = COALESCE($2, paid)
        WHERE id = $3
        RETURNING row_to_json(bookings) AS doc
        "#,
    )
    .bind(payload.price)
    .bind(payload.paid)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("No booking found with that ID".into()))?;
    Ok(row.try_get("doc")?)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("No booking found with that ID".into()));
    }
    Ok(())
}
