//! Booking endpoints: checkout-session creation, the completion callback,
//! self-service listing, and admin CRUD.

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::model::booking::UpdateBooking;
use crate::model::user::Role;
use crate::payment::CheckoutCompleted;
use crate::response::{success_created, success_many, success_one};
use crate::sanitize::clean_params;
use crate::service::bookings;
use crate::state::AppState;
use crate::extract::{Json, Path};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension,
};
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

pub async fn checkout_session(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(tour_id): Path<Uuid>,
    Json(urls): Json<CheckoutUrls>,
) -> Result<impl IntoResponse, AppError> {
    let session = bookings::create_checkout_session(
        &state.pool,
        state.checkout.as_ref(),
        tour_id,
        current.0.id,
        urls.success_url,
        urls.cancel_url,
    )
    .await?;
    Ok(success_one(session))
}

/// Completion callback from the payment provider.
pub async fn checkout_completed(
    State(state): State<AppState>,
    Json(event): Json<CheckoutCompleted>,
) -> Result<impl IntoResponse, AppError> {
    let booking = bookings::record_completed(&state.pool, event).await?;
    Ok(success_created(booking))
}

pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let docs = bookings::for_user(&state.pool, current.0.id).await?;
    Ok(success_many(docs))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(&[Role::Admin, Role::LeadGuide])?;
    let params = clean_params(params);
    let docs = bookings::list(&state.pool, params).await?;
    Ok(success_many(docs))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(&[Role::Admin, Role::LeadGuide])?;
    let doc = bookings::get(&state.pool, id).await?;
    Ok(success_one(doc))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBooking>,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(&[Role::Admin, Role::LeadGuide])?;
    let doc = bookings::update(&state.pool, id, payload).await?;
    Ok(success_one(doc))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(&[Role::Admin, Role::LeadGuide])?;
    bookings::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
