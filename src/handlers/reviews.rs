//! Review endpoints, flat and nested under a tour.

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::model::review::{CreateReview, UpdateReview};
use crate::model::user::Role;
use crate::response::{success_created, success_many, success_one};
use crate::sanitize::clean_params;
use crate::service::reviews;
use crate::state::AppState;
use crate::extract::{Json, Path};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension,
};
use std::collections::HashMap;
use uuid::Uuid;

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let params = clean_params(params);
    let docs = reviews::list(&state.pool, None, params).await?;
    Ok(success_many(docs))
}

pub async fn list_for_tour(
    State(state): State<AppState>,
    Path(tour_id): Path<Uuid>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let params = clean_params(params);
    let docs = reviews::list(&state.pool, Some(tour_id), params).await?;
    Ok(success_many(docs))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let doc = reviews::get(&state.pool, id).await?;
    Ok(success_one(doc))
}

/// Flat create; the payload names the tour.
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateReview>,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(&[Role::User])?;
    let tour_id = payload
        .tour_id
        .ok_or_else(|| AppError::Validation("Review must belong to a tour".into()))?;
    let doc = reviews::create(&state.pool, current.0.id, tour_id, payload).await?;
    Ok(success_created(doc))
}

/// Nested create; the tour comes from the path and the author from the token.
pub async fn create_for_tour(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(tour_id): Path<Uuid>,
    Json(payload): Json<CreateReview>,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(&[Role::User])?;
    let doc = reviews::create(&state.pool, current.0.id, tour_id, payload).await?;
    Ok(success_created(doc))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReview>,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(&[Role::User, Role::Admin])?;
    let doc = reviews::update(&state.pool, id, payload).await?;
    Ok(success_one(doc))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(&[Role::User, Role::Admin])?;
    reviews::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
