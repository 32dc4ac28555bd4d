//! Self-service profile endpoints plus the admin user CRUD.

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::model::user::{PublicUser, Role, UpdateMe};
use crate::query::Visibility;
use crate::response::{success_many, success_one};
use crate::sanitize::clean_params;
use crate::service::users;
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

pub async fn me(Extension(current): Extension<CurrentUser>) -> impl IntoResponse {
    success_one(PublicUser::from((*current.0).clone()))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpdateMe>,
) -> Result<impl IntoResponse, AppError> {
    let user = users::update_me(&state.pool, current.0.id, payload).await?;
    Ok(success_one(user))
}

/// Soft delete. The row stays but no default read will surface it.
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    users::deactivate(&state.pool, current.0.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(&[Role::Admin])?;
    let params = clean_params(params);
    let docs = users::list(&state.pool, params, Visibility::All).await?;
    Ok(success_many(docs))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(&[Role::Admin])?;
    let user = users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("No user found with that ID".into()))?;
    Ok(success_one(PublicUser::from(user)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMe>,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(&[Role::Admin])?;
    let user = users::update_me(&state.pool, id, payload).await?;
    Ok(success_one(user))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(&[Role::Admin])?;
    users::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
