//! Tour endpoints. Privileged roles see secret tours; everyone else gets the
//! default visibility.

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::model::tour::{default_visibility, CreateTour, UpdateTour};
use crate::model::user::Role;
use crate::query::Visibility;
use crate::response::{success_created, success_many, success_one};
use crate::sanitize::clean_params;
use crate::service::tours;
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

fn visibility(user: Option<&CurrentUser>) -> Visibility {
    let privileged = user
        .map(|u| matches!(u.0.role(), Role::Admin | Role::LeadGuide))
        .unwrap_or(false);
    default_visibility(privileged)
}

pub async fn list(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let params = clean_params(params);
    let docs = tours::list(&state.pool, params, visibility(user.as_ref().map(|e| &e.0))).await?;
    Ok(success_many(docs))
}

/// Alias route: the five best-rated cheap tours, fields trimmed.
pub async fn top_five_cheap(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let docs = tours::list(
        &state.pool,
        tours::top_five_params(),
        Visibility::Default,
    )
    .await?;
    Ok(success_many(docs))
}

pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = tours::stats(&state.pool).await?;
    Ok(success_many(stats))
}

pub async fn get_by_slug(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let doc = tours::get_by_slug(&state.pool, &slug, visibility(user.as_ref().map(|e| &e.0))).await?;
    Ok(success_one(doc))
}

pub async fn get(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let doc = tours::get(&state.pool, id, visibility(user.as_ref().map(|e| &e.0))).await?;
    Ok(success_one(doc))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreateTour>,
) -> Result<impl IntoResponse, AppError> {
    user.require_role(&[Role::Admin, Role::LeadGuide, Role::Guide])?;
    let doc = tours::create(&state.pool, payload).await?;
    Ok(success_created(doc))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTour>,
) -> Result<impl IntoResponse, AppError> {
    user.require_role(&[Role::Admin, Role::LeadGuide, Role::Guide])?;
    let doc = tours::update(&state.pool, id, payload).await?;
    Ok(success_one(doc))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    user.require_role(&[Role::Admin, Role::LeadGuide])?;
    tours::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
