//! Signup, login, and the password lifecycle endpoints.

use crate::auth::{auth_cookie, logout_cookie, sign_token, verify_password};
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::model::user::{validate_password, PublicUser, Signup, UpdatePassword};
use crate::service::users;
use crate::state::AppState;
use crate::extract::{Json, Path};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize)]
struct AuthBody {
    status: &'static str,
    token: String,
    data: AuthData,
}

#[derive(Serialize)]
struct AuthData {
    user: PublicUser,
}

/// Sign a token for the user and send it both in the body and as an http-only
/// cookie.
fn send_token(
    state: &AppState,
    status: StatusCode,
    user: PublicUser,
) -> Result<Response, AppError> {
    let token = sign_token(&state.config, user.id)?;
    let cookie = auth_cookie(&state.config, &token);
    let body = AuthBody {
        status: "success",
        token,
        data: AuthData { user },
    };
    Ok((status, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<Signup>,
) -> Result<Response, AppError> {
    let user = users::create(&state.pool, payload).await?;
    send_token(&state, StatusCode::CREATED, user)
}

#[derive(Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Login>,
) -> Result<Response, AppError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "Please provide email and password".into(),
        ));
    }
    let user = users::find_by_email(&state.pool, &payload.email).await?;
    // same branch for unknown email and wrong password
    let user = match user {
        Some(u) if verify_password(&payload.password, &u.password_hash) => u,
        _ => {
            return Err(AppError::Unauthorized(
                "Incorrect email or password".into(),
            ))
        }
    };
    send_token(&state, StatusCode::OK, user.into())
}

pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, logout_cookie())],
        Json(serde_json::json!({ "status": "success" })),
    )
}

#[derive(Deserialize)]
pub struct ForgotPassword {
    pub email: String,
}

/// Issue a reset token and mail its URL. If delivery fails the pending token
/// is cleared so it cannot linger unread.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPassword>,
) -> Result<impl IntoResponse, AppError> {
    let (user, token) = users::start_password_reset(&state.pool, &payload.email).await?;
    let reset_url = format!(
        "/api/v1/users/reset-password/{}",
        token.plaintext
    );
    if let Err(e) = state.mailer.send_password_reset(&user.email, &reset_url).await {
        tracing::error!(error = ?e, "password reset mail failed");
        users::clear_password_reset(&state.pool, user.id).await?;
        return Err(AppError::Internal(
            "There was an error sending the email. Try again later".into(),
        ));
    }
    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Token sent to email"
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPassword {
    pub password: String,
    pub password_confirm: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPassword>,
) -> Result<Response, AppError> {
    validate_password(&payload.password)?;
    if payload.password != payload.password_confirm {
        return Err(AppError::Validation(
            "The two passwords do not match".into(),
        ));
    }
    let user = users::find_by_reset_token(&state.pool, &token).await?;
    users::update_password(&state.pool, user.id, &payload.password).await?;
    send_token(&state, StatusCode::OK, user.into())
}

pub async fn update_my_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpdatePassword>,
) -> Result<Response, AppError> {
    payload.validate()?;
    if !verify_password(&payload.password_current, &current.0.password_hash) {
        return Err(AppError::Unauthorized(
            "Your current password is wrong".into(),
        ));
    }
    users::update_password(&state.pool, current.0.id, &payload.password).await?;
    refreshed(&state, current.0.id).await
}

async fn refreshed(state: &AppState, id: Uuid) -> Result<Response, AppError> {
    let user = users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("No user found with that ID".into()))?;
    send_token(state, StatusCode::OK, user.into())
}
