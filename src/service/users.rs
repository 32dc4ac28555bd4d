//! User CRUD, password lifecycle, and the reset-token flow. Inactive users
//! stay invisible to every default read.

use super::translate_write_error;
use crate::auth::{hash_password, hash_reset_token, issue_reset_token, ResetToken};
use crate::error::AppError;
use crate::model::user::{PublicUser, Signup, UpdateMe, User, USERS};
use crate::query::{fetch_all_docs, select_list, QuerySpec, Visibility};
use chrono::{Duration, Utc};
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, photo, role, password_hash, \
     password_changed_at, password_reset_token, password_reset_expires, active, created_at";

/// Admin list; soft-deleted users excluded unless privileged.
pub async fn list(
    pool: &PgPool,
    params: HashMap<String, String>,
    vis: Visibility,
) -> Result<Vec<Value>, AppError> {
    let spec = QuerySpec::from_params(params);
    let q = select_list(&USERS, &spec, vis, &[]);
    fetch_all_docs(pool, &q).await
}

/// Signup: before-persist hashes the password and drops the confirmation.
pub async fn create(pool: &PgPool, payload: Signup) -> Result<PublicUser, AppError> {
    payload.validate()?;
    let password_hash = hash_password(&payload.password)?;
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (name, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(payload.name.trim())
    .bind(payload.normalized_email())
    .bind(&password_hash)
    .fetch_one(pool)
    .await
    .map_err(|e| translate_write_error(e, "email"))?;
    Ok(user.into())
}

/// Active user by id. Used by the auth middleware, so the full row (hash
/// included) comes back.
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = $1 AND active",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE LOWER(email) = LOWER($1) AND active",
        USER_COLUMNS
    ))
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Non-password profile fields only; password updates go through
/// [`update_password`].
pub async fn update_me(pool: &PgPool, id: Uuid, payload: UpdateMe) -> Result<PublicUser, AppError> {
    payload.validate()?;
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET name = COALESCE($1, name),
            email = COALESCE($2, email),
            photo = COALESCE($3, photo)
        WHERE id = $4 AND active
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.email.as_deref().map(|e| e.trim().to_lowercase()))
    .bind(payload.photo.as_deref())
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| translate_write_error(e, "email"))?
    .ok_or_else(|| AppError::NotFound("No user found with that ID".into()))?;
    Ok(user.into())
}

/// Soft delete: the row stays, every default read skips it.
pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET active = FALSE WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Persist a new password hash. `password_changed_at` is backdated one second
/// so a token signed in the same instant does not appear to predate the
/// change.
pub async fn update_password(pool: &PgPool, id: Uuid, new_password: &str) -> Result<(), AppError> {
    let password_hash = hash_password(new_password)?;
    let changed_at = Utc::now() - Duration::seconds(1);
    sqlx::query(
        r#"
        UPDATE users
        SET password_hash = $1,
            password_changed_at = $2,
            password_reset_token = NULL,
            password_reset_expires = NULL
        WHERE id = $3
        "#,
    )
    .bind(&password_hash)
    .bind(changed_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Issue a reset token for the given email and persist only its hash and
/// expiry. Returns the plaintext for out-of-band delivery, or NotFound if no
/// active user matches.
pub async fn start_password_reset(pool: &PgPool, email: &str) -> Result<(User, ResetToken), AppError> {
    let user = find_by_email(pool, email)
        .await?
        .ok_or_else(|| AppError::NotFound("There is no user with that email address".into()))?;
    let token = issue_reset_token();
    sqlx::query(
        "UPDATE users SET password_reset_token = $1, password_reset_expires = $2 WHERE id = $3",
    )
    .bind(&token.hashed)
    .bind(token.expires_at)
    .bind(user.id)
    .execute(pool)
    .await?;
    Ok((user, token))
}

/// Clear a pending reset token, e.g. when mail delivery failed.
pub async fn clear_password_reset(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE users SET password_reset_token = NULL, password_reset_expires = NULL WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Look up the user owning an unexpired reset token, by the token's hash.
pub async fn find_by_reset_token(pool: &PgPool, plaintext: &str) -> Result<User, AppError> {
    let hashed = hash_reset_token(plaintext);
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {} FROM users
        WHERE password_reset_token = $1 AND password_reset_expires > NOW() AND active
        "#,
        USER_COLUMNS
    ))
    .bind(&hashed)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::BadRequest("Token is invalid or has expired".into()))?;
    Ok(user)
}

/// Admin delete is a hard delete; self-service removal uses [`deactivate`].
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("No user found with that ID".into()));
    }
    Ok(())
}
