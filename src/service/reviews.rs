//! Review CRUD and the rating rollup onto the owning tour.

use super::translate_write_error;
use crate::error::AppError;
use crate::model::review::{compute_rating_stats, CreateReview, UpdateReview, AUTHOR_INCLUDE, REVIEWS};
use crate::query::{fetch_all_docs, fetch_optional_doc, select_by_id, select_list, QuerySpec, Visibility};
use serde_json::Value;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use uuid::Uuid;

/// List reviews, author populated; optionally scoped to one tour via the
/// nested route.
pub async fn list(
    pool: &PgPool,
    tour_id: Option<Uuid>,
    mut params: HashMap<String, String>,
) -> Result<Vec<Value>, AppError> {
    if let Some(tour_id) = tour_id {
        params.insert("tour_id".into(), tour_id.to_string());
    }
    let spec = QuerySpec::from_params(params);
    let q = select_list(&REVIEWS, &spec, Visibility::Default, &[&AUTHOR_INCLUDE]);
    fetch_all_docs(pool, &q).await
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Value, AppError> {
    let q = select_by_id(&REVIEWS, id, Visibility::Default, &[&AUTHOR_INCLUDE]);
    fetch_optional_doc(pool, &q)
        .await?
        .ok_or_else(|| AppError::NotFound("No review found with that ID".into()))
}

/// Create a review, then roll the tour's ratings up. The (tour, user) unique
/// index enforces one review per pair; its violation surfaces as an
/// operational duplicate error, and a missing tour or user as a 404.
pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    tour_id: Uuid,
    payload: CreateReview,
) -> Result<Value, AppError> {
    payload.validate()?;
    let row = sqlx::query(
        r#"
        INSERT INTO reviews (review, rating, tour_id, user_id)
        VALUES ($1, $2, $3, $4)
        RETURNING row_to_json(reviews) AS doc
        "#,
    )
    .bind(payload.review.trim())
    .bind(payload.rating)
    .bind(tour_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(|e| translate_write_error(e, "you have already reviewed this tour"))?;
    let doc: Value = row.try_get("doc")?;
    rollup(pool, tour_id).await?;
    Ok(doc)
}

/// Update a review. The owning tour id is captured before the write since the
/// rollup needs it afterward.
pub async fn update(pool: &PgPool, id: Uuid, payload: UpdateReview) -> Result<Value, AppError> {
    payload.validate()?;
    let tour_id = owning_tour(pool, id).await?;
    let row = sqlx::query(
        r#"
        UPDATE reviews
        SET review = COALESCE($1, review), rating = COALESCE($2, rating)
        WHERE id = $3
        RETURNING row_to_json(reviews) AS doc
        "#,
    )
    .bind(payload.review.as_deref().map(str::trim))
    .bind(payload.rating)
    .bind(id)
    .fetch_one(pool)
    .await?;
    let doc: Value = row.try_get("doc")?;
    rollup(pool, tour_id).await?;
    Ok(doc)
}

/// Delete a review; same capture-then-rollup dance as update.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    let tour_id = owning_tour(pool, id).await?;
    sqlx::query("DELETE FROM reviews WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    rollup(pool, tour_id).await?;
    Ok(())
}

async fn owning_tour(pool: &PgPool, review_id: Uuid) -> Result<Uuid, AppError> {
    let row = sqlx::query("SELECT tour_id FROM reviews WHERE id = $1")
        .bind(review_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("No review found with that ID".into()))?;
    Ok(row.try_get("tour_id")?)
}

/// Recompute and persist the tour's rating fields from the full review set.
/// Not transactionally coupled to the triggering write; a brief lag is
/// tolerated.
pub async fn rollup(pool: &PgPool, tour_id: Uuid) -> Result<(), AppError> {
    let rows = sqlx::query("SELECT rating FROM reviews WHERE tour_id = $1")
        .bind(tour_id)
        .fetch_all(pool)
        .await?;
    let ratings: Vec<i16> = rows
        .iter()
        .map(|r| r.try_get::<i16, _>("rating"))
        .collect::<Result<_, _>>()?;
    let stats = compute_rating_stats(&ratings);
    sqlx::query("UPDATE tours SET ratings_quantity = $1, ratings_average = $2 WHERE id = $3")
        .bind(stats.quantity as i32)
        .bind(stats.average)
        .bind(tour_id)
        .execute(pool)
        .await?;
    tracing::debug!(tour = %tour_id, quantity = stats.quantity, average = stats.average, "rating rollup");
    Ok(())
}
