//! Tour CRUD with slug derivation, secret-tour visibility, and guide
//! population. Lifecycle rules run as explicit steps around the statements,
//! not as hidden hooks.

use crate::error::AppError;
use crate::model::tour::{slugify, CreateTour, UpdateTour, GUIDES_INCLUDE, TOURS};
use crate::query::{
    fetch_all_docs, fetch_optional_doc, select_by_column, select_by_id, select_list, update_by_id,
    QuerySpec, Visibility,
};
use serde::Serialize;
use serde_json::Value;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use uuid::Uuid;

/// Filtered, sorted, field-limited, paginated list with guides populated.
pub async fn list(
    pool: &PgPool,
    params: HashMap<String, String>,
    vis: Visibility,
) -> Result<Vec<Value>, AppError> {
    let spec = QuerySpec::from_params(params);
    let q = select_list(&TOURS, &spec, vis, &[&GUIDES_INCLUDE]);
    fetch_all_docs(pool, &q).await
}

pub async fn get(pool: &PgPool, id: Uuid, vis: Visibility) -> Result<Value, AppError> {
    let q = select_by_id(&TOURS, id, vis, &[&GUIDES_INCLUDE]);
    fetch_optional_doc(pool, &q)
        .await?
        .ok_or_else(|| AppError::NotFound("No tour found with that ID".into()))
}

pub async fn get_by_slug(pool: &PgPool, slug: &str, vis: Visibility) -> Result<Value, AppError> {
    let q = select_by_column(
        &TOURS,
        "slug",
        Value::String(slug.to_string()),
        vis,
        &[&GUIDES_INCLUDE],
    );
    fetch_optional_doc(pool, &q)
        .await?
        .ok_or_else(|| AppError::NotFound("No tour found with that name".into()))
}

/// Before-persist: validate, then derive the slug from the name.
pub async fn create(pool: &PgPool, payload: CreateTour) -> Result<Value, AppError> {
    payload.validate()?;
    let slug = slugify(&payload.name);

    let row = sqlx::query(
        r#"
        INSERT INTO tours
            (name, slug, duration, max_group_size, difficulty, price,
             price_discount, summary, description, image_cover, images,
             start_dates, secret_tour, start_location, locations, guides)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING row_to_json(tours) AS doc
        "#,
    )
    .bind(payload.name.trim())
    .bind(&slug)
    .bind(payload.duration)
    .bind(payload.max_group_size)
    .bind(payload.difficulty.as_str())
    .bind(payload.price)
    .bind(payload.price_discount)
    .bind(payload.summary.trim())
    .bind(&payload.description)
    .bind(&payload.image_cover)
    .bind(&payload.images)
    .bind(&payload.start_dates)
    .bind(payload.secret_tour)
    .bind(payload.start_location.as_ref().map(|p| serde_json::to_value(p).unwrap_or(Value::Null)))
    .bind(serde_json::to_value(&payload.locations).unwrap_or_else(|_| Value::Array(vec![])))
    .bind(&payload.guides)
    .fetch_one(pool)
    .await?;
    let doc: Value = row.try_get("doc")?;
    Ok(doc)
}

/// Partial update. The slug is recomputed exactly when the name changes.
pub async fn update(pool: &PgPool, id: Uuid, payload: UpdateTour) -> Result<Value, AppError> {
    payload.validate()?;
    let mut changes: Vec<(String, Value)> = Vec::new();
    if let Some(name) = &payload.name {
        changes.push(("name".into(), Value::String(name.trim().to_string())));
        changes.push(("slug".into(), Value::String(slugify(name))));
    }
    push_opt(&mut changes, "duration", payload.duration.map(Into::into));
    push_opt(
        &mut changes,
        "max_group_size",
        payload.max_group_size.map(Into::into),
    );
    push_opt(
        &mut changes,
        "difficulty",
        payload.difficulty.map(|d| Value::String(d.as_str().into())),
    );
    push_opt(&mut changes, "price", payload.price.map(json_f64));
    push_opt(
        &mut changes,
        "price_discount",
        payload.price_discount.map(json_f64),
    );
    push_opt(
        &mut changes,
        "summary",
        payload.summary.map(Value::String),
    );
    push_opt(
        &mut changes,
        "description",
        payload.description.map(Value::String),
    );
    push_opt(
        &mut changes,
        "image_cover",
        payload.image_cover.map(Value::String),
    );
    push_opt(
        &mut changes,
        "secret_tour",
        payload.secret_tour.map(Value::Bool),
    );
    if let Some(loc) = &payload.start_location {
        changes.push((
            "start_location".into(),
            serde_json::to_value(loc).unwrap_or(Value::Null),
        ));
    }
    if let Some(locs) = &payload.locations {
        changes.push((
            "locations".into(),
            serde_json::to_value(locs).unwrap_or_else(|_| Value::Array(vec![])),
        ));
    }
    if changes.is_empty() && payload.images.is_none()
        && payload.start_dates.is_none()
        && payload.guides.is_none()
    {
        return get(pool, id, Visibility::All).await;
    }

    // array columns bind natively, outside the JSON change list
    if let Some(images) = &payload.images {
        sqlx::query("UPDATE tours SET images = $1 WHERE id = $2")
            .bind(images)
            .bind(id)
            .execute(pool)
            .await?;
    }
    if let Some(dates) = &payload.start_dates {
        sqlx::query("UPDATE tours SET start_dates = $1 WHERE id = $2")
            .bind(dates)
            .bind(id)
            .execute(pool)
            .await?;
    }
    if let Some(guides) = &payload.guides {
        sqlx::query("UPDATE tours SET guides = $1 WHERE id = $2")
            .bind(guides)
            .bind(id)
            .execute(pool)
            .await?;
    }
    if changes.is_empty() {
        return get(pool, id, Visibility::All).await;
    }

    let q = update_by_id(&TOURS, id, &changes);
    fetch_optional_doc(pool, &q)
        .await?
        .ok_or_else(|| AppError::NotFound("No tour found with that ID".into()))
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM tours WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("No tour found with that ID".into()));
    }
    Ok(())
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DifficultyStats {
    pub difficulty: String,
    pub num_tours: i64,
    pub num_ratings: i64,
    pub avg_rating: Option<f64>,
    pub avg_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// Aggregate tour statistics grouped by difficulty; secret tours excluded.
pub async fn stats(pool: &PgPool) -> Result<Vec<DifficultyStats>, AppError> {
    let rows = sqlx::query_as::<_, DifficultyStats>(
        r#"
        SELECT difficulty,
               COUNT(*) AS num_tours,
               SUM(ratings_quantity)::BIGINT AS num_ratings,
               AVG(ratings_average) AS avg_rating,
               AVG(price) AS avg_price,
               MIN(price) AS min_price,
               MAX(price) AS max_price
        FROM tours
        WHERE NOT (secret_tour = TRUE)
        GROUP BY difficulty
        ORDER BY avg_price
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Preset parameters for the top-5-cheap alias route.
pub fn top_five_params() -> HashMap<String, String> {
    HashMap::from([
        ("limit".to_string(), "5".to_string()),
        ("sort".to_string(), "-ratings_average,price".to_string()),
        (
            "fields".to_string(),
            "name,price,ratings_average,summary,difficulty".to_string(),
        ),
    ])
}

fn push_opt(changes: &mut Vec<(String, Value)>, col: &str, v: Option<Value>) {
    if let Some(v) = v {
        changes.push((col.to_string(), v));
    }
}

fn json_f64(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_five_alias_presets_sort_and_limit() {
        let params = top_five_params();
        let spec = QuerySpec::from_params(params);
        assert_eq!(spec.limit, 5);
        assert_eq!(spec.sort[0].field, "ratings_average");
        assert!(spec.sort[0].descending);
        assert!(spec.fields.as_ref().unwrap().contains(&"price".to_string()));
    }
}
