//! Execute composed queries and collect JSON documents.

use super::{BindValue, QueryBuf};
use crate::error::AppError;
use serde_json::Value;
use sqlx::{PgPool, Row};

/// Run a composed statement and return every row's `doc` column.
pub async fn fetch_all_docs(pool: &PgPool, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(BindValue::from_json(p));
    }
    let rows = query.fetch_all(pool).await?;
    rows.iter()
        .map(|r| r.try_get::<Value, _>("doc").map_err(AppError::from))
        .collect()
}

/// Run a composed statement expected to match at most one row.
pub async fn fetch_optional_doc(pool: &PgPool, q: &QueryBuf) -> Result<Option<Value>, AppError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(BindValue::from_json(p));
    }
    let row = query.fetch_optional(pool).await?;
    row.map(|r| r.try_get::<Value, _>("doc").map_err(AppError::from))
        .transpose()
}
