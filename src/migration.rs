//! Schema DDL: tables and the indexes the data model relies on.

use crate::error::AppError;
use sqlx::PgPool;

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        photo TEXT NOT NULL DEFAULT 'default.jpg',
        role TEXT NOT NULL DEFAULT 'user'
            CHECK (role IN ('user', 'guide', 'lead-guide', 'admin')),
        password_hash TEXT NOT NULL,
        password_changed_at TIMESTAMPTZ,
        password_reset_token TEXT,
        password_reset_expires TIMESTAMPTZ,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tours (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        slug TEXT NOT NULL,
        duration INTEGER NOT NULL,
        max_group_size INTEGER NOT NULL,
        difficulty TEXT NOT NULL
            CHECK (difficulty IN ('easy', 'medium', 'difficult')),
        ratings_average DOUBLE PRECISION NOT NULL DEFAULT 4.0
            CHECK (ratings_average >= 1.0 AND ratings_average <= 5.0),
        ratings_quantity INTEGER NOT NULL DEFAULT 0,
        price DOUBLE PRECISION NOT NULL,
        price_discount DOUBLE PRECISION,
        summary TEXT NOT NULL,
        description TEXT,
        image_cover TEXT NOT NULL,
        images TEXT[] NOT NULL DEFAULT '{}',
        start_dates TIMESTAMPTZ[] NOT NULL DEFAULT '{}',
        secret_tour BOOLEAN NOT NULL DEFAULT FALSE,
        start_location JSONB,
        locations JSONB NOT NULL DEFAULT '[]',
        guides UUID[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        review TEXT NOT NULL,
        rating SMALLINT NOT NULL CHECK (rating BETWEEN 1 AND 5),
        tour_id UUID NOT NULL REFERENCES tours (id) ON DELETE CASCADE,
        user_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bookings (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        tour_id UUID NOT NULL REFERENCES tours (id) ON DELETE CASCADE,
        user_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        price DOUBLE PRECISION NOT NULL,
        paid BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

const INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_key ON users (LOWER(email))",
    "CREATE UNIQUE INDEX IF NOT EXISTS tours_name_key ON tours (name)",
    "CREATE INDEX IF NOT EXISTS tours_slug_idx ON tours (slug)",
    "CREATE INDEX IF NOT EXISTS tours_price_rating_idx ON tours (price, ratings_average DESC)",
    "CREATE INDEX IF NOT EXISTS tours_start_location_idx ON tours USING GIN (start_location)",
    // one review per (tour, user)
    "CREATE UNIQUE INDEX IF NOT EXISTS reviews_tour_user_key ON reviews (tour_id, user_id)",
];

/// Create tables and indexes. Idempotent; safe to run at every startup.
pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    for ddl in TABLES {
        sqlx::query(ddl).execute(pool).await?;
    }
    for ddl in INDEXES {
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!("schema up to date");
    Ok(())
}
