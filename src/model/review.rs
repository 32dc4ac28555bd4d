//! Review entity and the rating-rollup computation.

use crate::error::AppError;
use crate::query::{EntityMeta, IncludeKind, IncludeSelect};
use serde::Deserialize;

/// Ratings fall back to this pair when the last review disappears, so the
/// owning tour never keeps stale values.
pub const EMPTY_ROLLUP: RatingStats = RatingStats {
    quantity: 0,
    average: 4.5,
};

pub static REVIEWS: EntityMeta = EntityMeta {
    table: "reviews",
    columns: &[
        ("id", "uuid"),
        ("review", "text"),
        ("rating", "smallint"),
        ("tour_id", "uuid"),
        ("user_id", "uuid"),
        ("created_at", "timestamptz"),
    ],
    public_columns: &["id", "review", "rating", "tour_id", "user_id", "created_at"],
    default_sort: "created_at",
    hidden: None,
};

/// The author resolved to a minimal summary on every review read.
pub static AUTHOR_INCLUDE: IncludeSelect = IncludeSelect {
    name: "user",
    kind: IncludeKind::ToOne { fk: "user_id" },
    table: "users",
    columns: &["id", "name", "photo"],
    hidden: Some("active = FALSE"),
};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReview {
    pub review: String,
    pub rating: i16,
    /// Taken from the nested route when absent from the body.
    #[serde(default)]
    pub tour_id: Option<uuid::Uuid>,
}

impl CreateReview {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.review.trim().is_empty() {
            return Err(AppError::Validation("Review cannot be empty".into()));
        }
        validate_rating(self.rating)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReview {
    pub review: Option<String>,
    pub rating: Option<i16>,
}

impl UpdateReview {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(review) = &self.review {
            if review.trim().is_empty() {
                return Err(AppError::Validation("Review cannot be empty".into()));
            }
        }
        if let Some(rating) = self.rating {
            validate_rating(rating)?;
        }
        Ok(())
    }
}

fn validate_rating(rating: i16) -> Result<(), AppError> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::Validation(
            "Rating must be between 1 and 5".into(),
        ));
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatingStats {
    pub quantity: i64,
    pub average: f64,
}

/// Count and mean over the full rating set of one tour, rounded to one
/// decimal. Zero reviews reset to the documented defaults instead of leaving
/// stale values behind.
pub fn compute_rating_stats(ratings: &[i16]) -> RatingStats {
    if ratings.is_empty() {
        return EMPTY_ROLLUP;
    }
    let quantity = ratings.len() as i64;
    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    let average = (sum as f64 / quantity as f64 * 10.0).round() / 10.0;
    RatingStats { quantity, average }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_reviews_average_to_their_mean() {
        let stats = compute_rating_stats(&[4, 2]);
        assert_eq!(stats.quantity, 2);
        assert_eq!(stats.average, 3.0);
    }

    #[test]
    fn zero_reviews_reset_to_documented_defaults() {
        let stats = compute_rating_stats(&[]);
        assert_eq!(stats.quantity, 0);
        assert_eq!(stats.average, 4.5);
    }

    #[test]
    fn mean_is_rounded_to_one_decimal() {
        let stats = compute_rating_stats(&[5, 4, 4]);
        assert_eq!(stats.average, 4.3);
    }

    #[test]
    fn rollup_is_idempotent_without_intervening_changes() {
        let ratings = [3, 5, 4];
        assert_eq!(compute_rating_stats(&ratings), compute_rating_stats(&ratings));
    }

    #[test]
    fn rating_bounds_are_enforced() {
        let mut r = CreateReview {
            review: "Great".into(),
            rating: 0,
            tour_id: None,
        };
        assert!(r.validate().is_err());
        r.rating = 6;
        assert!(r.validate().is_err());
        r.rating = 5;
        assert!(r.validate().is_ok());
    }

    #[test]
    fn review_body_must_be_non_empty() {
        let r = CreateReview {
            review: "   ".into(),
            rating: 4,
            tour_id: None,
        };
        assert!(r.validate().is_err());
    }
}
