//! Tour entity: payloads, validation, and the slug lifecycle rule.

use crate::error::AppError;
use crate::query::{EntityMeta, IncludeKind, IncludeSelect, Visibility};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RATING: f64 = 4.0;

pub static TOURS: EntityMeta = EntityMeta {
    table: "tours",
    columns: &[
        ("id", "uuid"),
        ("name", "text"),
        ("slug", "text"),
        ("duration", "integer"),
        ("max_group_size", "integer"),
        ("difficulty", "text"),
        ("ratings_average", "double precision"),
        ("ratings_quantity", "integer"),
        ("price", "double precision"),
        ("price_discount", "double precision"),
        ("summary", "text"),
        ("description", "text"),
        ("image_cover", "text"),
        ("images", "text[]"),
        ("start_dates", "timestamptz[]"),
        ("secret_tour", "boolean"),
        ("start_location", "jsonb"),
        ("locations", "jsonb"),
        ("guides", "uuid[]"),
        ("created_at", "timestamptz"),
    ],
    public_columns: &[
        "id",
        "name",
        "slug",
        "duration",
        "max_group_size",
        "difficulty",
        "ratings_average",
        "ratings_quantity",
        "price",
        "price_discount",
        "summary",
        "description",
        "image_cover",
        "images",
        "start_dates",
        "start_location",
        "locations",
        "created_at",
    ],
    default_sort: "created_at",
    hidden: Some("secret_tour = TRUE"),
};

/// Guide references resolved to user summaries on every tour read. Password
/// material and the password-change timestamp stay out of the projection.
pub static GUIDES_INCLUDE: IncludeSelect = IncludeSelect {
    name: "guides",
    kind: IncludeKind::RefArray {
        array_col: "guides",
    },
    table: "users",
    columns: &["id", "name", "email", "photo", "role"],
    hidden: Some("active = FALSE"),
};

pub fn default_visibility(privileged: bool) -> Visibility {
    if privileged {
        Visibility::All
    } else {
        Visibility::Default
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Difficult,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Difficult => "difficult",
        }
    }
}

/// GeoJSON point with address metadata; waypoints additionally carry the tour
/// day they belong to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(default = "point_type")]
    pub r#type: String,
    pub coordinates: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<i32>,
}

fn point_type() -> String {
    "Point".into()
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTour {
    pub name: String,
    pub duration: i32,
    pub max_group_size: i32,
    pub difficulty: Difficulty,
    pub price: f64,
    #[serde(default)]
    pub price_discount: Option<f64>,
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub start_dates: Vec<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub secret_tour: bool,
    #[serde(default)]
    pub start_location: Option<GeoPoint>,
    #[serde(default)]
    pub locations: Vec<GeoPoint>,
    #[serde(default)]
    pub guides: Vec<uuid::Uuid>,
}

impl CreateTour {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_name(&self.name)?;
        if self.duration <= 0 {
            return Err(AppError::Validation("A tour must have a duration".into()));
        }
        if self.max_group_size <= 0 {
            return Err(AppError::Validation(
                "A tour must have a max group size".into(),
            ));
        }
        if self.price <= 0.0 {
            return Err(AppError::Validation("A tour must have a price".into()));
        }
        validate_discount(self.price_discount, self.price)?;
        if self.summary.trim().is_empty() {
            return Err(AppError::Validation("A tour must have a summary".into()));
        }
        if self.image_cover.trim().is_empty() {
            return Err(AppError::Validation(
                "A tour must have a cover image".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTour {
    pub name: Option<String>,
    pub duration: Option<i32>,
    pub max_group_size: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub price: Option<f64>,
    pub price_discount: Option<f64>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub image_cover: Option<String>,
    pub images: Option<Vec<String>>,
    pub start_dates: Option<Vec<chrono::DateTime<chrono::Utc>>>,
    pub secret_tour: Option<bool>,
    pub start_location: Option<GeoPoint>,
    pub locations: Option<Vec<GeoPoint>>,
    pub guides: Option<Vec<uuid::Uuid>>,
}

impl UpdateTour {
    /// Only fields present in the request are checked.
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(d) = self.duration {
            if d <= 0 {
                return Err(AppError::Validation("A tour must have a duration".into()));
            }
        }
        if let Some(p) = self.price {
            if p <= 0.0 {
                return Err(AppError::Validation("A tour must have a price".into()));
            }
        }
        if let (Some(discount), Some(price)) = (self.price_discount, self.price) {
            validate_discount(Some(discount), price)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), AppError> {
    let trimmed = name.trim();
    if trimmed.chars().count() < 4 {
        return Err(AppError::Validation(
            "A tour name must be at least 4 characters".into(),
        ));
    }
    if trimmed.chars().count() > 40 {
        return Err(AppError::Validation(
            "A tour name must be less than or equal to 40 characters".into(),
        ));
    }
    Ok(())
}

fn validate_discount(discount: Option<f64>, price: f64) -> Result<(), AppError> {
    if let Some(d) = discount {
        if d >= price {
            return Err(AppError::Validation(
                "Discount price should be below the regular price".into(),
            ));
        }
    }
    Ok(())
}

/// Lowercase URL-safe transform of a display name. Recomputed whenever the
/// name changes and never derived any other way.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> CreateTour {
        CreateTour {
            name: "Sea Explorer".into(),
            duration: 5,
            max_group_size: 10,
            difficulty: Difficulty::Easy,
            price: 500.0,
            price_discount: None,
            summary: "Exploring the sea".into(),
            description: None,
            image_cover: "x.jpg".into(),
            images: vec![],
            start_dates: vec![],
            secret_tour: false,
            start_location: None,
            locations: vec![],
            guides: vec![],
        }
    }

    #[test]
    fn slug_is_lowercase_and_url_safe() {
        assert_eq!(slugify("Sea Explorer"), "sea-explorer");
        assert_eq!(slugify("The Forest Hiker!"), "the-forest-hiker");
        assert_eq!(slugify("  Über   Tour  "), "über-tour");
    }

    #[test]
    fn slug_is_idempotent_for_unchanged_name() {
        let name = "Sea Explorer";
        assert_eq!(slugify(name), slugify(name));
    }

    #[test]
    fn minimal_tour_passes_validation() {
        assert!(minimal().validate().is_ok());
    }

    #[test]
    fn name_length_bounds() {
        let mut t = minimal();
        t.name = "Sea".into();
        assert!(t.validate().is_err());
        t.name = "x".repeat(41);
        assert!(t.validate().is_err());
        t.name = "Tour".into();
        assert!(t.validate().is_ok());
    }

    #[test]
    fn discount_must_be_below_price() {
        let mut t = minimal();
        t.price_discount = Some(500.0);
        assert!(t.validate().is_err());
        t.price_discount = Some(499.0);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn difficulty_deserializes_from_lowercase() {
        let d: Difficulty = serde_json::from_str("\"difficult\"").unwrap();
        assert_eq!(d, Difficulty::Difficult);
        assert!(serde_json::from_str::<Difficulty>("\"extreme\"").is_err());
    }
}
