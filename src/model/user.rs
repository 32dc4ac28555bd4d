//! User entity: roles, payloads, and the password-free public view.

use crate::error::AppError;
use crate::query::EntityMeta;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

pub static USERS: EntityMeta = EntityMeta {
    table: "users",
    columns: &[
        ("id", "uuid"),
        ("name", "text"),
        ("email", "text"),
        ("photo", "text"),
        ("role", "text"),
        ("password_hash", "text"),
        ("password_changed_at", "timestamptz"),
        ("password_reset_token", "text"),
        ("password_reset_expires", "timestamptz"),
        ("active", "boolean"),
        ("created_at", "timestamptz"),
    ],
    // password material, reset tokens, and the soft-delete flag never leave
    // the database by default
    public_columns: &["id", "name", "email", "photo", "role", "created_at"],
    default_sort: "created_at",
    hidden: Some("active = FALSE"),
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "guide")]
    Guide,
    #[serde(rename = "lead-guide")]
    LeadGuide,
    #[serde(rename = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Guide => "guide",
            Role::LeadGuide => "lead-guide",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "guide" => Some(Role::Guide),
            "lead-guide" => Some(Role::LeadGuide),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Full row, password material included. Internal only; convert to
/// [`PublicUser`] before anything leaves the service layer.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: String,
    pub role: String,
    pub password_hash: String,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::User)
    }
}

/// What clients see. The conversion drops the hash, reset token, and flags.
#[derive(Clone, Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        PublicUser {
            id: u.id,
            name: u.name,
            email: u.email,
            photo: u.photo,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signup {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

impl Signup {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".into()));
        }
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        if self.password != self.password_confirm {
            return Err(AppError::Validation(
                "The two passwords do not match".into(),
            ));
        }
        Ok(())
    }

    /// Emails are stored lowercased.
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMe {
    pub name: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
}

impl UpdateMe {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation("Name is required".into()));
            }
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePassword {
    pub password_current: String,
    pub password: String,
    pub password_confirm: String,
}

impl UpdatePassword {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_password(&self.password)?;
        if self.password != self.password_confirm {
            return Err(AppError::Validation(
                "The two passwords do not match".into(),
            ));
        }
        Ok(())
    }
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
    });
    if !re.is_match(email.trim()) {
        return Err(AppError::Validation(
            "Email address seems to be invalid".into(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup() -> Signup {
        Signup {
            name: "Alice".into(),
            email: "Alice@Example.COM".into(),
            password: "correct-horse".into(),
            password_confirm: "correct-horse".into(),
        }
    }

    #[test]
    fn public_view_has_no_password_fields() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            photo: "default.jpg".into(),
            role: "user".into(),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".into(),
            password_changed_at: None,
            password_reset_token: Some("hashed".into()),
            password_reset_expires: None,
            active: true,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password_reset_token").is_none());
        assert!(json.get("active").is_none());
    }

    #[test]
    fn email_is_normalized_to_lowercase() {
        assert_eq!(signup().normalized_email(), "alice@example.com");
    }

    #[test]
    fn email_format_is_validated() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("two@@example.com").is_err());
    }

    #[test]
    fn password_minimum_length() {
        let mut s = signup();
        s.password = "short".into();
        s.password_confirm = "short".into();
        assert!(s.validate().is_err());
    }

    #[test]
    fn password_confirmation_must_match() {
        let mut s = signup();
        s.password_confirm = "different-pass".into();
        assert!(s.validate().is_err());
    }

    #[test]
    fn role_parsing_round_trips() {
        for role in [Role::User, Role::Guide, Role::LeadGuide, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superadmin"), None);
    }
}
