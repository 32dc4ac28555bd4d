//! Service layer: validation, lifecycle rules, and query execution per entity.

use crate::error::AppError;

pub mod bookings;
pub mod reviews;
pub mod tours;
pub mod users;

/// Translate constraint violations raised by writes into operational errors.
/// A unique violation (23505) becomes a duplicate-field message; a foreign-key
/// violation (23503) means the referenced row does not exist, which is
/// ordinary client input, not a server fault.
pub(crate) fn translate_write_error(e: sqlx::Error, duplicate: &str) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        match db.code().as_deref() {
            Some("23505") => return AppError::Duplicate(duplicate.into()),
            Some("23503") => {
                let missing = if db.constraint().is_some_and(|c| c.contains("user")) {
                    "No user found with that ID"
                } else {
                    "No tour found with that ID"
                };
                return AppError::NotFound(missing.into());
            }
            _ => {}
        }
    }
    AppError::Db(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct ConstraintViolation {
        code: &'static str,
        constraint: &'static str,
    }

    impl fmt::Display for ConstraintViolation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "violates constraint \"{}\"", self.constraint)
        }
    }

    impl StdError for ConstraintViolation {}

    impl DatabaseError for ConstraintViolation {
        fn message(&self) -> &str {
            "constraint violation"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn constraint(&self) -> Option<&str> {
            Some(self.constraint)
        }

        fn kind(&self) -> ErrorKind {
            match self.code {
                "23505" => ErrorKind::UniqueViolation,
                "23503" => ErrorKind::ForeignKeyViolation,
                _ => ErrorKind::Other,
            }
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }
    }

    fn db_error(code: &'static str, constraint: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ConstraintViolation { code, constraint }))
    }

    #[test]
    fn unique_violation_becomes_an_operational_duplicate() {
        let err = translate_write_error(
            db_error("23505", "reviews_tour_user_key"),
            "you have already reviewed this tour",
        );
        assert!(matches!(err, AppError::Duplicate(_)));
        assert!(err.is_operational());
    }

    #[test]
    fn fk_violation_becomes_not_found_naming_the_reference() {
        let err = translate_write_error(db_error("23503", "reviews_tour_id_fkey"), "x");
        match err {
            AppError::NotFound(msg) => assert_eq!(msg, "No tour found with that ID"),
            other => panic!("expected NotFound, got {:?}", other),
        }
        let err = translate_write_error(db_error("23503", "bookings_user_id_fkey"), "x");
        match err {
            AppError::NotFound(msg) => assert_eq!(msg, "No user found with that ID"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn other_database_errors_stay_unexpected() {
        let err = translate_write_error(sqlx::Error::PoolClosed, "x");
        assert!(matches!(err, AppError::Db(_)));
        assert!(!err.is_operational());
    }
}
