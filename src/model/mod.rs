//! Entity types, request payloads, validation, and lifecycle helpers.

pub mod booking;
pub mod review;
pub mod tour;
pub mod user;

pub use booking::Booking;
pub use review::{compute_rating_stats, RatingStats};
pub use tour::{slugify, Difficulty};
pub use user::{PublicUser, Role, User};
