//! HTTP handlers: thin glue from requests to the service layer.

pub mod auth;
pub mod bookings;
pub mod reviews;
pub mod tours;
pub mod users;
