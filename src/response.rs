//! Standard success envelope helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub status: &'static str,
    pub data: T,
}

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub status: &'static str,
    pub results: u64,
    pub data: Vec<T>,
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (
        StatusCode::OK,
        Json(SuccessOne {
            status: "success",
            data,
        }),
    )
}

pub fn success_created<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (
        StatusCode::CREATED,
        Json(SuccessOne {
            status: "success",
            data,
        }),
    )
}

pub fn success_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<SuccessMany<T>>) {
    let results = data.len() as u64;
    (
        StatusCode::OK,
        Json(SuccessMany {
            status: "success",
            results,
            data,
        }),
    )
}
