//! Router-level tests. The pool is lazy, so everything here exercises the
//! boundary stack without a live database.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tourbook::mail::LogMailer;
use tourbook::middleware::RateLimiter;
use tourbook::payment::LocalCheckout;
use tourbook::{app, app_with_limiter, AppConfig, AppState, Environment};
use tower::ServiceExt;

fn test_state() -> AppState {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://localhost/tourbook_test")
        .unwrap();
    AppState {
        pool,
        config: Arc::new(AppConfig {
            database_url: "postgres://localhost/tourbook_test".into(),
            bind_addr: "127.0.0.1:0".into(),
            environment: Environment::Development,
            jwt_secret: "a-test-secret-that-is-long-enough!!".into(),
            jwt_expires_in_days: 90,
        }),
        checkout: Arc::new(LocalCheckout),
        mailer: Arc::new(LogMailer),
    }
}

async fn body_json(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_answers_without_auth() {
    let app = app(test_state());
    let res = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn unknown_route_is_an_operational_404() {
    let app = app(test_state());
    let res = app
        .oneshot(Request::get("/definitely-not-here").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let json = body_json(res).await;
    assert_eq!(json["status"], "fail");
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("/definitely-not-here"));
}

#[tokio::test]
async fn responses_carry_hardening_headers() {
    let app = app(test_state());
    let res = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(
        res.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(res.headers().get("x-frame-options").unwrap(), "DENY");
}

#[tokio::test]
async fn api_requests_over_the_ceiling_get_429() {
    let limiter = Arc::new(RateLimiter::new(2, Duration::from_secs(3600)));
    let app = app_with_limiter(test_state(), limiter);

    for _ in 0..2 {
        let res = app
            .clone()
            .oneshot(Request::get("/api/v1/users/logout").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
    let res = app
        .oneshot(Request::get("/api/v1/users/logout").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(res).await;
    assert_eq!(json["status"], "fail");
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let app = app(test_state());
    let res = app
        .oneshot(
            Request::post("/api/v1/users/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(vec![b' '; 20 * 1024]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn login_requires_email_and_password() {
    let app = app(test_state());
    let res = app
        .oneshot(
            Request::post("/api/v1/users/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email":"","password":""}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["status"], "fail");
    assert_eq!(json["message"], "Please provide email and password");
}

#[tokio::test]
async fn protected_routes_reject_anonymous_requests() {
    let app = app(test_state());
    let res = app
        .oneshot(
            Request::get("/api/v1/bookings/my-bookings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(res).await;
    assert_eq!(json["status"], "fail");
    assert_eq!(
        json["message"],
        "You are not logged in. Please log in to get access"
    );
}

#[tokio::test]
async fn malformed_ids_render_the_error_envelope() {
    let app = app(test_state());
    let res = app
        .oneshot(
            Request::get("/api/v1/tours/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["status"], "fail");
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn malformed_json_bodies_render_the_error_envelope() {
    let app = app(test_state());
    let res = app
        .oneshot(
            Request::post("/api/v1/users/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["status"], "fail");
}

#[tokio::test]
async fn garbage_tokens_are_unauthorized() {
    let app = app(test_state());
    let res = app
        .oneshot(
            Request::post("/api/v1/tours")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Invalid token. Please log in again");
}
