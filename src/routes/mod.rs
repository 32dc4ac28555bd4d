//! Router assembly: per-resource routers, auth layering, and the boundary
//! stack (body limit, header hardening, rate ceiling, error rendering).

use crate::error::{AppError, ErrorFormatter};
use crate::handlers::{auth, bookings, reviews, tours, users};
use crate::middleware::{identify, protect, rate_limit, render_errors, RateLimiter};
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Uri},
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;

/// Request bodies above this are rejected before any handler runs.
const BODY_LIMIT_BYTES: usize = 10 * 1024;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Can't find {} on this server", uri.path()))
}

fn tour_routes(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(tours::list))
        .route("/top-5-cheap", get(tours::top_five_cheap))
        .route("/stats", get(tours::stats))
        .route("/slug/:slug", get(tours::get_by_slug))
        .route("/:id", get(tours::get))
        .route("/:id/reviews", get(reviews::list_for_tour))
        .route_layer(from_fn_with_state(state.clone(), identify));
    let protected = Router::new()
        .route("/", post(tours::create))
        .route("/:id", patch(tours::update).delete(tours::delete))
        .route("/:id/reviews", post(reviews::create_for_tour))
        .route_layer(from_fn_with_state(state.clone(), protect));
    public.merge(protected).with_state(state)
}

fn user_routes(state: AppState) -> Router {
    let public = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password/:token", patch(auth::reset_password));
    let protected = Router::new()
        .route(
            "/me",
            get(users::me).patch(users::update_me).delete(users::delete_me),
        )
        .route("/update-my-password", patch(auth::update_my_password))
        .route("/", get(users::list))
        .route(
            "/:id",
            get(users::get).patch(users::update).delete(users::delete),
        )
        .route_layer(from_fn_with_state(state.clone(), protect));
    public.merge(protected).with_state(state)
}

fn review_routes(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(reviews::list))
        .route("/:id", get(reviews::get));
    let protected = Router::new()
        .route("/", post(reviews::create))
        .route(
            "/:id",
            patch(reviews::update).delete(reviews::delete),
        )
        .route_layer(from_fn_with_state(state.clone(), protect));
    public.merge(protected).with_state(state)
}

fn booking_routes(state: AppState) -> Router {
    // the completion callback is authenticated by the provider, not a user
    let callback = Router::new().route("/checkout-completed", post(bookings::checkout_completed));
    let protected = Router::new()
        .route("/checkout-session/:tour_id", post(bookings::checkout_session))
        .route("/my-bookings", get(bookings::my_bookings))
        .route("/", get(bookings::list))
        .route(
            "/:id",
            get(bookings::get).patch(bookings::update).delete(bookings::delete),
        )
        .route_layer(from_fn_with_state(state.clone(), protect));
    callback.merge(protected).with_state(state)
}

/// The full application with the default rate ceiling.
pub fn app(state: AppState) -> Router {
    app_with_limiter(state, Arc::new(RateLimiter::api_default()))
}

/// Assembly with an injectable limiter; tests shrink the window.
pub fn app_with_limiter(state: AppState, limiter: Arc<RateLimiter>) -> Router {
    let formatter = ErrorFormatter::new(state.config.environment);
    let api = Router::new()
        .nest("/tours", tour_routes(state.clone()))
        .nest("/users", user_routes(state.clone()))
        .nest("/reviews", review_routes(state.clone()))
        .nest("/bookings", booking_routes(state))
        .layer(from_fn_with_state(limiter, rate_limit));
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(from_fn_with_state(formatter, render_errors))
}
