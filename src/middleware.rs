//! Boundary middleware: per-client rate ceiling, authentication, and
//! environment-aware error rendering.

use crate::auth::{password_changed_after, verify_token};
use crate::error::{AppError, ErrorFormatter};
use crate::model::user::{Role, User};
use crate::service::users;
use crate::state::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Fixed-window request counter per client key.
pub struct RateLimiter {
    max: u32,
    window: Duration,
    buckets: Mutex<HashMap<String, (Instant, u32)>>,
}

impl RateLimiter {
    /// Ceiling for API routes: 100 requests per hour per client.
    pub fn api_default() -> Self {
        Self::new(100, Duration::from_secs(60 * 60))
    }

    pub fn new(max: u32, window: Duration) -> Self {
        RateLimiter {
            max,
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// True when the request fits in the current window. Expired windows are
    /// swept on every check so one-off client keys do not accumulate.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().unwrap_or_else(|p| p.into_inner());
        buckets.retain(|_, (start, _)| now.duration_since(*start) < self.window);
        let entry = buckets.entry(key.to_string()).or_insert((now, 0));
        entry.1 += 1;
        entry.1 <= self.max
    }

    #[cfg(test)]
    fn bucket_count(&self) -> usize {
        self.buckets.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

fn client_key(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".into())
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !limiter.check(&client_key(&req)) {
        return Err(AppError::TooManyRequests);
    }
    Ok(next.run(req).await)
}

/// Re-render errors with the configured verbosity and log the unexpected
/// ones. Handlers emit the production-safe body by default; the original
/// error rides in response extensions.
pub async fn render_errors(
    State(formatter): State<ErrorFormatter>,
    req: Request,
    next: Next,
) -> Response {
    let res = next.run(req).await;
    let Some(err) = res.extensions().get::<Arc<AppError>>().cloned() else {
        return res;
    };
    if !err.is_operational() {
        tracing::error!(error = ?err, "unexpected failure");
    }
    formatter.render(&err)
}

/// The authenticated user, placed in request extensions by [`protect`].
#[derive(Clone)]
pub struct CurrentUser(pub Arc<User>);

impl CurrentUser {
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.0.role()) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

fn bearer_or_cookie_token(req: &Request) -> Option<String> {
    if let Some(auth) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            return Some(token.trim().to_string());
        }
    }
    let cookies = req.headers().get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == "jwt").then(|| value.to_string())
    })
}

/// Best-effort identification for routes that serve anonymous traffic too.
/// A valid token attaches the user; anything else passes through untouched.
pub async fn identify(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if let Some(token) = bearer_or_cookie_token(&req) {
        if let Ok(claims) = verify_token(&state.config, &token) {
            if let Ok(Some(user)) = users::find_by_id(&state.pool, claims.sub).await {
                if !password_changed_after(user.password_changed_at, claims.iat) {
                    req.extensions_mut().insert(CurrentUser(Arc::new(user)));
                }
            }
        }
    }
    next.run(req).await
}

/// Require a valid token, load the user, and reject tokens issued before the
/// last password change.
pub async fn protect(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_or_cookie_token(&req).ok_or_else(|| {
        AppError::Unauthorized("You are not logged in. Please log in to get access".into())
    })?;
    let claims = verify_token(&state.config, &token)?;
    let user = users::find_by_id(&state.pool, claims.sub)
        .await?
        .ok_or_else(|| {
            AppError::Unauthorized("The user belonging to this token no longer exists".into())
        })?;
    if password_changed_after(user.password_changed_at, claims.iat) {
        return Err(AppError::Unauthorized(
            "Password was changed recently. Please log in again".into(),
        ));
    }
    req.extensions_mut().insert(CurrentUser(Arc::new(user)));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_allows_up_to_max_then_rejects() {
        let limiter = RateLimiter::new(3, Duration::from_secs(3600));
        assert!(limiter.check("a"));
        assert!(limiter.check("a"));
        assert!(limiter.check("a"));
        assert!(!limiter.check("a"));
        // separate clients get separate windows
        assert!(limiter.check("b"));
    }

    #[test]
    fn limiter_resets_after_the_window() {
        let limiter = RateLimiter::new(1, Duration::from_millis(0));
        assert!(limiter.check("a"));
        assert!(limiter.check("a"));
    }

    #[test]
    fn expired_client_keys_are_evicted() {
        let limiter = RateLimiter::new(1, Duration::from_millis(0));
        assert!(limiter.check("a"));
        assert!(limiter.check("b"));
        // "a"'s window had already expired when "b" was checked
        assert_eq!(limiter.bucket_count(), 1);
    }
}
