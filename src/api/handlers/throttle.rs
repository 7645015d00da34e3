//! In-process request throttling keyed by origin address.
//!
//! This caps raw request volume per origin and runs before the login engine.
//! It is unrelated to the failure-based origin block, which is shared through
//! the database.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

use super::origin::OriginResolver;
use super::types::ErrorResponse;

pub const LOGIN_PATH: &str = "/api/login";
pub const HEALTH_PATH: &str = "/api/health";
pub const THROTTLED_MESSAGE: &str = "IP blocked due to too many requests. Please try again later.";

/// Drop idle per-origin buckets every this many checks.
const RETAIN_INTERVAL: u64 = 1000;

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

pub struct RequestThrottle {
    login: KeyedLimiter,
    default: KeyedLimiter,
    origins: OriginResolver,
    checks: AtomicU64,
}

impl RequestThrottle {
    #[must_use]
    pub fn new(
        login_requests_per_minute: u32,
        default_requests_per_minute: u32,
        origins: OriginResolver,
    ) -> Self {
        Self {
            login: RateLimiter::keyed(per_minute(login_requests_per_minute)),
            default: RateLimiter::keyed(per_minute(default_requests_per_minute)),
            origins,
            checks: AtomicU64::new(0),
        }
    }

    /// Whether a request for `path` from `origin` may proceed.
    pub fn allow(&self, path: &str, origin: &str) -> bool {
        let limiter = match path {
            HEALTH_PATH => return true,
            LOGIN_PATH => &self.login,
            _ => &self.default,
        };

        let checks = self.checks.fetch_add(1, Ordering::Relaxed);
        if checks > 0 && checks % RETAIN_INTERVAL == 0 {
            self.login.retain_recent();
            self.default.retain_recent();
        }

        limiter.check_key(&origin.to_string()).is_ok()
    }
}

fn per_minute(requests: u32) -> Quota {
    Quota::per_minute(NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN))
}

/// Middleware rejecting requests over quota with 429.
pub async fn enforce(
    State(throttle): State<Arc<RequestThrottle>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let origin = throttle.origins.resolve(request.headers(), peer);

    if throttle.allow(request.uri().path(), &origin) {
        return next.run(request).await;
    }

    warn!(origin = %origin, path = request.uri().path(), "Request throttled");

    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(ErrorResponse::new(THROTTLED_MESSAGE)),
    )
        .into_response()
}
