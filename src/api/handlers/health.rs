use super::types::Health;
use crate::GIT_COMMIT_HASH;
use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
};
use tracing::{debug, error};

#[utoipa::path(
    get,
    path= "/api/health",
    responses (
        (status = 200, description = "Service is up", body = Health),
    ),
    tag= "health"
)]
// axum handler for health
pub async fn health() -> impl IntoResponse {
    let health = Health {
        status: "healthy".to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: GIT_COMMIT_HASH.to_string(),
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let headers = format!("{}:{}:{}", health.name, health.version, short_hash)
        .parse::<HeaderValue>()
        .map(|x_app_header_value| {
            debug!("X-App header: {:?}", x_app_header_value);

            let mut headers = HeaderMap::new();

            headers.insert("X-App", x_app_header_value);

            headers
        })
        .map_err(|err| {
            error!("Failed to parse X-App header: {}", err);
        });

    let headers = headers.unwrap_or_else(|()| HeaderMap::new());

    (StatusCode::OK, headers, Json(health))
}
