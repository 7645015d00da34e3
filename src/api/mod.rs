use crate::guard::{AttemptLog, Clock, CredentialStore, LoginEngine, PgStore, SystemClock};
use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Method, Request, header::CONTENT_TYPE},
    middleware,
    routing::{get, post},
};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;
mod openapi;
mod pruner;
mod state;

pub use openapi::openapi;
pub use pruner::spawn_prune_worker;
pub use state::{ApiConfig, AppState};

/// Build the application router with every route and layer.
///
/// # Errors
/// Returns an error if the configured CORS origin is not a valid header value.
pub fn router(state: AppState, cors_allow_origin: &str) -> Result<Router> {
    let cors = cors_layer(cors_allow_origin)?;

    let app = Router::new()
        .route("/api/login", post(handlers::login))
        .route("/api/health", get(handlers::health))
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", openapi()))
        .layer(middleware::from_fn_with_state(
            state.throttle.clone(),
            handlers::throttle::enforce,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(state.engine.clone()))
                .layer(Extension(state.origins)),
        );

    Ok(app)
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(dsn: SecretString, config: ApiConfig) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(dsn.expose_secret())
        .await
        .context("Failed to connect to database")?;

    let store = Arc::new(PgStore::new(pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let credentials: Arc<dyn CredentialStore> = store.clone();
    let attempts: Arc<dyn AttemptLog> = store;

    let engine = Arc::new(LoginEngine::new(
        config.protection(),
        credentials,
        attempts.clone(),
        clock.clone(),
    ));

    // Stale rows never influence a decision, prune them in the background.
    spawn_prune_worker(
        attempts,
        clock,
        *engine.config(),
        config.prune_interval(),
    );

    let state = AppState::new(engine, &config);
    let app = router(state, config.cors_allow_origin())?;

    let listener = TcpListener::bind(format!("::0:{}", config.port())).await?;

    info!("Listening on [::]:{}", config.port());

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

fn cors_layer(allow_origin: &str) -> Result<CorsLayer> {
    let allow_origin = if allow_origin.trim() == "*" {
        AllowOrigin::any()
    } else {
        AllowOrigin::exact(
            HeaderValue::from_str(allow_origin.trim())
                .with_context(|| format!("Invalid CORS origin: {allow_origin}"))?,
        )
    };

    Ok(CorsLayer::new()
        .allow_headers([CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(allow_origin))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
