//! `POST /api/login`.
//!
//! Translates the engine's outcome into a status code and JSON body. The body
//! is parsed leniently: anything that is not a JSON object with string
//! `email` and `password` fields is treated as a missing-field request. That
//! includes well-formed JSON with a wrongly typed field, such as a numeric
//! `email`, which gets a 400 rather than being looked up as a credential.

use super::origin::OriginResolver;
use super::types::{ErrorResponse, LoginRequest, LoginResponse, LoginUser, SuspendedResponse};
use crate::guard::{LoginAttempt, LoginEngine, LoginOutcome, StorageFailure};
use axum::{
    body::Bytes,
    extract::{ConnectInfo, Extension},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, instrument};

pub const MISSING_FIELDS: &str = "Email and password are required";
pub const ORIGIN_BLOCKED: &str = "IP temporarily blocked due to excessive failed login attempts.";
pub const ACCOUNT_SUSPENDED: &str = "Account temporarily suspended due to too many failed attempts.";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const LOGIN_SUCCESSFUL: &str = "Login successful!";
pub const INTERNAL_ERROR: &str = "Internal server error";

#[utoipa::path(
    post,
    path= "/api/login",
    request_body = LoginRequest,
    responses (
        (status = 200, description = "Credentials accepted", body = LoginResponse),
        (status = 400, description = "Email or password missing", body = ErrorResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse),
        (status = 403, description = "Origin blocked or account suspended", body = SuspendedResponse),
        (status = 429, description = "Too many requests from this origin", body = ErrorResponse),
        (status = 500, description = "Storage unavailable", body = ErrorResponse),
    ),
    tag= "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    Extension(engine): Extension<Arc<LoginEngine>>,
    Extension(origins): Extension<OriginResolver>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request: LoginRequest = serde_json::from_slice(&body).unwrap_or_default();
    let origin = origins.resolve(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    let attempt = LoginAttempt::new(request.email, request.password, origin);
    outcome_response(engine.login(&attempt).await)
}

fn outcome_response(result: Result<LoginOutcome, StorageFailure>) -> Response {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("Login aborted by storage failure: {err:#}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR);
        }
    };

    match outcome {
        LoginOutcome::Success { subject } => (
            StatusCode::OK,
            Json(LoginResponse {
                message: LOGIN_SUCCESSFUL.to_string(),
                user: LoginUser { email: subject },
            }),
        )
            .into_response(),
        LoginOutcome::MalformedRequest => error_response(StatusCode::BAD_REQUEST, MISSING_FIELDS),
        LoginOutcome::BlockedByOrigin => error_response(StatusCode::FORBIDDEN, ORIGIN_BLOCKED),
        LoginOutcome::SuspendedAccount {
            minutes_remaining,
            tripped,
        } => {
            let error = if tripped {
                ACCOUNT_SUSPENDED.to_string()
            } else {
                format!("{ACCOUNT_SUSPENDED} Try again in {minutes_remaining} minutes.")
            };
            (
                StatusCode::FORBIDDEN,
                Json(SuspendedResponse {
                    error,
                    minutes_remaining,
                }),
            )
                .into_response()
        }
        LoginOutcome::InvalidCredentials => {
            error_response(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS)
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}
