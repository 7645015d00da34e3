use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Login payload. Both fields are optional on the wire so that missing values
/// get the same 400 as empty ones.
#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct LoginUser {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct LoginResponse {
    pub message: String,
    pub user: LoginUser,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SuspendedResponse {
    pub error: String,
    pub minutes_remaining: u64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: String,
    pub name: String,
    pub version: String,
    pub commit: String,
}
