// Error types for configuration, the user store, and the auth gateway.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rover_telemetry_core::model::ErrorMessage;
use thiserror::Error;

use crate::constants::{
    MSG_FORBIDDEN, MSG_INVALID_CREDENTIALS, MSG_INVALID_USER_DATA, MSG_NOT_AUTHORIZED,
    MSG_SERVER_ERROR, MSG_USER_EXISTS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {name}: {value:?}")]
    Env { name: &'static str, value: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user already exists")]
    UserExists,

    #[error("user store unavailable: {0}")]
    Unavailable(String),

    #[error("user store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("user store document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("user database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{}", MSG_USER_EXISTS)]
    UserExists,

    #[error("{}", MSG_INVALID_USER_DATA)]
    InvalidUserData,

    #[error("{}", MSG_INVALID_CREDENTIALS)]
    InvalidCredentials,

    #[error("{}", MSG_NOT_AUTHORIZED)]
    InvalidToken,

    #[error("{}", MSG_FORBIDDEN)]
    Forbidden,

    #[error(transparent)]
    Store(StoreError),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserExists => AuthError::UserExists,
            other => AuthError::Store(other),
        }
    }
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::UserExists | AuthError::InvalidUserData => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Store(_) | AuthError::Hash(_) | AuthError::Token(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn body(&self) -> ErrorMessage {
        if self.status().is_server_error() {
            ErrorMessage {
                message: MSG_SERVER_ERROR.to_string(),
                error: Some(self.to_string()),
            }
        } else {
            ErrorMessage {
                message: self.to_string(),
                error: None,
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;
