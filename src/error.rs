use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{hasher::HashError, repository::RepositoryError};

/// UnauthorizedReason
///
/// Machine-readable classification of every 401 produced by the session layer. All reasons map
/// to the same status code; clients use the reason to decide between refreshing and re-login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum UnauthorizedReason {
    MissingToken,
    AccessTokenExpired,
    InvalidToken,
    InvalidRefreshToken,
    RefreshTokenReused,
    InvalidCredentials,
    AccountInactive,
}

impl UnauthorizedReason {
    pub fn message(self) -> &'static str {
        match self {
            Self::MissingToken => "unauthorized request",
            Self::AccessTokenExpired => "access token expired",
            Self::InvalidToken => "invalid access token",
            Self::InvalidRefreshToken => "invalid refresh token",
            Self::RefreshTokenReused => "refresh token is expired or used",
            Self::InvalidCredentials => "username or password is incorrect",
            Self::AccountInactive => "admin account is inactive",
        }
    }
}

/// AuthError
///
/// Every failure the session and admin layers can report. None of them is retried internally;
/// the HTTP layer turns them into the uniform error envelope.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{}", .0.message())]
    Unauthorized(UnauthorizedReason),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal_error",
        }
    }

    /// The 401 classification, if this is an authentication failure.
    pub fn reason(&self) -> Option<UnauthorizedReason> {
        match self {
            Self::Unauthorized(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(message) => Self::Conflict(message),
            RepositoryError::Database(source) => Self::Internal(source.to_string()),
        }
    }
}

impl From<HashError> for AuthError {
    fn from(err: HashError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// ErrorEnvelope
///
/// JSON body of every failed request.
#[derive(Debug, Serialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ErrorEnvelope {
    pub status_code: u16,
    pub success: bool,
    pub message: String,
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnauthorizedReason>,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Internal details stay in the logs.
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "request failed with internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorEnvelope {
            status_code: status.as_u16(),
            success: false,
            message,
            error_type: self.error_type().to_string(),
            reason: self.reason(),
        };

        (status, Json(body)).into_response()
    }
}
