//! Structured API error responses with error codes
//!
//! Every failure leaves the API as the same envelope: a stable
//! machine-readable code, a numeric code, and a human-readable message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::infra::StoreError;

/// Error codes for API responses
///
/// These codes are stable and can be used by clients for programmatic error
/// handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Request authentication (1xxx)
    /// No credentials, or wrong scheme
    AuthRequired,
    /// Invalid or malformed session token
    InvalidToken,
    /// Session token has expired
    TokenExpired,
    /// Authenticated but missing the required role flag
    InsufficientPermissions,

    // Magic-link redemption (2xxx)
    /// Token does not exist
    InvalidLink,
    /// Token expired before redemption
    LinkExpired,
    /// Token was already redeemed
    LinkUsed,

    // Validation (3xxx)
    /// Request body is malformed
    InvalidRequestBody,
    /// Field value is invalid
    InvalidFieldValue,

    // Resources (4xxx)
    /// Requested resource not found
    ResourceNotFound,
    /// User not found
    UserNotFound,

    // Infrastructure (8xxx)
    /// Database operation failed
    DatabaseError,
    /// Outbound email delivery failed
    DeliveryFailed,
    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn numeric_code(&self) -> u32 {
        match self {
            ErrorCode::AuthRequired => 1001,
            ErrorCode::InvalidToken => 1002,
            ErrorCode::TokenExpired => 1003,
            ErrorCode::InsufficientPermissions => 1004,

            ErrorCode::InvalidLink => 2001,
            ErrorCode::LinkExpired => 2002,
            ErrorCode::LinkUsed => 2003,

            ErrorCode::InvalidRequestBody => 3001,
            ErrorCode::InvalidFieldValue => 3002,

            ErrorCode::ResourceNotFound => 4001,
            ErrorCode::UserNotFound => 4002,

            ErrorCode::DatabaseError => 8001,
            ErrorCode::DeliveryFailed => 8002,
            ErrorCode::InternalError => 8999,
        }
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::AuthRequired => StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,
            ErrorCode::TokenExpired => StatusCode::UNAUTHORIZED,
            ErrorCode::InsufficientPermissions => StatusCode::FORBIDDEN,

            // Redemption failures are client errors on the public endpoint.
            ErrorCode::InvalidLink => StatusCode::BAD_REQUEST,
            ErrorCode::LinkExpired => StatusCode::BAD_REQUEST,
            ErrorCode::LinkUsed => StatusCode::BAD_REQUEST,

            ErrorCode::InvalidRequestBody => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidFieldValue => StatusCode::BAD_REQUEST,

            ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::UserNotFound => StatusCode::NOT_FOUND,

            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::DeliveryFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code_str = match self {
            ErrorCode::AuthRequired => "AUTH_REQUIRED",
            ErrorCode::InvalidToken => "INVALID_TOKEN",
            ErrorCode::TokenExpired => "TOKEN_EXPIRED",
            ErrorCode::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            ErrorCode::InvalidLink => "INVALID_LINK",
            ErrorCode::LinkExpired => "LINK_EXPIRED",
            ErrorCode::LinkUsed => "LINK_USED",
            ErrorCode::InvalidRequestBody => "INVALID_REQUEST_BODY",
            ErrorCode::InvalidFieldValue => "INVALID_FIELD_VALUE",
            ErrorCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::DeliveryFailed => "DELIVERY_FAILED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", code_str)
    }
}

/// Structured error response for API endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error details
    pub error: ErrorDetails,
}

/// Detailed error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Numeric error code for easy categorization
    pub numeric_code: u32,

    /// Human-readable error message
    pub message: String,

    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetails {
                code,
                numeric_code: code.numeric_code(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Set additional details
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }

    /// Get the HTTP status code
    pub fn status(&self) -> StatusCode {
        self.error.code.http_status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code_str = self.error.code.to_string();
        let mut response = (status, Json(self)).into_response();

        if let Ok(code_value) = axum::http::HeaderValue::from_str(&code_str) {
            response.headers_mut().insert(
                axum::http::header::HeaderName::from_static("x-error-code"),
                code_value,
            );
        }

        response
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserNotFound(email) => {
                ApiError::new(ErrorCode::UserNotFound, format!("User not found: {email}"))
            }
            StoreError::Database(e) => {
                tracing::error!(error = %e, "database error");
                ApiError::new(ErrorCode::DatabaseError, "Database error")
            }
            StoreError::Internal(msg) => ApiError::new(ErrorCode::InternalError, msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAuth => ApiError::new(ErrorCode::AuthRequired, "Not authenticated"),
            AuthError::InvalidToken => ApiError::new(ErrorCode::InvalidLink, "Invalid token"),
            AuthError::TokenAlreadyUsed => {
                ApiError::new(ErrorCode::LinkUsed, "Token has already been used")
            }
            AuthError::TokenExpired => {
                ApiError::new(ErrorCode::LinkExpired, "Token has expired")
            }
            AuthError::InvalidSignature(_) | AuthError::InvalidClaims => {
                ApiError::new(ErrorCode::InvalidToken, "Invalid token")
            }
            AuthError::Forbidden(role) => ApiError::new(
                ErrorCode::InsufficientPermissions,
                format!("{role} access required"),
            ),
            AuthError::Configuration(msg) => {
                tracing::error!(error = %msg, "configuration error");
                ApiError::new(ErrorCode::InternalError, "Internal server error")
            }
            AuthError::Store(e) => ApiError::from(e),
            AuthError::Delivery(msg) => {
                tracing::error!(error = %msg, "delivery error");
                ApiError::new(ErrorCode::DeliveryFailed, "Email sending failed")
            }
        }
    }
}

/// Create a validation error with field details
pub fn validation_error(field: &str, message: impl Into<String>) -> ApiError {
    ApiError::new(ErrorCode::InvalidFieldValue, message.into())
        .with_details(serde_json::json!({ "field": field }))
}
