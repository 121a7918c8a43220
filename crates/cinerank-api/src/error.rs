//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cinerank_core::CineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Per-field validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            fields: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new("NOT_FOUND", format!("{resource} not found"))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn unauthorized() -> Self {
        Self::new("UNAUTHORIZED", "Authentication required")
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Request body failed field constraints
    Validation(BTreeMap<String, Vec<String>>),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    /// Carries the reason, shown in `details`
    Unauthorized(Option<String>),
    Forbidden(String),
    Database(String),
    /// Classifier failed or answered with an unknown label
    Upstream(String),
    Timeout,
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Database(_)
            | AppError::Upstream(_)
            | AppError::Timeout
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            AppError::Validation(fields) => ApiError {
                fields: Some(fields),
                ..ApiError::new("VALIDATION_ERROR", "Request validation failed")
            },
            AppError::BadRequest(msg) => ApiError::bad_request(msg),
            AppError::NotFound(msg) => ApiError::not_found(&msg),
            AppError::Conflict(msg) => ApiError::new("CONFLICT", msg),
            AppError::Unauthorized(None) => ApiError::unauthorized(),
            AppError::Unauthorized(Some(reason)) => ApiError::unauthorized().with_details(reason),
            AppError::Forbidden(msg) => ApiError::new("FORBIDDEN", msg),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database operation failed");
                ApiError::new("DATABASE_ERROR", "Database operation failed").with_details(msg)
            }
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "Classifier call failed");
                ApiError::new("UPSTREAM_ERROR", "Review classification failed").with_details(msg)
            }
            AppError::Timeout => {
                tracing::warn!("Store operation timed out");
                ApiError::new("TIMEOUT", "Operation timed out")
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                ApiError::internal_error().with_details(msg)
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<CineError> for AppError {
    fn from(err: CineError) -> Self {
        match err {
            CineError::NotFound(msg) => AppError::NotFound(msg),
            CineError::DatabaseError(msg) => AppError::Database(msg),
            CineError::ShapeError(msg) => AppError::Database(format!("Unexpected shape: {msg}")),
            CineError::LlmError(msg) => AppError::Upstream(msg),
            CineError::ConfigError(msg) => AppError::Internal(format!("Configuration error: {msg}")),
        }
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::EncodingError(e) => AppError::Internal(format!("Token signing failed: {e}")),
            err @ JwtError::LifetimeOverflow => AppError::Internal(err.to_string()),
            other => AppError::Unauthorized(Some(other.to_string())),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = BTreeMap::new();
        collect_field_errors(&errors, "", &mut fields);
        AppError::Validation(fields)
    }
}

/// Flatten nested validation errors into `path -> messages`
fn collect_field_errors(
    errors: &ValidationErrors,
    prefix: &str,
    out: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let path = format!("{prefix}{field}");
        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages = out.entry(path).or_default();
                for error in list {
                    messages.push(
                        error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| error.code.to_string()),
                    );
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                collect_field_errors(inner, &format!("{path}."), out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_field_errors(inner, &format!("{path}[{index}]."), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Item {
        #[validate(length(min = 1, message = "must not be empty"))]
        name: String,
    }

    #[derive(Validate)]
    struct Form {
        #[validate(email)]
        email: String,
        #[validate(length(min = 1), nested)]
        items: Vec<Item>,
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::Unauthorized(None).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Timeout.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::from(CineError::NotFound("movie".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert!(matches!(
            AppError::from(CineError::LlmError("down".into())),
            AppError::Upstream(_)
        ));
        assert!(matches!(
            AppError::from(JwtError::ExpiredToken),
            AppError::Unauthorized(Some(_))
        ));
    }

    #[test]
    fn test_validation_fields_flattened() {
        let form = Form {
            email: "not-an-email".to_string(),
            items: vec![Item {
                name: String::new(),
            }],
        };

        let AppError::Validation(fields) = AppError::from(form.validate().unwrap_err()) else {
            panic!("expected validation error");
        };

        assert_eq!(fields["email"], vec!["email".to_string()]);
        assert_eq!(fields["items[0].name"], vec!["must not be empty".to_string()]);
    }
}
