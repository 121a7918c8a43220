//! Security audit logging for authentication events
//!
//! All audit events are logged at INFO level with the "audit" target,
//! so they can be filtered and routed separately from application logs.

use axum::http::HeaderMap;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Security audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Successful user registration
    RegistrationSuccess {
        user_id: String,
        email: String,
        role: String,
        ip_address: Option<String>,
    },

    /// Rejected registration
    RegistrationFailure {
        email: String,
        reason: String,
        ip_address: Option<String>,
    },

    /// Successful user login
    LoginSuccess {
        user_id: String,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Failed login attempt
    LoginFailure {
        email: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// User logout
    Logout {
        user_id: String,
        email: String,
        ip_address: Option<String>,
    },

    /// Token pair rotated through the refresh endpoint
    TokenRefresh {
        user_id: String,
        ip_address: Option<String>,
    },

    /// Invalid, expired or revoked token used
    InvalidToken {
        ip_address: Option<String>,
        user_agent: Option<String>,
        reason: String,
    },

    /// Access denied due to insufficient permissions
    AccessDenied {
        user_id: String,
        resource: String,
        required_role: String,
        ip_address: Option<String>,
    },

    /// Admin review stored and ranked
    ReviewUpdated {
        user_id: String,
        imdb_id: String,
        ranking_name: String,
    },
}

impl AuditEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AuditEvent::RegistrationSuccess { .. } => "registration_success",
            AuditEvent::RegistrationFailure { .. } => "registration_failure",
            AuditEvent::LoginSuccess { .. } => "login_success",
            AuditEvent::LoginFailure { .. } => "login_failure",
            AuditEvent::Logout { .. } => "logout",
            AuditEvent::TokenRefresh { .. } => "token_refresh",
            AuditEvent::InvalidToken { .. } => "invalid_token",
            AuditEvent::AccessDenied { .. } => "access_denied",
            AuditEvent::ReviewUpdated { .. } => "review_updated",
        }
    }
}

/// Log a security audit event with structured fields
pub fn audit_log(event: &AuditEvent) {
    let payload = serde_json::to_string(event).unwrap_or_default();

    info!(
        target: "audit",
        event_type = event.event_type(),
        timestamp = %Utc::now().to_rfc3339(),
        event = %payload,
        "Security audit event"
    );
}

/// Client IP from proxy headers
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        })
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = AuditEvent::Logout {
            user_id: "u1".to_string(),
            email: "a@example.com".to_string(),
            ip_address: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], event.event_type());
    }

    #[test]
    fn test_extract_ip_address() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_ip_address(&headers), None);

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(extract_ip_address(&headers).as_deref(), Some("10.0.0.2"));

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(extract_ip_address(&headers).as_deref(), Some("203.0.113.7"));
    }
}
