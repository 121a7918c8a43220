/// Authentication middleware for protecting routes
///
/// Extracts the bearer token, validates it, and checks it is still the token
/// stored for its user. On success the caller's identity is added to the
/// request extensions.
use super::jwt::{Claims, JwtError};
use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use cinerank_core::UserRole;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Authenticated user information extracted from the access token
///
/// Handlers receive it with `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        let identity = claims.identity;
        Self {
            user_id: identity.user_id,
            email: identity.email,
            first_name: identity.first_name,
            last_name: identity.last_name,
            role: identity.role,
        }
    }
}

/// Authentication middleware errors
///
/// Every variant is a 401.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),

    #[error("Unknown user")]
    UnknownUser,

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Session lookup failed")]
    LookupFailed,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            AuthError::MissingAuthHeader => "Missing Authorization header",
            AuthError::InvalidAuthHeader => "Invalid Authorization header format",
            AuthError::InvalidToken(_) => "Invalid or expired token",
            AuthError::UnknownUser | AuthError::TokenRevoked | AuthError::LookupFailed => {
                "Token is no longer valid"
            }
        };

        let body = ApiError::new("UNAUTHORIZED", message).with_details(self.to_string());
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Authentication middleware that requires a valid, current access token
///
/// ```ignore
/// let protected = Router::new()
///     .route("/movie/:imdb_id", get(movies::get_movie))
///     .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let ip_address = extract_ip_address(request.headers());
    let user_agent = extract_user_agent(request.headers());

    let reject = |error: AuthError| {
        audit_log(&AuditEvent::InvalidToken {
            ip_address: ip_address.clone(),
            user_agent: user_agent.clone(),
            reason: error.to_string(),
        });
        error
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)
        .map_err(reject)?
        .to_str()
        .map_err(|_| reject(AuthError::InvalidAuthHeader))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| reject(AuthError::InvalidAuthHeader))?
        .to_string();

    let claims = state
        .tokens
        .validate_access(&token)
        .map_err(|e| reject(AuthError::InvalidToken(e)))?;

    let stored = match state
        .bounded(state.sessions.current_token(&claims.identity.user_id))
        .await
    {
        Ok(Some(stored)) => stored,
        Ok(None) => return Err(reject(AuthError::UnknownUser)),
        Err(e) => {
            tracing::warn!(error = ?e, "Session lookup failed");
            return Err(reject(AuthError::LookupFailed));
        }
    };

    if stored.is_empty() || stored != token {
        return Err(reject(AuthError::TokenRevoked));
    }

    request
        .extensions_mut()
        .insert(AuthenticatedUser::from(claims));

    Ok(next.run(request).await)
}
