//! User account handlers
//!
//! Registration, login, logout and token refresh. Login and refresh also set
//! the `access_token` / `refresh_token` cookies; logout expires them.

use crate::audit::{extract_ip_address, extract_user_agent};
use crate::auth::cookies::{access_cookie, cleared_cookies, refresh_cookie, REFRESH_COOKIE};
use crate::auth::{AuthService, AuthenticatedUser, LoginRequest, LoginResponse, RegisterRequest};
use crate::error::AppError;
use crate::extract::ValidatedJson;
use crate::models::{InsertedResponse, MessageResponse};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

/// Register a new user account
#[utoipa::path(
    post,
    path = "/register",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = InsertedResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 409, description = "Email already registered", body = crate::error::ApiError),
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let inserted_id = AuthService::new(&state)
        .register(request, extract_ip_address(&headers))
        .await?;

    Ok((StatusCode::CREATED, Json(InsertedResponse { inserted_id })))
}

/// Login with email and password
///
/// Returns the profile with both tokens and sets them as HttpOnly cookies.
#[utoipa::path(
    post,
    path = "/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = AuthService::new(&state)
        .login(
            request,
            extract_ip_address(&headers),
            extract_user_agent(&headers),
        )
        .await?;

    let jar = jar
        .add(access_cookie(&response.token))
        .add(refresh_cookie(&response.refresh_token));

    Ok((jar, Json(response)))
}

/// Logout and revoke the current tokens
#[utoipa::path(
    post,
    path = "/logout",
    tag = "users",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
    ),
    security(("bearer" = []))
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    AuthService::new(&state)
        .logout(&user.user_id, &user.email, extract_ip_address(&headers))
        .await?;

    let [access, refresh] = cleared_cookies();
    let jar = jar.add(access).add(refresh);

    Ok((jar, Json(MessageResponse::new("Logged out successfully"))))
}

/// Exchange the `refresh_token` cookie for a new pair
#[utoipa::path(
    post,
    path = "/refresh",
    tag = "users",
    responses(
        (status = 200, description = "Tokens rotated", body = MessageResponse),
        (status = 401, description = "Missing, invalid or revoked refresh token", body = crate::error::ApiError),
    )
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Unauthorized(Some("Missing refresh token".to_string())))?;

    let pair = AuthService::new(&state)
        .refresh(&presented, extract_ip_address(&headers))
        .await?;

    let jar = jar
        .add(access_cookie(&pair.access_token))
        .add(refresh_cookie(&pair.refresh_token));

    Ok((jar, Json(MessageResponse::new("Tokens refreshed"))))
}
