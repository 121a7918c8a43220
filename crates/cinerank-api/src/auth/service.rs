//! Authentication service layer
//!
//! Registration, login, token refresh and logout on top of the user store,
//! the token service and the session store.

use super::jwt::{IdentityClaims, TokenPair};
use super::password::{hash_password_with_config, verify_password, PasswordConfig};
use crate::audit::{audit_log, AuditEvent};
use crate::error::AppError;
use crate::models::GenreInput;
use crate::state::AppState;
use chrono::Utc;
use cinerank_core::{Genre, User, UserRole};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Same message for unknown email and wrong password
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// User registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 100))]
    #[schema(example = "Ada")]
    pub first_name: String,
    #[validate(length(min = 2, max = 100))]
    #[schema(example = "Lovelace")]
    pub last_name: String,
    #[validate(email)]
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    /// Defaults to `USER`
    #[serde(default)]
    pub role: UserRole,
    #[validate(length(min = 1, message = "at least one favourite genre is required"), nested)]
    pub favourite_genres: Vec<GenreInput>,
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Profile and tokens returned on login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
    pub token: String,
    pub refresh_token: String,
    pub favourite_genres: Vec<Genre>,
}

fn identity_of(user: &User) -> IdentityClaims {
    IdentityClaims {
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        role: user.role,
        user_id: user.user_id.clone(),
    }
}

pub struct AuthService<'a> {
    state: &'a AppState,
}

impl<'a> AuthService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Create an account and return its `user_id`
    pub async fn register(
        &self,
        request: RegisterRequest,
        ip_address: Option<String>,
    ) -> Result<String, AppError> {
        let state = self.state;

        if state.bounded(state.users.email_exists(&request.email)).await? {
            audit_log(&AuditEvent::RegistrationFailure {
                email: request.email.clone(),
                reason: "email already registered".to_string(),
                ip_address,
            });
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let password_hash = hash_off_thread(request.password, state.passwords.clone()).await?;
        let now = Utc::now();
        let user = User {
            user_id: Uuid::new_v4().to_string(),
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            password_hash,
            role: request.role,
            favourite_genres: request
                .favourite_genres
                .into_iter()
                .map(Genre::from)
                .collect(),
            token: String::new(),
            refresh_token: String::new(),
            created_at: now,
            updated_at: now,
        };

        let email = user.email.clone();
        let role = user.role;
        let user_id = state.bounded(state.users.insert_user(user)).await?;

        audit_log(&AuditEvent::RegistrationSuccess {
            user_id: user_id.clone(),
            email,
            role: role.to_string(),
            ip_address,
        });

        Ok(user_id)
    }

    /// Check credentials and start a new session
    pub async fn login(
        &self,
        request: LoginRequest,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<LoginResponse, AppError> {
        let state = self.state;
        let fail = |reason: &str| {
            audit_log(&AuditEvent::LoginFailure {
                email: request.email.clone(),
                reason: reason.to_string(),
                ip_address: ip_address.clone(),
                user_agent: user_agent.clone(),
            });
            AppError::Unauthorized(Some(INVALID_CREDENTIALS.to_string()))
        };

        let Some(user) = state.bounded(state.users.find_by_email(&request.email)).await? else {
            return Err(fail("unknown email"));
        };

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(fail("wrong password"));
        }

        let pair = self.start_session(&identity_of(&user)).await?;

        audit_log(&AuditEvent::LoginSuccess {
            user_id: user.user_id.clone(),
            email: user.email.clone(),
            ip_address,
            user_agent,
        });

        Ok(LoginResponse {
            user_id: user.user_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
            token: pair.access_token,
            refresh_token: pair.refresh_token,
            favourite_genres: user.favourite_genres,
        })
    }

    /// Rotate the pair for the owner of `refresh_token`
    ///
    /// The presented token must be the one currently stored for the user.
    /// The new pair carries the user's current profile and role.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        ip_address: Option<String>,
    ) -> Result<TokenPair, AppError> {
        let state = self.state;
        let claims = state.tokens.validate_refresh(refresh_token)?;
        let user_id = claims.identity.user_id;

        let user = state
            .bounded(state.users.find_by_user_id(&user_id))
            .await?;

        let user = match user {
            Some(user) if !user.refresh_token.is_empty() && user.refresh_token == refresh_token => {
                user
            }
            other => {
                let reason = if other.is_some() {
                    "refresh token is not the current one"
                } else {
                    "refresh token owner no longer exists"
                };
                audit_log(&AuditEvent::InvalidToken {
                    ip_address,
                    user_agent: None,
                    reason: reason.to_string(),
                });
                return Err(AppError::Unauthorized(Some(
                    "Refresh token has been revoked".to_string(),
                )));
            }
        };

        // Identity is rebuilt from the stored user, not the presented claims
        let pair = self.start_session(&identity_of(&user)).await?;
        audit_log(&AuditEvent::TokenRefresh {
            user_id,
            ip_address,
        });

        Ok(pair)
    }

    /// Revoke the caller's stored pair
    pub async fn logout(
        &self,
        user_id: &str,
        email: &str,
        ip_address: Option<String>,
    ) -> Result<(), AppError> {
        let state = self.state;
        state.bounded(state.sessions.clear(user_id)).await?;

        audit_log(&AuditEvent::Logout {
            user_id: user_id.to_string(),
            email: email.to_string(),
            ip_address,
        });
        Ok(())
    }

    async fn start_session(&self, identity: &IdentityClaims) -> Result<TokenPair, AppError> {
        let state = self.state;
        let pair = state.tokens.issue(identity)?;
        state
            .bounded(state.sessions.persist(
                &identity.user_id,
                &pair.access_token,
                &pair.refresh_token,
            ))
            .await?;
        Ok(pair)
    }
}

/// Hash on the blocking pool
async fn hash_off_thread(password: String, config: PasswordConfig) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password_with_config(&password, &config))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {e}")))?
        .map_err(AppError::from)
}
