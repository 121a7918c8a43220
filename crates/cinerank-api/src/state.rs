//! Application state management

use cinerank_core::config::AppConfig;
use cinerank_core::{ConfigError, LlmClient};
use cinerank_store::{MovieStore, ReferenceStore, Stores, UserStore};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::auth::jwt::TokenService;
use crate::auth::password::PasswordConfig;
use crate::auth::session::SessionStore;
use crate::error::AppError;
use crate::review::ReviewRanker;

/// Application state shared across handlers
///
/// Built once at startup and never mutated afterwards.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    pub movies: Arc<dyn MovieStore>,
    pub users: Arc<dyn UserStore>,
    pub reference: Arc<dyn ReferenceStore>,
    pub tokens: TokenService,
    pub sessions: SessionStore,
    pub passwords: PasswordConfig,
    pub ranker: ReviewRanker,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: AppConfig,
        stores: Stores,
        llm: Arc<dyn LlmClient>,
    ) -> Result<Self, ConfigError> {
        let tokens = TokenService::new(&config.auth)?;
        let ranker = ReviewRanker::new(llm, config.llm.prompt_template.clone());

        Ok(Self {
            start_time: Instant::now(),
            sessions: SessionStore::new(stores.users.clone()),
            movies: stores.movies,
            users: stores.users,
            reference: stores.reference,
            tokens,
            passwords: PasswordConfig::default(),
            ranker,
            config,
        })
    }

    /// Override the Argon2 cost parameters
    pub fn with_password_config(mut self, passwords: PasswordConfig) -> Self {
        self.passwords = passwords;
        self
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Run a store operation under the request timeout
    pub async fn bounded<T, F>(&self, operation: F) -> Result<T, AppError>
    where
        F: Future<Output = cinerank_core::Result<T>>,
    {
        let limit = Duration::from_secs(self.config.server.request_timeout_secs);
        match tokio::time::timeout(limit, operation).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => Err(AppError::Timeout),
        }
    }
}
