//! CineRank Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout CineRank:
//! - Catalog models (movies, genres, rankings)
//! - User accounts and roles
//! - Common error types
//! - The text-classification client trait
//! - Configuration management
//! - Ranking catalog policy (sentinels, prompt rendering, label lookup)

pub mod config;
pub mod models;
pub mod ranking;

pub use config::{
    AppConfig, AuthConfig, CatalogConfig, ConfigError, DatabaseConfig, LlmConfig, LlmProvider,
    LoggingConfig, ServerConfig,
};
pub use models::{Genre, Movie, Ranking, User, UserRole};

use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for CineRank operations
#[derive(Error, Debug)]
pub enum CineError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Stored data does not have the shape the caller expects
    #[error("Unexpected document shape: {0}")]
    ShapeError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, CineError>;

impl From<ConfigError> for CineError {
    fn from(err: ConfigError) -> Self {
        CineError::ConfigError(err.to_string())
    }
}

// ============================================================================
// Text classification
// ============================================================================

/// Trait for LLM clients used to classify free text
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response for a single prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier, used in logs
    fn model(&self) -> &str;
}
