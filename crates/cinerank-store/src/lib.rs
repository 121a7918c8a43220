//! CineRank Store - Document store abstraction
//!
//! Handlers talk to the catalog through the traits below. Two backends
//! implement them: SurrealDB over WebSocket, and an in-process store used
//! for local runs and tests (`DATABASE_URL=mem://`).

pub mod memory;
pub mod surrealdb_store;

pub use memory::MemoryStore;
pub use surrealdb_store::SurrealDbStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cinerank_core::{DatabaseConfig, Genre, Movie, Ranking, Result, User};
use std::sync::Arc;

/// Movie collection operations
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// All movies, in storage order
    async fn list_movies(&self) -> Result<Vec<Movie>>;

    /// Find a movie by its external id
    async fn find_movie(&self, imdb_id: &str) -> Result<Option<Movie>>;

    /// Insert a movie and return the new document id
    async fn insert_movie(&self, movie: Movie) -> Result<String>;

    /// Set the review and ranking of a movie
    ///
    /// Returns `false` when no movie has that id.
    async fn update_review(&self, imdb_id: &str, review: &str, ranking: &Ranking) -> Result<bool>;

    /// Movies sharing at least one genre with `genres`, best ranked first
    async fn recommended(&self, genres: &[String], limit: usize) -> Result<Vec<Movie>>;
}

/// User collection operations
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn email_exists(&self, email: &str) -> Result<bool>;

    /// Insert a user and return its `user_id`
    async fn insert_user(&self, user: User) -> Result<String>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<User>>;

    /// Overwrite the stored token pair
    ///
    /// Returns `false` when no user has that id.
    async fn update_tokens(
        &self,
        user_id: &str,
        token: &str,
        refresh_token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Names of a user's favourite genres, `None` if the user does not exist
    async fn favourite_genre_names(&self, user_id: &str) -> Result<Option<Vec<String>>>;
}

/// Read-only reference collections
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    async fn list_genres(&self) -> Result<Vec<Genre>>;

    async fn list_rankings(&self) -> Result<Vec<Ranking>>;
}

/// Store handles shared by the HTTP layer
#[derive(Clone)]
pub struct Stores {
    pub movies: Arc<dyn MovieStore>,
    pub users: Arc<dyn UserStore>,
    pub reference: Arc<dyn ReferenceStore>,
}

impl Stores {
    /// Use one backend for every collection
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: MovieStore + UserStore + ReferenceStore + 'static,
    {
        Self {
            movies: backend.clone(),
            users: backend.clone(),
            reference: backend,
        }
    }
}

/// Connect to the configured backend
pub async fn open(config: &DatabaseConfig) -> Result<Stores> {
    if config.is_in_memory() {
        tracing::warn!("Using in-memory store, data will not survive a restart");
        return Ok(Stores::from_backend(Arc::new(MemoryStore::new())));
    }

    let store = SurrealDbStore::new(config).await?;
    store.init_schema().await?;
    store.seed_rankings().await?;
    tracing::info!(
        namespace = %config.namespace,
        database = %config.name,
        "Connected to SurrealDB"
    );

    Ok(Stores::from_backend(Arc::new(store)))
}
