//! In-process store
//!
//! Keeps every collection in memory behind a `tokio::sync::RwLock`. Writes
//! are per-document last-writer-wins, like the SurrealDB backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cinerank_core::ranking::default_catalog;
use cinerank_core::{Genre, Movie, Ranking, Result, User};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{MovieStore, ReferenceStore, UserStore};

#[derive(Default)]
struct Collections {
    /// `(document id, movie)` in insertion order
    movies: Vec<(String, Movie)>,
    users: Vec<User>,
    genres: Vec<Genre>,
    rankings: Vec<Ranking>,
}

/// In-memory store seeded with the default ranking catalog
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_rankings(default_catalog())
    }

    /// Create a store with a specific ranking catalog
    pub fn with_rankings(rankings: Vec<Ranking>) -> Self {
        Self {
            inner: RwLock::new(Collections {
                rankings,
                ..Default::default()
            }),
        }
    }

    /// Replace the genre reference data
    pub async fn seed_genres(&self, genres: Vec<Genre>) {
        self.inner.write().await.genres = genres;
    }

    /// Insert movies directly, bypassing validation
    pub async fn seed_movies(&self, movies: Vec<Movie>) {
        let mut inner = self.inner.write().await;
        for movie in movies {
            inner.movies.push((Uuid::new_v4().simple().to_string(), movie));
        }
    }

    /// Insert or replace a user directly
    pub async fn seed_user(&self, user: User) {
        let mut inner = self.inner.write().await;
        inner.users.retain(|u| u.user_id != user.user_id);
        inner.users.push(user);
    }

    /// Number of stored users
    pub async fn user_count(&self) -> usize {
        self.inner.read().await.users.len()
    }
}

#[async_trait]
impl MovieStore for MemoryStore {
    async fn list_movies(&self) -> Result<Vec<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.iter().map(|(_, m)| m.clone()).collect())
    }

    async fn find_movie(&self, imdb_id: &str) -> Result<Option<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner
            .movies
            .iter()
            .find(|(_, m)| m.imdb_id == imdb_id)
            .map(|(_, m)| m.clone()))
    }

    async fn insert_movie(&self, movie: Movie) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();
        self.inner.write().await.movies.push((id.clone(), movie));
        Ok(id)
    }

    async fn update_review(&self, imdb_id: &str, review: &str, ranking: &Ranking) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let mut matched = false;

        for (_, movie) in inner.movies.iter_mut().filter(|(_, m)| m.imdb_id == imdb_id) {
            movie.admin_review = review.to_string();
            movie.ranking = ranking.clone();
            matched = true;
        }

        Ok(matched)
    }

    async fn recommended(&self, genres: &[String], limit: usize) -> Result<Vec<Movie>> {
        let inner = self.inner.read().await;
        let mut movies: Vec<Movie> = inner
            .movies
            .iter()
            .map(|(_, m)| m)
            .filter(|m| m.has_any_genre(genres))
            .cloned()
            .collect();

        movies.sort_by_key(|m| m.ranking.ranking_value);
        movies.truncate(limit);
        Ok(movies)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.inner.read().await.users.iter().any(|u| u.email == email))
    }

    async fn insert_user(&self, user: User) -> Result<String> {
        let user_id = user.user_id.clone();
        self.inner.write().await.users.push(user);
        Ok(user_id)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn update_tokens(
        &self,
        user_id: &str,
        token: &str,
        refresh_token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let Some(user) = inner.users.iter_mut().find(|u| u.user_id == user_id) else {
            return Ok(false);
        };

        user.token = token.to_string();
        user.refresh_token = refresh_token.to_string();
        user.updated_at = updated_at;
        Ok(true)
    }

    async fn favourite_genre_names(&self, user_id: &str) -> Result<Option<Vec<String>>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .find(|u| u.user_id == user_id)
            .map(User::favourite_genre_names))
    }
}

#[async_trait]
impl ReferenceStore for MemoryStore {
    async fn list_genres(&self) -> Result<Vec<Genre>> {
        Ok(self.inner.read().await.genres.clone())
    }

    async fn list_rankings(&self) -> Result<Vec<Ranking>> {
        Ok(self.inner.read().await.rankings.clone())
    }
}
