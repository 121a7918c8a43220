//! SurrealDB implementation of the catalog stores
//!
//! Collections map to tables of the same name: `movies`, `users`, `genres`
//! and `rankings`. Record keys are generated here so the inserted id can be
//! returned without reading the `id` thing back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cinerank_core::ranking::default_catalog;
use cinerank_core::{CineError, DatabaseConfig, Genre, Movie, Ranking, Result, User};
use serde::Deserialize;
use serde_json::Value;
use surrealdb::engine::remote::ws::{Client, Ws, Wss};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use uuid::Uuid;

use crate::{MovieStore, ReferenceStore, UserStore};

/// SurrealDB-backed store
pub struct SurrealDbStore {
    client: Surreal<Client>,
}

impl SurrealDbStore {
    /// Create a new SurrealDB connection
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let client = if let Some(address) = config.url.strip_prefix("wss://") {
            Surreal::new::<Wss>(address).await
        } else {
            let address = config.url.strip_prefix("ws://").unwrap_or(&config.url);
            Surreal::new::<Ws>(address).await
        }
        .map_err(|e| CineError::DatabaseError(format!("SurrealDB connection failed: {e}")))?;

        client
            .signin(Root {
                username: &config.user,
                password: &config.pass,
            })
            .await
            .map_err(|e| CineError::DatabaseError(format!("SurrealDB auth failed: {e}")))?;

        client
            .use_ns(&config.namespace)
            .use_db(&config.name)
            .await
            .map_err(|e| CineError::DatabaseError(format!("SurrealDB namespace error: {e}")))?;

        Ok(Self { client })
    }

    /// Define lookup indexes (idempotent)
    pub async fn init_schema(&self) -> Result<()> {
        self.client
            .query(
                r#"
                DEFINE INDEX IF NOT EXISTS idx_movies_imdb_id ON movies FIELDS imdb_id;
                DEFINE INDEX IF NOT EXISTS idx_users_user_id ON users FIELDS user_id UNIQUE;
                DEFINE INDEX IF NOT EXISTS idx_users_email ON users FIELDS email UNIQUE;
            "#,
            )
            .await
            .map_err(|e| CineError::DatabaseError(format!("Schema init failed: {e}")))?;

        Ok(())
    }

    /// Insert the default ranking catalog when the table is empty
    pub async fn seed_rankings(&self) -> Result<()> {
        if !self.list_rankings().await?.is_empty() {
            return Ok(());
        }

        for ranking in default_catalog() {
            self.client
                .query("CREATE rankings CONTENT $ranking")
                .bind(("ranking", ranking))
                .await
                .map_err(|e| CineError::DatabaseError(format!("Failed to seed rankings: {e}")))?;
        }

        tracing::info!("Seeded default ranking catalog");
        Ok(())
    }

    async fn select_all<T>(&self, table: &'static str) -> Result<Vec<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.client
            .query(format!("SELECT * OMIT id FROM {table}"))
            .await
            .map_err(|e| CineError::DatabaseError(format!("Query on {table} failed: {e}")))?
            .take(0)
            .map_err(|e| CineError::DatabaseError(format!("Result extraction failed: {e}")))
    }
}

/// Raw `favourite_genres` field of a user document
#[derive(Debug, Deserialize)]
struct FavouriteRow {
    favourite_genres: Option<Value>,
}

impl FavouriteRow {
    /// Genre names from the stored list
    ///
    /// A missing or non-array field is a shape error. Entries without a
    /// string `genre_name` are skipped.
    fn into_names(self) -> Result<Vec<String>> {
        let Some(Value::Array(entries)) = self.favourite_genres else {
            return Err(CineError::ShapeError(
                "favourite_genres is missing or not a list".to_string(),
            ));
        };

        Ok(entries
            .iter()
            .filter_map(|entry| entry.get("genre_name").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }
}

#[async_trait]
impl MovieStore for SurrealDbStore {
    async fn list_movies(&self) -> Result<Vec<Movie>> {
        self.select_all("movies").await
    }

    async fn find_movie(&self, imdb_id: &str) -> Result<Option<Movie>> {
        let mut movies: Vec<Movie> = self
            .client
            .query("SELECT * OMIT id FROM movies WHERE imdb_id = $imdb_id LIMIT 1")
            .bind(("imdb_id", imdb_id.to_string()))
            .await
            .map_err(|e| CineError::DatabaseError(format!("Query failed: {e}")))?
            .take(0)
            .map_err(|e| CineError::DatabaseError(format!("Result extraction failed: {e}")))?;

        Ok(movies.pop())
    }

    async fn insert_movie(&self, movie: Movie) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();

        self.client
            .query("CREATE type::thing('movies', $id) CONTENT $movie")
            .bind(("id", id.clone()))
            .bind(("movie", movie))
            .await
            .map_err(|e| CineError::DatabaseError(format!("Failed to insert movie: {e}")))?
            .check()
            .map_err(|e| CineError::DatabaseError(format!("Failed to insert movie: {e}")))?;

        Ok(id)
    }

    async fn update_review(&self, imdb_id: &str, review: &str, ranking: &Ranking) -> Result<bool> {
        let updated: Vec<Movie> = self
            .client
            .query(
                "UPDATE movies SET admin_review = $review, ranking = $ranking \
                 WHERE imdb_id = $imdb_id RETURN AFTER",
            )
            .bind(("imdb_id", imdb_id.to_string()))
            .bind(("review", review.to_string()))
            .bind(("ranking", ranking.clone()))
            .await
            .map_err(|e| CineError::DatabaseError(format!("Failed to update review: {e}")))?
            .take(0)
            .map_err(|e| CineError::DatabaseError(format!("Result extraction failed: {e}")))?;

        Ok(!updated.is_empty())
    }

    async fn recommended(&self, genres: &[String], limit: usize) -> Result<Vec<Movie>> {
        self.client
            .query(
                "SELECT * OMIT id FROM movies \
                 WHERE genre.genre_name CONTAINSANY $genres \
                 ORDER BY ranking.ranking_value ASC LIMIT $limit",
            )
            .bind(("genres", genres.to_vec()))
            .bind(("limit", limit))
            .await
            .map_err(|e| CineError::DatabaseError(format!("Recommendation query failed: {e}")))?
            .take(0)
            .map_err(|e| CineError::DatabaseError(format!("Result extraction failed: {e}")))
    }
}

#[async_trait]
impl UserStore for SurrealDbStore {
    async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn insert_user(&self, user: User) -> Result<String> {
        let user_id = user.user_id.clone();

        self.client
            .query("CREATE type::thing('users', $id) CONTENT $user")
            .bind(("id", user_id.clone()))
            .bind(("user", user))
            .await
            .map_err(|e| CineError::DatabaseError(format!("Failed to insert user: {e}")))?
            .check()
            .map_err(|e| CineError::DatabaseError(format!("Failed to insert user: {e}")))?;

        Ok(user_id)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut users: Vec<User> = self
            .client
            .query("SELECT * OMIT id FROM users WHERE email = $email LIMIT 1")
            .bind(("email", email.to_string()))
            .await
            .map_err(|e| CineError::DatabaseError(format!("Query failed: {e}")))?
            .take(0)
            .map_err(|e| CineError::DatabaseError(format!("Result extraction failed: {e}")))?;

        Ok(users.pop())
    }

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<User>> {
        let mut users: Vec<User> = self
            .client
            .query("SELECT * OMIT id FROM users WHERE user_id = $user_id LIMIT 1")
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(|e| CineError::DatabaseError(format!("Query failed: {e}")))?
            .take(0)
            .map_err(|e| CineError::DatabaseError(format!("Result extraction failed: {e}")))?;

        Ok(users.pop())
    }

    async fn update_tokens(
        &self,
        user_id: &str,
        token: &str,
        refresh_token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let updated: Vec<User> = self
            .client
            .query(
                "UPDATE users SET token = $token, refresh_token = $refresh_token, \
                 updated_at = $updated_at WHERE user_id = $user_id RETURN AFTER",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("token", token.to_string()))
            .bind(("refresh_token", refresh_token.to_string()))
            .bind(("updated_at", updated_at))
            .await
            .map_err(|e| CineError::DatabaseError(format!("Failed to update tokens: {e}")))?
            .take(0)
            .map_err(|e| CineError::DatabaseError(format!("Result extraction failed: {e}")))?;

        Ok(!updated.is_empty())
    }

    async fn favourite_genre_names(&self, user_id: &str) -> Result<Option<Vec<String>>> {
        let mut rows: Vec<FavouriteRow> = self
            .client
            .query("SELECT favourite_genres FROM users WHERE user_id = $user_id LIMIT 1")
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(|e| CineError::DatabaseError(format!("Query failed: {e}")))?
            .take(0)
            .map_err(|e| CineError::ShapeError(format!("favourite_genres: {e}")))?;

        match rows.pop() {
            Some(row) => row.into_names().map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ReferenceStore for SurrealDbStore {
    async fn list_genres(&self) -> Result<Vec<Genre>> {
        self.select_all("genres").await
    }

    async fn list_rankings(&self) -> Result<Vec<Ranking>> {
        let mut rankings: Vec<Ranking> = self.select_all("rankings").await?;
        rankings.sort_by_key(|r| r.ranking_value);
        Ok(rankings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> FavouriteRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_favourite_names_from_list() {
        let names = row(json!({
            "favourite_genres": [
                { "genre_id": 1, "genre_name": "Comedy" },
                { "genre_id": 2, "genre_name": "Horror" }
            ]
        }))
        .into_names()
        .unwrap();

        assert_eq!(names, vec!["Comedy", "Horror"]);
    }

    #[test]
    fn test_favourite_entries_without_name_are_skipped() {
        let names = row(json!({
            "favourite_genres": [
                { "genre_id": 1 },
                { "genre_id": 2, "genre_name": 7 },
                "Drama",
                { "genre_id": 3, "genre_name": "Western" }
            ]
        }))
        .into_names()
        .unwrap();

        assert_eq!(names, vec!["Western"]);
    }

    #[test]
    fn test_empty_favourite_list() {
        let names = row(json!({ "favourite_genres": [] })).into_names().unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_missing_favourites_is_shape_error() {
        assert!(matches!(
            row(json!({})).into_names(),
            Err(CineError::ShapeError(_))
        ));
        assert!(matches!(
            row(json!({ "favourite_genres": null })).into_names(),
            Err(CineError::ShapeError(_))
        ));
    }

    #[test]
    fn test_non_list_favourites_is_shape_error() {
        for value in [json!("Comedy"), json!({ "genre_name": "Comedy" }), json!(3)] {
            assert!(matches!(
                row(json!({ "favourite_genres": value })).into_names(),
                Err(CineError::ShapeError(_))
            ));
        }
    }
}
