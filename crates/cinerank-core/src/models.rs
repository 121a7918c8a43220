//! Catalog and account models
//!
//! Field names follow the JSON documents stored in the `movies`, `users`,
//! `genres` and `rankings` collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ranking::NOT_APPLICABLE_VALUE;

/// Genre reference data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Genre {
    #[schema(example = 3)]
    pub genre_id: i32,
    #[schema(example = "Horror")]
    pub genre_name: String,
}

impl Genre {
    pub fn new(genre_id: i32, genre_name: impl Into<String>) -> Self {
        Self {
            genre_id,
            genre_name: genre_name.into(),
        }
    }
}

/// A sentiment label and its numeric rank
///
/// Used both as an entry of the ranking catalog and as the ranking
/// sub-record stored on a movie. Lower values rank better.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Ranking {
    #[schema(example = "Excellent")]
    pub ranking_name: String,
    #[schema(example = 1)]
    pub ranking_value: i32,
}

impl Ranking {
    pub fn new(ranking_name: impl Into<String>, ranking_value: i32) -> Self {
        Self {
            ranking_name: ranking_name.into(),
            ranking_value,
        }
    }

    /// Ranking given to movies that have not been reviewed yet
    pub fn not_ranked() -> Self {
        Self::new("Not_Ranked", NOT_APPLICABLE_VALUE)
    }
}

impl Default for Ranking {
    fn default() -> Self {
        Self::not_ranked()
    }
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Movie {
    /// External identifier (IMDB style)
    #[schema(example = "tt0111161")]
    pub imdb_id: String,
    #[schema(example = "The Shawshank Redemption")]
    pub title: String,
    pub poster_path: String,
    pub youtube_id: String,
    pub genre: Vec<Genre>,
    #[serde(default)]
    pub admin_review: String,
    #[serde(default)]
    pub ranking: Ranking,
}

impl Movie {
    /// Check whether any of this movie's genres is in `names`
    pub fn has_any_genre(&self, names: &[String]) -> bool {
        self.genre
            .iter()
            .any(|g| names.iter().any(|n| n == &g.genre_name))
    }
}

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::User => "USER",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(UserRole::Admin),
            "USER" => Ok(UserRole::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Stored user account
///
/// `token` and `refresh_token` hold the only pair currently accepted for
/// this user. An empty string means no session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub role: UserRole,
    #[serde(default)]
    pub favourite_genres: Vec<Genre>,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Names of the user's favourite genres
    pub fn favourite_genre_names(&self) -> Vec<String> {
        self.favourite_genres
            .iter()
            .map(|g| g.genre_name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"ADMIN\"");
        let role: UserRole = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, UserRole::User);
        assert!(serde_json::from_str::<UserRole>("\"admin\"").is_err());
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
    }

    #[test]
    fn test_movie_defaults_missing_ranking() {
        let movie: Movie = serde_json::from_value(serde_json::json!({
            "imdb_id": "tt0000001",
            "title": "Untitled",
            "poster_path": "https://example.com/p.jpg",
            "youtube_id": "abc",
            "genre": [{ "genre_id": 1, "genre_name": "Drama" }]
        }))
        .unwrap();

        assert_eq!(movie.ranking, Ranking::not_ranked());
        assert!(movie.admin_review.is_empty());
    }

    #[test]
    fn test_has_any_genre() {
        let movie = Movie {
            imdb_id: "tt1".to_string(),
            title: "Scream".to_string(),
            poster_path: String::new(),
            youtube_id: String::new(),
            genre: vec![Genre::new(1, "Horror"), Genre::new(2, "Mystery")],
            admin_review: String::new(),
            ranking: Ranking::default(),
        };

        assert!(movie.has_any_genre(&["Comedy".to_string(), "Horror".to_string()]));
        assert!(!movie.has_any_genre(&["Comedy".to_string()]));
        assert!(!movie.has_any_genre(&[]));
    }
}
