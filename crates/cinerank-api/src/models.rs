//! Request and response bodies shared by several handlers

use cinerank_core::{Genre, Movie, Ranking};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Genre as sent by clients
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct GenreInput {
    #[validate(range(min = 1, message = "genre_id must be positive"))]
    #[schema(example = 3)]
    pub genre_id: i32,
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Comedy")]
    pub genre_name: String,
}

impl From<GenreInput> for Genre {
    fn from(input: GenreInput) -> Self {
        Genre::new(input.genre_id, input.genre_name)
    }
}

/// Ranking as sent by clients
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RankingInput {
    #[validate(length(min = 1, max = 100))]
    pub ranking_name: String,
    pub ranking_value: i32,
}

/// New catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddMovieRequest {
    #[validate(length(min = 1, max = 32))]
    #[schema(example = "tt0111161")]
    pub imdb_id: String,
    #[validate(length(min = 2, max = 500))]
    pub title: String,
    #[validate(url)]
    pub poster_path: String,
    #[validate(length(min = 1, max = 64))]
    pub youtube_id: String,
    #[validate(length(min = 1, message = "at least one genre is required"), nested)]
    pub genre: Vec<GenreInput>,
    #[serde(default)]
    pub admin_review: String,
    /// Defaults to `Not_Ranked` (999)
    #[validate(nested)]
    #[serde(default)]
    pub ranking: Option<RankingInput>,
}

impl From<AddMovieRequest> for Movie {
    fn from(request: AddMovieRequest) -> Self {
        Movie {
            imdb_id: request.imdb_id,
            title: request.title,
            poster_path: request.poster_path,
            youtube_id: request.youtube_id,
            genre: request.genre.into_iter().map(Genre::from).collect(),
            admin_review: request.admin_review,
            ranking: request
                .ranking
                .map(|r| Ranking::new(r.ranking_name, r.ranking_value))
                .unwrap_or_default(),
        }
    }
}

/// Id of a newly inserted document
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InsertedResponse {
    pub inserted_id: String,
}

/// Plain confirmation message
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_request() -> serde_json::Value {
        json!({
            "imdb_id": "tt0111161",
            "title": "The Shawshank Redemption",
            "poster_path": "https://example.com/poster.jpg",
            "youtube_id": "6hB3S9bIaco",
            "genre": [{ "genre_id": 1, "genre_name": "Drama" }]
        })
    }

    #[test]
    fn test_movie_without_ranking_is_not_ranked() {
        let request: AddMovieRequest = serde_json::from_value(valid_request()).unwrap();
        assert!(request.validate().is_ok());

        let movie = Movie::from(request);
        assert_eq!(movie.ranking, Ranking::not_ranked());
        assert_eq!(movie.genre, vec![Genre::new(1, "Drama")]);
    }

    #[test]
    fn test_movie_requires_genre() {
        let mut body = valid_request();
        body["genre"] = json!([]);
        let request: AddMovieRequest = serde_json::from_value(body).unwrap();

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("genre"));
    }

    #[test]
    fn test_movie_rejects_bad_poster_url() {
        let mut body = valid_request();
        body["poster_path"] = json!("not a url");
        let request: AddMovieRequest = serde_json::from_value(body).unwrap();

        assert!(request.validate().is_err());
    }
}
