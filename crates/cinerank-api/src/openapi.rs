//! OpenAPI document

use crate::auth::{LoginRequest, LoginResponse, RegisterRequest};
use crate::error::ApiError;
use crate::handlers::{health, movies, reviews, users};
use crate::models::{AddMovieRequest, GenreInput, InsertedResponse, MessageResponse, RankingInput};
use cinerank_core::{Genre, Movie, Ranking, UserRole};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(title = "CineRank API", description = "Movie catalog with recommendations and ranked admin reviews"),
    paths(
        health::health_check,
        movies::list_movies,
        movies::get_movie,
        movies::add_movie,
        movies::recommended_movies,
        movies::list_genres,
        users::register,
        users::login,
        users::logout,
        users::refresh,
        reviews::update_review,
    ),
    components(schemas(
        ApiError,
        Movie,
        Genre,
        Ranking,
        UserRole,
        AddMovieRequest,
        GenreInput,
        RankingInput,
        InsertedResponse,
        MessageResponse,
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        reviews::ReviewRequest,
        reviews::ReviewResponse,
        health::HealthResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness"),
        (name = "movies", description = "Catalog and recommendations"),
        (name = "users", description = "Accounts and sessions"),
        (name = "reviews", description = "Admin reviews"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/movies", "/recommended-movies", "/updatereview/{imdb_id}", "/refresh"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
