//! Catalog handlers

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::extract::ValidatedJson;
use crate::models::{AddMovieRequest, InsertedResponse};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use cinerank_core::{Genre, Movie};
use std::sync::Arc;

/// List every movie in the catalog
#[utoipa::path(
    get,
    path = "/movies",
    tag = "movies",
    responses(
        (status = 200, description = "All movies", body = [Movie]),
        (status = 500, description = "Database error", body = crate::error::ApiError),
    )
)]
pub async fn list_movies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let movies = state.bounded(state.movies.list_movies()).await?;
    Ok(Json(movies))
}

/// Fetch one movie by its IMDB id
#[utoipa::path(
    get,
    path = "/movie/{imdb_id}",
    tag = "movies",
    params(("imdb_id" = String, Path, description = "IMDB identifier")),
    responses(
        (status = 200, description = "Movie found", body = Movie),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
        (status = 404, description = "Unknown movie", body = crate::error::ApiError),
    ),
    security(("bearer" = []))
)]
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(imdb_id): Path<String>,
) -> Result<Json<Movie>, AppError> {
    state
        .bounded(state.movies.find_movie(&imdb_id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Movie {imdb_id}")))
}

/// Add a movie to the catalog
///
/// Movies sent without a ranking are stored as `Not_Ranked`.
#[utoipa::path(
    post,
    path = "/addmovie",
    tag = "movies",
    request_body = AddMovieRequest,
    responses(
        (status = 201, description = "Movie created", body = InsertedResponse),
        (status = 400, description = "Invalid movie", body = crate::error::ApiError),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
    ),
    security(("bearer" = []))
)]
pub async fn add_movie(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<AddMovieRequest>,
) -> Result<impl IntoResponse, AppError> {
    let movie = Movie::from(request);
    let imdb_id = movie.imdb_id.clone();
    let inserted_id = state.bounded(state.movies.insert_movie(movie)).await?;

    tracing::info!(%imdb_id, %inserted_id, "Movie added");
    Ok((StatusCode::CREATED, Json(InsertedResponse { inserted_id })))
}

/// Best-ranked movies in the caller's favourite genres
///
/// Empty when the caller has no favourite genres.
#[utoipa::path(
    get,
    path = "/recommended-movies",
    tag = "movies",
    responses(
        (status = 200, description = "Recommended movies, best ranked first", body = [Movie]),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
        (status = 500, description = "Stored profile unreadable", body = crate::error::ApiError),
    ),
    security(("bearer" = []))
)]
pub async fn recommended_movies(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let favourites = state
        .bounded(state.users.favourite_genre_names(&user.user_id))
        .await?
        .unwrap_or_default();

    if favourites.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let limit = state.config.catalog.recommended_movie_limit;
    let movies = state
        .bounded(state.movies.recommended(&favourites, limit))
        .await?;

    tracing::debug!(user_id = %user.user_id, count = movies.len(), "Recommendations served");
    Ok(Json(movies))
}

/// List genre reference data
#[utoipa::path(
    get,
    path = "/genres",
    tag = "movies",
    responses(
        (status = 200, description = "All genres", body = [Genre]),
    )
)]
pub async fn list_genres(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Genre>>, AppError> {
    let genres = state.bounded(state.reference.list_genres()).await?;
    Ok(Json(genres))
}
