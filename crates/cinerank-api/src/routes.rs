//! API route definitions

use crate::auth::middleware::auth_middleware;
use crate::handlers::{health, movies, reviews, users};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

/// Public and protected routes, not yet bound to state
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/movies", get(movies::list_movies))
        .route("/genres", get(movies::list_genres))
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/refresh", post(users::refresh));

    // Protected routes (valid, current access token required)
    let protected_routes = Router::new()
        .route("/movie/:imdb_id", get(movies::get_movie))
        .route("/addmovie", post(movies::add_movie))
        .route("/add-movie", post(movies::add_movie))
        .route("/recommended-movies", get(movies::recommended_movies))
        .route("/updatereview/:imdb_id", patch(reviews::update_review))
        .route("/update-review/:imdb_id", patch(reviews::update_review))
        .route("/logout", post(users::logout))
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
