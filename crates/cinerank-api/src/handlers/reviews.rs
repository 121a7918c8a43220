//! Admin review handler

use crate::audit::{audit_log, AuditEvent};
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::extract::ValidatedJson;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReviewRequest {
    #[validate(length(min = 1, max = 5000))]
    #[schema(example = "A tense, beautifully shot thriller.")]
    pub admin_review: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponse {
    pub ranking_name: String,
    pub admin_review: String,
}

/// Store an admin review and rank the movie from it
///
/// The review is classified into one of the catalog's ranking labels; the
/// movie is only updated when the label is recognised.
#[utoipa::path(
    patch,
    path = "/updatereview/{imdb_id}",
    tag = "reviews",
    params(("imdb_id" = String, Path, description = "IMDB identifier")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review stored", body = ReviewResponse),
        (status = 400, description = "Empty review", body = crate::error::ApiError),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
        (status = 403, description = "Caller is not an admin", body = crate::error::ApiError),
        (status = 404, description = "Unknown movie", body = crate::error::ApiError),
        (status = 500, description = "Classifier failed", body = crate::error::ApiError),
    ),
    security(("bearer" = []))
)]
pub async fn update_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(imdb_id): Path<String>,
    request: Result<ValidatedJson<ReviewRequest>, AppError>,
) -> Result<Json<ReviewResponse>, AppError> {
    if !user.is_admin() {
        audit_log(&AuditEvent::AccessDenied {
            user_id: user.user_id.clone(),
            resource: format!("review:{imdb_id}"),
            required_role: "ADMIN".to_string(),
            ip_address: None,
        });
        return Err(AppError::Forbidden(
            "Only administrators can update reviews".to_string(),
        ));
    }

    let ValidatedJson(request) = request?;

    let catalog = state.bounded(state.reference.list_rankings()).await?;
    let ranking = state.ranker.classify(&catalog, &request.admin_review).await?;

    let matched = state
        .bounded(
            state
                .movies
                .update_review(&imdb_id, &request.admin_review, &ranking),
        )
        .await?;
    if !matched {
        return Err(AppError::NotFound(format!("Movie {imdb_id}")));
    }

    audit_log(&AuditEvent::ReviewUpdated {
        user_id: user.user_id,
        imdb_id,
        ranking_name: ranking.ranking_name.clone(),
    });

    Ok(Json(ReviewResponse {
        ranking_name: ranking.ranking_name,
        admin_review: request.admin_review,
    }))
}
