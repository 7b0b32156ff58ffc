use axum::{
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};

use crate::{AppState, database::CommentOperation, error::AppError};

use super::model::{CommentQuery, CreateCommentRequest};

#[axum::debug_handler]
pub async fn list_comments(
    State(state): State<AppState>,
    query: Result<Query<CommentQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;
    let slug = query.slug.trim();
    if slug.is_empty() {
        return Err(AppError::BadRequest("slug is required".into()));
    }

    let comments = CommentOperation::list_by_slug(&state.pool, slug)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list comments for {}: {}", slug, e);
            AppError::InternalServerError
        })?;

    Ok(Json(comments))
}

#[axum::debug_handler]
pub async fn create_comment(
    State(state): State<AppState>,
    req: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = req?;
    let req = req.validated()?;

    let comment = CommentOperation::create(&state.pool, &req.slug, &req.author, &req.body)
        .await
        .map_err(|_| AppError::InternalServerError)?;

    Ok((StatusCode::CREATED, Json(comment)))
}
