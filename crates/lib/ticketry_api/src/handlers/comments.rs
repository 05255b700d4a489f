//! Comment request handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::parse_uuid;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentUser;
use crate::models::{
    CommentDto, CommentListResponse, CommentResponse, CreateCommentRequest, MessageResponse,
    UpdateCommentRequest,
};
use ticketry_core::tracker::comments;

/// `POST /api/comments` — comment on a ticket; notifies the ticket's
/// assignee and creator.
pub async fn create_comment_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Json(body): Json<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<CommentResponse>)> {
    // Text is checked before the ticket id, matching the error precedence
    // clients already rely on.
    let text = body.text.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(AppError::Validation("Comment text is required".into()));
    }
    let ticket_id = parse_uuid(
        body.ticket_id.as_deref().unwrap_or_default(),
        "Invalid ticket ID",
    )?;

    let detail = comments::create(&state.pool, &user.id, &ticket_id, &text).await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

/// `GET /api/comments/ticket/{ticket_id}` — all comments on a ticket,
/// newest first.
pub async fn ticket_comments_handler(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> AppResult<Json<CommentListResponse>> {
    let ticket_id = parse_uuid(&ticket_id, "Invalid ticket ID")?;
    let comments = comments::list_for_ticket(&state.pool, &ticket_id).await?;
    Ok(Json(CommentListResponse {
        success: true,
        comments: comments.into_iter().map(CommentDto::from).collect(),
    }))
}

/// `PUT /api/comments/{id}` — edit a comment. Author only.
pub async fn update_comment_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateCommentRequest>,
) -> AppResult<Json<CommentResponse>> {
    let text = body.text.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(AppError::Validation("Comment text is required".into()));
    }
    let id = parse_uuid(&id, "Invalid comment ID")?;

    let detail = comments::update(&state.pool, &id, &user.id, &text).await?;
    Ok(Json(detail.into()))
}

/// `DELETE /api/comments/{id}` — delete a comment. Author only.
pub async fn delete_comment_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_uuid(&id, "Invalid comment ID")?;
    comments::delete(&state.pool, &id, &user.id).await?;
    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}
