//! Notification request handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use super::parse_uuid;
use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;
use crate::models::{
    MessageResponse, NotificationDto, NotificationListResponse, NotificationQuery,
    NotificationResponse,
};
use ticketry_core::tracker::notifications;

/// Default page size for the notification list.
const DEFAULT_LIMIT: i64 = 20;

/// `GET /api/notifications?limit=` — the requester's notifications, newest
/// first, plus the unread count.
pub async fn list_notifications_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<NotificationListResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let (notifications, unread_count) =
        notifications::list_for_user(&state.pool, &user.id, limit).await?;
    Ok(Json(NotificationListResponse {
        success: true,
        notifications: notifications.into_iter().map(NotificationDto::from).collect(),
        unread_count,
    }))
}

/// `PUT /api/notifications/{id}/read` — mark one notification read.
/// Recipient only.
pub async fn mark_read_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<NotificationResponse>> {
    let id = parse_uuid(&id, "Invalid notification ID")?;
    let detail = notifications::mark_read(&state.pool, &id, &user.id).await?;
    Ok(Json(NotificationResponse {
        success: true,
        notification: detail.into(),
    }))
}

/// `PUT /api/notifications/read-all` — mark all of the requester's unread
/// notifications read.
pub async fn mark_all_read_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
) -> AppResult<Json<MessageResponse>> {
    notifications::mark_all_read(&state.pool, &user.id).await?;
    Ok(Json(MessageResponse::new(
        "All notifications marked as read",
    )))
}

/// `DELETE /api/notifications/{id}` — delete a notification. Recipient only.
pub async fn delete_notification_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_uuid(&id, "Invalid notification ID")?;
    notifications::delete(&state.pool, &id, &user.id).await?;
    Ok(Json(MessageResponse::new("Notification deleted")))
}
