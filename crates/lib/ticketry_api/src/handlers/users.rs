//! User listing handler (for member selection).

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::AppResult;
use crate::models::UserListResponse;
use ticketry_core::auth::queries;
use ticketry_core::tracker::UserRef;

/// `GET /api/users` — all registered users, name and email only.
pub async fn list_users_handler(
    State(state): State<AppState>,
) -> AppResult<Json<UserListResponse>> {
    let users = queries::list_users(&state.pool)
        .await?
        .into_iter()
        .map(|u| UserRef {
            id: u.id,
            name: u.name,
            email: u.email,
        })
        .collect();
    Ok(Json(UserListResponse {
        success: true,
        users,
    }))
}
