//! Project request handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::parse_uuid;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentUser;
use crate::models::{
    CreateProjectRequest, MemberRequest, MessageResponse, ProjectDto, ProjectListResponse,
    ProjectResponse, UpdateProjectRequest,
};
use ticketry_core::tracker::projects::{self, ProjectPatch};

/// `POST /api/projects` — create a project; the requester becomes owner.
pub async fn create_project_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Json(body): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<ProjectResponse>)> {
    let detail = projects::create(
        &state.pool,
        &user.id,
        body.title.as_deref().unwrap_or_default(),
        body.description.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

/// `GET /api/projects` — projects the requester owns or belongs to.
pub async fn list_projects_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
) -> AppResult<Json<ProjectListResponse>> {
    let projects = projects::list_for_user(&state.pool, &user.id).await?;
    Ok(Json(ProjectListResponse {
        success: true,
        projects: projects.into_iter().map(ProjectDto::from).collect(),
    }))
}

/// `GET /api/projects/{id}` — a single project, members populated.
pub async fn get_project_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<ProjectResponse>> {
    let id = parse_uuid(&id, "Invalid project ID")?;
    let detail = projects::get(&state.pool, &id, &user.id).await?;
    Ok(Json(detail.into()))
}

/// `PUT /api/projects/{id}` — update title/description. Owner only.
pub async fn update_project_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateProjectRequest>,
) -> AppResult<Json<ProjectResponse>> {
    let id = parse_uuid(&id, "Invalid project ID")?;
    let patch = ProjectPatch {
        title: body.title,
        description: body.description,
    };
    let detail = projects::update(&state.pool, &id, &user.id, patch).await?;
    Ok(Json(detail.into()))
}

/// `DELETE /api/projects/{id}` — delete a project. Owner only; tickets and
/// comments are left in place.
pub async fn delete_project_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_uuid(&id, "Invalid project ID")?;
    projects::delete(&state.pool, &id, &user.id).await?;
    Ok(Json(MessageResponse::new("Project deleted successfully")))
}

/// `POST /api/projects/{id}/members` — add a member. Owner only.
pub async fn add_member_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<MemberRequest>,
) -> AppResult<Json<ProjectResponse>> {
    let id = parse_uuid(&id, "Invalid ID provided")?;
    let member_id = parse_uuid(
        body.user_id.as_deref().unwrap_or_default(),
        "Invalid ID provided",
    )?;
    let detail = projects::add_member(&state.pool, &id, &user.id, &member_id).await?;
    Ok(Json(detail.into()))
}

/// `DELETE /api/projects/{id}/members` — remove a member. Owner only; the
/// owner themselves cannot be removed.
pub async fn remove_member_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(id): Path<String>,
    body: Option<Json<MemberRequest>>,
) -> AppResult<Json<ProjectResponse>> {
    let Json(body) = body.ok_or_else(|| AppError::Validation("Invalid ID provided".into()))?;
    let id = parse_uuid(&id, "Invalid ID provided")?;
    let member_id = parse_uuid(
        body.user_id.as_deref().unwrap_or_default(),
        "Invalid ID provided",
    )?;
    let detail = projects::remove_member(&state.pool, &id, &user.id, &member_id).await?;
    Ok(Json(detail.into()))
}
