//! Ticket request handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use super::parse_uuid;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentUser;
use crate::models::{
    AssignRequest, CreateTicketRequest, KanbanResponse, MessageResponse, ProjectScopeQuery,
    StatusRequest, TicketDto, TicketListResponse, TicketResponse, UpdateTicketRequest,
};
use ticketry_core::tracker::tickets::{self, NewTicket, TicketPatch};

/// `POST /api/tickets` — create a ticket in a project the requester
/// belongs to.
pub async fn create_ticket_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Json(body): Json<CreateTicketRequest>,
) -> AppResult<(StatusCode, Json<TicketResponse>)> {
    let project_id = match body.project_id.as_deref() {
        None | Some("") => {
            return Err(AppError::Validation("Project ID is required".into()));
        }
        Some(raw) => parse_uuid(raw, "Invalid project ID")?,
    };
    let assignee_id = body
        .assignee
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|raw| parse_uuid(raw, "Invalid assignee ID"))
        .transpose()?;

    let new = NewTicket {
        project_id,
        title: body.title.unwrap_or_default(),
        description: body.description,
        priority: body.priority,
        status: body.status,
        assignee_id,
        due_date: body.due_date,
    };
    let detail = tickets::create(&state.pool, &user.id, new).await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

/// `GET /api/tickets/project/{project_id}` — all tickets in a project,
/// newest first.
pub async fn project_tickets_handler(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> AppResult<Json<TicketListResponse>> {
    let project_id = parse_uuid(&project_id, "Invalid project ID")?;
    let tickets = tickets::list_for_project(&state.pool, &project_id).await?;
    Ok(Json(TicketListResponse {
        success: true,
        tickets: tickets.into_iter().map(TicketDto::from).collect(),
    }))
}

/// `GET /api/tickets/all` — all tickets created by the requester, project
/// populated.
pub async fn all_user_tickets_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
) -> AppResult<Json<TicketListResponse>> {
    let tickets = tickets::list_created_by(&state.pool, &user.id, None).await?;
    Ok(Json(TicketListResponse {
        success: true,
        tickets: tickets.into_iter().map(TicketDto::from).collect(),
    }))
}

/// `GET /api/tickets/kanban?projectId=` — the requester's tickets grouped
/// into the three kanban columns.
pub async fn kanban_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Query(query): Query<ProjectScopeQuery>,
) -> AppResult<Json<KanbanResponse>> {
    let board = tickets::kanban(&state.pool, &user.id, query.project_filter()).await?;
    Ok(Json(board.into()))
}

/// `PUT /api/tickets/{id}/status` — move a ticket between columns.
pub async fn update_status_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> AppResult<Json<TicketResponse>> {
    // Validated before the id so an unknown status always reads as such.
    let status = body.status.unwrap_or_default();
    if ticketry_core::tracker::tickets::TicketStatus::parse(&status).is_none() {
        return Err(AppError::Validation("Invalid status".into()));
    }
    let id = parse_uuid(&id, "Invalid ticket ID")?;
    let detail = tickets::update_status(&state.pool, &id, &status).await?;
    Ok(Json(detail.into()))
}

/// `PUT /api/tickets/{id}` — generic merge-update.
pub async fn update_ticket_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateTicketRequest>,
) -> AppResult<Json<TicketResponse>> {
    let id = parse_uuid(&id, "Invalid ticket ID")?;

    let assignee_id = match body.assignee {
        None => None,
        Some(None) => Some(None),
        Some(Some(raw)) => Some(Some(parse_uuid(&raw, "Invalid assignee ID")?)),
    };

    let patch = TicketPatch {
        title: body.title,
        description: body.description,
        priority: body.priority,
        status: body.status,
        assignee_id,
        due_date: body.due_date,
    };
    let detail = tickets::update(&state.pool, &id, patch).await?;
    Ok(Json(detail.into()))
}

/// `PUT /api/tickets/{id}/assign` — assign a ticket to a project member.
pub async fn assign_ticket_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AssignRequest>,
) -> AppResult<Json<TicketResponse>> {
    let id = parse_uuid(&id, "Invalid ID")?;
    let user_id = parse_uuid(body.user_id.as_deref().unwrap_or_default(), "Invalid ID")?;
    let detail = tickets::assign(&state.pool, &id, &user_id).await?;
    Ok(Json(detail.into()))
}

/// `DELETE /api/tickets/{id}` — delete a ticket by id.
pub async fn delete_ticket_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_uuid(&id, "Invalid ticket ID")?;
    tickets::delete(&state.pool, &id).await?;
    Ok(Json(MessageResponse::new("Ticket deleted")))
}
