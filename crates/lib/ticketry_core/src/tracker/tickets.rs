//! Ticket persistence, the kanban partition and the status state machine.
//!
//! Status is a flat three-state machine (`Todo`, `InProgress`, `Done`): any
//! state may move to any other, and `Todo` is the default at creation.
//! Generic update, status change and delete intentionally perform no
//! ownership check; project and comment mutations do. That asymmetry is
//! long-standing observable behavior and callers depend on it.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::notifications::{self, NotificationEvent};
use super::projects;
use super::TrackerError;
use crate::uuid::uuidv7;

/// Ticket status values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStatus {
    Todo,
    InProgress,
    Done,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 3] = [
        TicketStatus::Todo,
        TicketStatus::InProgress,
        TicketStatus::Done,
    ];

    /// Stored / wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Todo => "Todo",
            TicketStatus::InProgress => "InProgress",
            TicketStatus::Done => "Done",
        }
    }

    /// Human-readable label (used by the dashboard bar chart).
    pub fn label(self) -> &'static str {
        match self {
            TicketStatus::Todo => "Todo",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Done => "Done",
        }
    }

    /// Parse a stored value. Returns `None` for anything outside the set.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

/// Ticket priority values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketPriority {
    Low,
    Medium,
    High,
}

impl TicketPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketPriority::Low => "Low",
            TicketPriority::Medium => "Medium",
            TicketPriority::High => "High",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        [
            TicketPriority::Low,
            TicketPriority::Medium,
            TicketPriority::High,
        ]
        .into_iter()
        .find(|p| p.as_str() == value)
    }
}

/// Raw ticket row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TicketRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub project_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub created_by: Uuid,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ticket with assignee, creator and project title populated.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TicketDetail {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub project_id: Uuid,
    pub project_title: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub assignee_name: Option<String>,
    pub assignee_email: Option<String>,
    pub created_by: Uuid,
    pub creator_name: String,
    pub creator_email: String,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted at ticket creation.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial ticket update. Outer `None` = field not supplied; inner `None`
/// on assignee/due date = explicit clear.
#[derive(Debug, Clone, Default)]
pub struct TicketPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub assignee_id: Option<Option<Uuid>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Tickets partitioned into the three kanban columns.
#[derive(Debug, Default)]
pub struct KanbanBoard {
    pub todo: Vec<TicketDetail>,
    pub in_progress: Vec<TicketDetail>,
    pub done: Vec<TicketDetail>,
}

/// Partition tickets by parsed status. Tickets whose stored status is not
/// one of the three known values are dropped from every column.
pub fn partition_by_status(tickets: Vec<TicketDetail>) -> KanbanBoard {
    let mut board = KanbanBoard::default();
    for ticket in tickets {
        match TicketStatus::parse(&ticket.status) {
            Some(TicketStatus::Todo) => board.todo.push(ticket),
            Some(TicketStatus::InProgress) => board.in_progress.push(ticket),
            Some(TicketStatus::Done) => board.done.push(ticket),
            None => {}
        }
    }
    board
}

const DETAIL_SELECT: &str = "SELECT t.id, t.title, t.description, t.priority, t.status, \
       t.project_id, p.title AS project_title, \
       t.assignee_id, a.name AS assignee_name, a.email AS assignee_email, \
       t.created_by, c.name AS creator_name, c.email AS creator_email, \
       t.due_date, t.created_at, t.updated_at \
     FROM tickets t \
     JOIN users c ON c.id = t.created_by \
     LEFT JOIN users a ON a.id = t.assignee_id \
     LEFT JOIN projects p ON p.id = t.project_id";

async fn fetch_row(pool: &PgPool, id: &Uuid) -> Result<Option<TicketRow>, sqlx::Error> {
    sqlx::query_as::<_, TicketRow>(
        "SELECT id, title, description, priority, status, project_id, assignee_id, \
                created_by, due_date, created_at, updated_at \
         FROM tickets WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

async fn fetch_detail(pool: &PgPool, id: &Uuid) -> Result<Option<TicketDetail>, sqlx::Error> {
    let sql = format!("{DETAIL_SELECT} WHERE t.id = $1");
    sqlx::query_as::<_, TicketDetail>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

fn validate_priority(value: &str) -> Result<(), TrackerError> {
    TicketPriority::parse(value)
        .map(|_| ())
        .ok_or_else(|| TrackerError::Validation("Invalid priority".into()))
}

fn validate_status(value: &str) -> Result<(), TrackerError> {
    TicketStatus::parse(value)
        .map(|_| ())
        .ok_or_else(|| TrackerError::Validation("Invalid status".into()))
}

/// Create a ticket in a project the requester belongs to.
///
/// If an assignee other than the requester is supplied, a `ticket_assigned`
/// notification is dispatched to them after the insert.
pub async fn create(
    pool: &PgPool,
    requester: &Uuid,
    new: NewTicket,
) -> Result<TicketDetail, TrackerError> {
    if new.title.is_empty() {
        return Err(TrackerError::Validation("Ticket title is required".into()));
    }
    let priority = match new.priority.as_deref() {
        Some(p) if !p.is_empty() => {
            validate_priority(p)?;
            p.to_string()
        }
        _ => TicketPriority::Medium.as_str().to_string(),
    };
    let status = match new.status.as_deref() {
        Some(s) if !s.is_empty() => {
            validate_status(s)?;
            s.to_string()
        }
        _ => TicketStatus::Todo.as_str().to_string(),
    };

    let project_exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1)")
            .bind(new.project_id)
            .fetch_one(pool)
            .await?;
    if !project_exists {
        return Err(TrackerError::NotFound("Project not found".into()));
    }
    if !projects::is_member(pool, &new.project_id, requester).await? {
        return Err(TrackerError::Forbidden(
            "Access denied to this project".into(),
        ));
    }

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO tickets (id, title, description, priority, status, project_id, \
                              assignee_id, created_by, due_date) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id",
    )
    .bind(uuidv7())
    .bind(&new.title)
    .bind(new.description.unwrap_or_default())
    .bind(priority)
    .bind(status)
    .bind(new.project_id)
    .bind(new.assignee_id)
    .bind(requester)
    .bind(new.due_date)
    .fetch_one(pool)
    .await?;

    if let Some(assignee) = new.assignee_id {
        if assignee != *requester {
            notifications::dispatch(
                pool,
                NotificationEvent::TicketAssigned {
                    recipient: assignee,
                    ticket_id: id,
                    project_id: new.project_id,
                    ticket_title: new.title.clone(),
                    actor: *requester,
                },
            );
        }
    }

    fetch_detail(pool, &id)
        .await?
        .ok_or_else(|| TrackerError::NotFound("Ticket not found".into()))
}

/// List all tickets for a project, newest first.
pub async fn list_for_project(
    pool: &PgPool,
    project_id: &Uuid,
) -> Result<Vec<TicketDetail>, TrackerError> {
    let sql = format!("{DETAIL_SELECT} WHERE t.project_id = $1 ORDER BY t.created_at DESC");
    let rows = sqlx::query_as::<_, TicketDetail>(&sql)
        .bind(project_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// List tickets created by a user, optionally scoped to one project,
/// newest first.
pub async fn list_created_by(
    pool: &PgPool,
    user_id: &Uuid,
    project_id: Option<Uuid>,
) -> Result<Vec<TicketDetail>, TrackerError> {
    let sql = format!(
        "{DETAIL_SELECT} \
         WHERE t.created_by = $1 AND ($2::uuid IS NULL OR t.project_id = $2) \
         ORDER BY t.created_at DESC"
    );
    let rows = sqlx::query_as::<_, TicketDetail>(&sql)
        .bind(user_id)
        .bind(project_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Tickets created by the requester, partitioned into the kanban columns.
pub async fn kanban(
    pool: &PgPool,
    requester: &Uuid,
    project_id: Option<Uuid>,
) -> Result<KanbanBoard, TrackerError> {
    let tickets = list_created_by(pool, requester, project_id).await?;
    Ok(partition_by_status(tickets))
}

/// Change a ticket's status. The new value must be one of the three known
/// statuses; no ownership check is performed.
pub async fn update_status(
    pool: &PgPool,
    id: &Uuid,
    status: &str,
) -> Result<TicketDetail, TrackerError> {
    if TicketStatus::parse(status).is_none() {
        return Err(TrackerError::Validation("Invalid status".into()));
    }

    let updated = sqlx::query("UPDATE tickets SET status = $1, updated_at = now() WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;
    if updated.rows_affected() == 0 {
        return Err(TrackerError::NotFound("Ticket not found".into()));
    }

    fetch_detail(pool, id)
        .await?
        .ok_or_else(|| TrackerError::NotFound("Ticket not found".into()))
}

/// Merge-update a ticket. Supplied fields replace stored ones; enum fields
/// are re-validated. No ownership check is performed.
pub async fn update(
    pool: &PgPool,
    id: &Uuid,
    patch: TicketPatch,
) -> Result<TicketDetail, TrackerError> {
    if let Some(title) = patch.title.as_deref() {
        if title.is_empty() {
            return Err(TrackerError::Validation("Ticket title is required".into()));
        }
    }
    if let Some(priority) = patch.priority.as_deref() {
        validate_priority(priority)?;
    }
    if let Some(status) = patch.status.as_deref() {
        validate_status(status)?;
    }

    let row = fetch_row(pool, id)
        .await?
        .ok_or_else(|| TrackerError::NotFound("Ticket not found".into()))?;

    let title = patch.title.unwrap_or(row.title);
    let description = patch.description.unwrap_or(row.description);
    let priority = patch.priority.unwrap_or(row.priority);
    let status = patch.status.unwrap_or(row.status);
    let assignee_id = patch.assignee_id.unwrap_or(row.assignee_id);
    let due_date = patch.due_date.unwrap_or(row.due_date);

    sqlx::query(
        "UPDATE tickets \
         SET title = $1, description = $2, priority = $3, status = $4, \
             assignee_id = $5, due_date = $6, updated_at = now() \
         WHERE id = $7",
    )
    .bind(title)
    .bind(description)
    .bind(priority)
    .bind(status)
    .bind(assignee_id)
    .bind(due_date)
    .bind(id)
    .execute(pool)
    .await?;

    fetch_detail(pool, id)
        .await?
        .ok_or_else(|| TrackerError::NotFound("Ticket not found".into()))
}

/// Assign a ticket to a user, who must be a member (or owner) of the
/// ticket's project.
pub async fn assign(
    pool: &PgPool,
    id: &Uuid,
    user_id: &Uuid,
) -> Result<TicketDetail, TrackerError> {
    let row = fetch_row(pool, id)
        .await?
        .ok_or_else(|| TrackerError::NotFound("Ticket not found".into()))?;

    if !projects::is_member(pool, &row.project_id, user_id).await? {
        return Err(TrackerError::Validation("User not part of project".into()));
    }

    sqlx::query("UPDATE tickets SET assignee_id = $1, updated_at = now() WHERE id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;

    fetch_detail(pool, id)
        .await?
        .ok_or_else(|| TrackerError::NotFound("Ticket not found".into()))
}

/// Delete a ticket by id. No ownership check is performed.
pub async fn delete(pool: &PgPool, id: &Uuid) -> Result<(), TrackerError> {
    let deleted = sqlx::query("DELETE FROM tickets WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(TrackerError::NotFound("Ticket not found".into()));
    }
    Ok(())
}
