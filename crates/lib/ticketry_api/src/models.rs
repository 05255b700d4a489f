//! Request and response bodies.
//!
//! All JSON field names are camelCase. Success envelopes carry a `success`
//! flag next to the payload; errors are rendered by `AppError` as
//! `{"message": ...}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use ticketry_core::tracker::comments::CommentDetail;
use ticketry_core::tracker::dashboard::{DayCount, StatusCounts};
use ticketry_core::tracker::notifications::NotificationDetail;
use ticketry_core::tracker::projects::ProjectDetail;
use ticketry_core::tracker::tickets::{KanbanBoard, TicketDetail};
use ticketry_core::tracker::UserRef;

/// Distinguishes "field absent" from "field explicitly null" in PATCH-style
/// bodies: absent = keep, null = clear.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
    pub user: UserRef,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

// ---------------------------------------------------------------------------
// Shared envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub success: bool,
    pub users: Vec<UserRef>,
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDto {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub owner: UserRef,
    pub members: Vec<UserRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProjectDetail> for ProjectDto {
    fn from(detail: ProjectDetail) -> Self {
        Self {
            id: detail.project.id,
            title: detail.project.title,
            description: detail.project.description,
            owner: detail.owner,
            members: detail.members,
            created_at: detail.project.created_at,
            updated_at: detail.project.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub success: bool,
    pub project: ProjectDto,
}

impl From<ProjectDetail> for ProjectResponse {
    fn from(detail: ProjectDetail) -> Self {
        Self {
            success: true,
            project: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub success: bool,
    pub projects: Vec<ProjectDto>,
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub project_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub assignee: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub assignee: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectScopeQuery {
    pub project_id: Option<String>,
}

impl ProjectScopeQuery {
    /// A malformed project id in the query string is ignored, not rejected.
    pub fn project_filter(&self) -> Option<Uuid> {
        self.project_id
            .as_deref()
            .and_then(|s| Uuid::parse_str(s).ok())
    }
}

/// Project reference on a ticket: the id plus the title when the project
/// still exists (tickets survive project deletion).
#[derive(Debug, Serialize)]
pub struct ProjectRef {
    pub id: Uuid,
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub project: ProjectRef,
    pub assignee: Option<UserRef>,
    pub created_by: UserRef,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TicketDetail> for TicketDto {
    fn from(t: TicketDetail) -> Self {
        let assignee = match (t.assignee_id, t.assignee_name, t.assignee_email) {
            (Some(id), Some(name), Some(email)) => Some(UserRef { id, name, email }),
            _ => None,
        };
        Self {
            id: t.id,
            title: t.title,
            description: t.description,
            priority: t.priority,
            status: t.status,
            project: ProjectRef {
                id: t.project_id,
                title: t.project_title,
            },
            assignee,
            created_by: UserRef {
                id: t.created_by,
                name: t.creator_name,
                email: t.creator_email,
            },
            due_date: t.due_date,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub success: bool,
    pub ticket: TicketDto,
}

impl From<TicketDetail> for TicketResponse {
    fn from(detail: TicketDetail) -> Self {
        Self {
            success: true,
            ticket: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketListResponse {
    pub success: bool,
    pub tickets: Vec<TicketDto>,
}

/// Kanban board keyed by the literal status values.
#[derive(Debug, Serialize)]
pub struct KanbanResponse {
    #[serde(rename = "Todo")]
    pub todo: Vec<TicketDto>,
    #[serde(rename = "InProgress")]
    pub in_progress: Vec<TicketDto>,
    #[serde(rename = "Done")]
    pub done: Vec<TicketDto>,
}

impl From<KanbanBoard> for KanbanResponse {
    fn from(board: KanbanBoard) -> Self {
        Self {
            todo: board.todo.into_iter().map(Into::into).collect(),
            in_progress: board.in_progress.into_iter().map(Into::into).collect(),
            done: board.done.into_iter().map(Into::into).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub ticket_id: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: Uuid,
    pub ticket: Uuid,
    pub author: UserRef,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentDetail> for CommentDto {
    fn from(c: CommentDetail) -> Self {
        Self {
            id: c.id,
            ticket: c.ticket_id,
            author: UserRef {
                id: c.author_id,
                name: c.author_name,
                email: c.author_email,
            },
            text: c.text,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub success: bool,
    pub comment: CommentDto,
}

impl From<CommentDetail> for CommentResponse {
    fn from(detail: CommentDetail) -> Self {
        Self {
            success: true,
            comment: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub success: bool,
    pub comments: Vec<CommentDto>,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct NotificationQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    pub id: Uuid,
    pub kind: String,
    pub message: String,
    pub ticket: Option<Uuid>,
    pub project: Option<Uuid>,
    pub read: bool,
    pub created_by: UserRef,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationDetail> for NotificationDto {
    fn from(n: NotificationDetail) -> Self {
        Self {
            id: n.id,
            kind: n.kind,
            message: n.message,
            ticket: n.ticket_id,
            project: n.project_id,
            read: n.read,
            created_by: UserRef {
                id: n.created_by,
                name: n.actor_name,
                email: n.actor_email,
            },
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListResponse {
    pub success: bool,
    pub notifications: Vec<NotificationDto>,
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub success: bool,
    pub notification: NotificationDto,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_tickets: i64,
    pub todo_tickets: i64,
    pub in_progress: i64,
    pub completed: i64,
}

impl From<StatusCounts> for StatsResponse {
    fn from(c: StatusCounts) -> Self {
        Self {
            total_tickets: c.total,
            todo_tickets: c.todo,
            in_progress: c.in_progress,
            completed: c.done,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LinePoint {
    /// Display label, e.g. "Aug 29".
    pub date: String,
    pub tickets: i64,
}

impl From<DayCount> for LinePoint {
    fn from(d: DayCount) -> Self {
        Self {
            date: d.date.format("%b %-d").to_string(),
            tickets: d.tickets,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BarPoint {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartResponse {
    pub line_chart: Vec<LinePoint>,
    pub bar_chart: Vec<BarPoint>,
}
