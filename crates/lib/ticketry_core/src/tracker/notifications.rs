//! Notification records and best-effort fan-out.
//!
//! Notifications are a UX affordance, not a system of record: they are
//! written on a spawned task after the triggering mutation, and a failed
//! write is logged and swallowed, never surfaced to the caller.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use super::TrackerError;
use crate::uuid::uuidv7;

/// The closed set of notification kinds stored in the database. `as_str`
/// is the stored and wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    TicketCreated,
    TicketAssigned,
    TicketComment,
    TicketStatusChanged,
    ProjectMemberAdded,
    ProjectCreated,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::TicketCreated => "ticket_created",
            NotificationKind::TicketAssigned => "ticket_assigned",
            NotificationKind::TicketComment => "ticket_comment",
            NotificationKind::TicketStatusChanged => "ticket_status_changed",
            NotificationKind::ProjectMemberAdded => "project_member_added",
            NotificationKind::ProjectCreated => "project_created",
        }
    }
}

/// A domain event that produces one notification document.
///
/// Each variant carries exactly the fields its message template needs, so
/// adding a kind forces the match arms below to be extended.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    /// A ticket was assigned to someone other than the actor.
    TicketAssigned {
        recipient: Uuid,
        ticket_id: Uuid,
        project_id: Uuid,
        ticket_title: String,
        actor: Uuid,
    },
    /// Someone commented on a ticket. `own_ticket` selects the wording for
    /// the ticket creator versus the assignee.
    TicketComment {
        recipient: Uuid,
        ticket_id: Uuid,
        project_id: Uuid,
        ticket_title: String,
        own_ticket: bool,
        actor: Uuid,
    },
    /// A member was removed from a project. Recorded under the
    /// `project_member_added` kind; existing clients key off that value.
    MemberRemoved {
        recipient: Uuid,
        project_id: Uuid,
        project_title: String,
        actor: Uuid,
    },
}

impl NotificationEvent {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationEvent::TicketAssigned { .. } => NotificationKind::TicketAssigned,
            NotificationEvent::TicketComment { .. } => NotificationKind::TicketComment,
            NotificationEvent::MemberRemoved { .. } => NotificationKind::ProjectMemberAdded,
        }
    }

    pub fn message(&self) -> String {
        match self {
            NotificationEvent::TicketAssigned { ticket_title, .. } => {
                format!("You were assigned to ticket: {ticket_title}")
            }
            NotificationEvent::TicketComment {
                ticket_title,
                own_ticket: true,
                ..
            } => format!("New comment on your ticket: {ticket_title}"),
            NotificationEvent::TicketComment {
                ticket_title,
                own_ticket: false,
                ..
            } => format!("New comment on ticket: {ticket_title}"),
            NotificationEvent::MemberRemoved { project_title, .. } => {
                format!("You were added to project: {project_title}")
            }
        }
    }

    pub fn recipient(&self) -> Uuid {
        match self {
            NotificationEvent::TicketAssigned { recipient, .. }
            | NotificationEvent::TicketComment { recipient, .. }
            | NotificationEvent::MemberRemoved { recipient, .. } => *recipient,
        }
    }

    pub fn actor(&self) -> Uuid {
        match self {
            NotificationEvent::TicketAssigned { actor, .. }
            | NotificationEvent::TicketComment { actor, .. }
            | NotificationEvent::MemberRemoved { actor, .. } => *actor,
        }
    }

    fn refs(&self) -> (Option<Uuid>, Option<Uuid>) {
        match self {
            NotificationEvent::TicketAssigned {
                ticket_id,
                project_id,
                ..
            }
            | NotificationEvent::TicketComment {
                ticket_id,
                project_id,
                ..
            } => (Some(*ticket_id), Some(*project_id)),
            NotificationEvent::MemberRemoved { project_id, .. } => (None, Some(*project_id)),
        }
    }
}

/// Notification with the acting user populated.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationDetail {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub kind: String,
    pub message: String,
    pub ticket_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub read: bool,
    pub created_by: Uuid,
    pub actor_name: String,
    pub actor_email: String,
    pub created_at: DateTime<Utc>,
}

/// Insert one notification document for the event.
pub async fn record(pool: &PgPool, event: &NotificationEvent) -> Result<(), sqlx::Error> {
    let (ticket_id, project_id) = event.refs();
    sqlx::query(
        "INSERT INTO notifications (id, recipient_id, kind, message, ticket_id, project_id, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(uuidv7())
    .bind(event.recipient())
    .bind(event.kind().as_str())
    .bind(event.message())
    .bind(ticket_id)
    .bind(project_id)
    .bind(event.actor())
    .execute(pool)
    .await?;
    Ok(())
}

/// Fire-and-forget dispatch: the insert runs on a spawned task and a failure
/// never propagates to the triggering mutation.
pub fn dispatch(pool: &PgPool, event: NotificationEvent) {
    let pool = pool.clone();
    tokio::spawn(async move {
        if let Err(e) = record(&pool, &event).await {
            warn!(error = %e, kind = event.kind().as_str(), "failed to record notification");
        }
    });
}

const DETAIL_SELECT: &str = "SELECT n.id, n.recipient_id, n.kind, n.message, n.ticket_id, \
       n.project_id, n.read, n.created_by, \
       u.name AS actor_name, u.email AS actor_email, \
       n.created_at \
     FROM notifications n \
     JOIN users u ON u.id = n.created_by";

async fn fetch_detail(pool: &PgPool, id: &Uuid) -> Result<Option<NotificationDetail>, sqlx::Error> {
    let sql = format!("{DETAIL_SELECT} WHERE n.id = $1");
    sqlx::query_as::<_, NotificationDetail>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// List a user's notifications, newest first, capped at `limit`, plus the
/// independently computed unread count.
pub async fn list_for_user(
    pool: &PgPool,
    requester: &Uuid,
    limit: i64,
) -> Result<(Vec<NotificationDetail>, i64), TrackerError> {
    // A negative limit is a Postgres error; treat it as "no results".
    let limit = limit.max(0);
    let sql = format!("{DETAIL_SELECT} WHERE n.recipient_id = $1 ORDER BY n.created_at DESC LIMIT $2");
    let notifications = sqlx::query_as::<_, NotificationDetail>(&sql)
        .bind(requester)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    let unread = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND read = false",
    )
    .bind(requester)
    .fetch_one(pool)
    .await?;

    Ok((notifications, unread))
}

/// Mark a notification read. Recipient only.
pub async fn mark_read(
    pool: &PgPool,
    id: &Uuid,
    requester: &Uuid,
) -> Result<NotificationDetail, TrackerError> {
    let detail = fetch_detail(pool, id)
        .await?
        .ok_or_else(|| TrackerError::NotFound("Notification not found".into()))?;

    if detail.recipient_id != *requester {
        return Err(TrackerError::Forbidden("Access denied".into()));
    }

    sqlx::query("UPDATE notifications SET read = true WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(NotificationDetail {
        read: true,
        ..detail
    })
}

/// Mark all of a user's unread notifications read.
pub async fn mark_all_read(pool: &PgPool, requester: &Uuid) -> Result<(), TrackerError> {
    sqlx::query("UPDATE notifications SET read = true WHERE recipient_id = $1 AND read = false")
        .bind(requester)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a notification. Recipient only.
pub async fn delete(pool: &PgPool, id: &Uuid, requester: &Uuid) -> Result<(), TrackerError> {
    let detail = fetch_detail(pool, id)
        .await?
        .ok_or_else(|| TrackerError::NotFound("Notification not found".into()))?;

    if detail.recipient_id != *requester {
        return Err(TrackerError::Forbidden("Access denied".into()));
    }

    sqlx::query("DELETE FROM notifications WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
