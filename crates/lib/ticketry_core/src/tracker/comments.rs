//! Comment persistence and the comment notification fan-out.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::notifications::{self, NotificationEvent};
use super::tickets;
use super::TrackerError;
use crate::uuid::uuidv7;

/// Comment with its author populated.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentDetail {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_email: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const DETAIL_SELECT: &str = "SELECT c.id, c.ticket_id, c.author_id, \
       u.name AS author_name, u.email AS author_email, \
       c.text, c.created_at, c.updated_at \
     FROM comments c \
     JOIN users u ON u.id = c.author_id";

/// Who gets notified about a new comment: the ticket assignee (unless they
/// are the commenter), then the ticket creator (unless they are the
/// commenter or already covered as the assignee). At most two recipients,
/// never the same user twice. The bool marks the ticket creator, whose
/// notification is worded differently.
pub fn comment_recipients(
    assignee: Option<Uuid>,
    created_by: Uuid,
    commenter: Uuid,
) -> Vec<(Uuid, bool)> {
    let mut recipients = Vec::new();
    if let Some(assignee) = assignee {
        if assignee != commenter {
            recipients.push((assignee, false));
        }
    }
    if created_by != commenter && Some(created_by) != assignee {
        recipients.push((created_by, true));
    }
    recipients
}

async fn fetch_detail(pool: &PgPool, id: &Uuid) -> Result<Option<CommentDetail>, sqlx::Error> {
    let sql = format!("{DETAIL_SELECT} WHERE c.id = $1");
    sqlx::query_as::<_, CommentDetail>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Create a comment on a ticket and fan out `ticket_comment` notifications.
pub async fn create(
    pool: &PgPool,
    requester: &Uuid,
    ticket_id: &Uuid,
    text: &str,
) -> Result<CommentDetail, TrackerError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TrackerError::Validation("Comment text is required".into()));
    }

    let ticket = sqlx::query_as::<_, tickets::TicketRow>(
        "SELECT id, title, description, priority, status, project_id, assignee_id, \
                created_by, due_date, created_at, updated_at \
         FROM tickets WHERE id = $1",
    )
    .bind(ticket_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| TrackerError::NotFound("Ticket not found".into()))?;

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO comments (id, ticket_id, author_id, text) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id",
    )
    .bind(uuidv7())
    .bind(ticket_id)
    .bind(requester)
    .bind(text)
    .fetch_one(pool)
    .await?;

    for (recipient, own_ticket) in
        comment_recipients(ticket.assignee_id, ticket.created_by, *requester)
    {
        notifications::dispatch(
            pool,
            NotificationEvent::TicketComment {
                recipient,
                ticket_id: ticket.id,
                project_id: ticket.project_id,
                ticket_title: ticket.title.clone(),
                own_ticket,
                actor: *requester,
            },
        );
    }

    fetch_detail(pool, &id)
        .await?
        .ok_or_else(|| TrackerError::NotFound("Comment not found".into()))
}

/// List all comments for a ticket, newest first.
pub async fn list_for_ticket(
    pool: &PgPool,
    ticket_id: &Uuid,
) -> Result<Vec<CommentDetail>, TrackerError> {
    let sql = format!("{DETAIL_SELECT} WHERE c.ticket_id = $1 ORDER BY c.created_at DESC");
    let rows = sqlx::query_as::<_, CommentDetail>(&sql)
        .bind(ticket_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Edit a comment. Author only.
pub async fn update(
    pool: &PgPool,
    id: &Uuid,
    requester: &Uuid,
    text: &str,
) -> Result<CommentDetail, TrackerError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TrackerError::Validation("Comment text is required".into()));
    }

    let comment = fetch_detail(pool, id)
        .await?
        .ok_or_else(|| TrackerError::NotFound("Comment not found".into()))?;

    if comment.author_id != *requester {
        return Err(TrackerError::Forbidden(
            "Not authorized to edit this comment".into(),
        ));
    }

    sqlx::query("UPDATE comments SET text = $1, updated_at = now() WHERE id = $2")
        .bind(text)
        .bind(id)
        .execute(pool)
        .await?;

    fetch_detail(pool, id)
        .await?
        .ok_or_else(|| TrackerError::NotFound("Comment not found".into()))
}

/// Delete a comment. Author only.
pub async fn delete(pool: &PgPool, id: &Uuid, requester: &Uuid) -> Result<(), TrackerError> {
    let comment = fetch_detail(pool, id)
        .await?
        .ok_or_else(|| TrackerError::NotFound("Comment not found".into()))?;

    if comment.author_id != *requester {
        return Err(TrackerError::Forbidden(
            "Not authorized to delete this comment".into(),
        ));
    }

    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_assignee_and_creator_both_notified() {
        let assignee = Uuid::now_v7();
        let creator = Uuid::now_v7();
        let commenter = Uuid::now_v7();

        let recipients = comment_recipients(Some(assignee), creator, commenter);
        assert_eq!(recipients, vec![(assignee, false), (creator, true)]);
    }

    #[test]
    fn commenting_assignee_only_notifies_creator() {
        let assignee = Uuid::now_v7();
        let creator = Uuid::now_v7();

        let recipients = comment_recipients(Some(assignee), creator, assignee);
        assert_eq!(recipients, vec![(creator, true)]);
    }

    #[test]
    fn commenting_creator_only_notifies_assignee() {
        let assignee = Uuid::now_v7();
        let creator = Uuid::now_v7();

        let recipients = comment_recipients(Some(assignee), creator, creator);
        assert_eq!(recipients, vec![(assignee, false)]);
    }

    #[test]
    fn creator_who_is_assignee_is_notified_once() {
        let creator = Uuid::now_v7();
        let commenter = Uuid::now_v7();

        let recipients = comment_recipients(Some(creator), creator, commenter);
        assert_eq!(recipients, vec![(creator, false)]);
    }

    #[test]
    fn unassigned_ticket_notifies_creator_only() {
        let creator = Uuid::now_v7();
        let commenter = Uuid::now_v7();

        assert_eq!(
            comment_recipients(None, creator, commenter),
            vec![(creator, true)]
        );
    }

    #[test]
    fn self_comment_on_own_unassigned_ticket_notifies_nobody() {
        let creator = Uuid::now_v7();
        assert!(comment_recipients(None, creator, creator).is_empty());
    }
}
