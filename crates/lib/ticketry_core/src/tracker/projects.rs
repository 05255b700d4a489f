//! Project persistence and membership rules.
//!
//! The owner is inserted into the member set at creation, so "owner or
//! member" checks and plain member listings both see them. The owner can
//! never be removed through `remove_member`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::notifications::{self, NotificationEvent};
use super::{TrackerError, UserRef};
use crate::uuid::uuidv7;

/// Row returned by project queries.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A project with owner and members populated.
#[derive(Debug, Clone)]
pub struct ProjectDetail {
    pub project: ProjectRow,
    pub owner: UserRef,
    pub members: Vec<UserRef>,
}

/// Partial update for a project. `None` or an empty string leaves the
/// existing value in place.
#[derive(Debug, Default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

async fn fetch_row(pool: &PgPool, id: &Uuid) -> Result<Option<ProjectRow>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRow>(
        "SELECT id, title, description, owner_id, created_at, updated_at \
         FROM projects WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

async fn fetch_members(pool: &PgPool, id: &Uuid) -> Result<Vec<UserRef>, sqlx::Error> {
    sqlx::query_as::<_, UserRef>(
        "SELECT u.id, u.name, u.email \
         FROM project_members m \
         JOIN users u ON u.id = m.user_id \
         WHERE m.project_id = $1 \
         ORDER BY m.added_at ASC, u.id ASC",
    )
    .bind(id)
    .fetch_all(pool)
    .await
}

/// Populate owner and members for a project row.
async fn populate(pool: &PgPool, row: ProjectRow) -> Result<ProjectDetail, TrackerError> {
    let owner = sqlx::query_as::<_, UserRef>("SELECT id, name, email FROM users WHERE id = $1")
        .bind(row.owner_id)
        .fetch_one(pool)
        .await?;
    let members = fetch_members(pool, &row.id).await?;
    Ok(ProjectDetail {
        project: row,
        owner,
        members,
    })
}

/// True if the user is the project owner or appears in its member set.
pub async fn is_member(
    pool: &PgPool,
    project_id: &Uuid,
    user_id: &Uuid,
) -> Result<bool, TrackerError> {
    let member = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS( \
           SELECT 1 FROM projects p \
           WHERE p.id = $1 \
             AND (p.owner_id = $2 \
               OR EXISTS(SELECT 1 FROM project_members m \
                         WHERE m.project_id = p.id AND m.user_id = $2)))",
    )
    .bind(project_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(member)
}

/// Create a project. The requester becomes owner and sole initial member.
pub async fn create(
    pool: &PgPool,
    requester: &Uuid,
    title: &str,
    description: Option<&str>,
) -> Result<ProjectDetail, TrackerError> {
    if title.is_empty() {
        return Err(TrackerError::Validation("Project title is required".into()));
    }

    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, ProjectRow>(
        "INSERT INTO projects (id, title, description, owner_id) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, title, description, owner_id, created_at, updated_at",
    )
    .bind(uuidv7())
    .bind(title)
    .bind(description)
    .bind(requester)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO project_members (project_id, user_id) VALUES ($1, $2)")
        .bind(row.id)
        .bind(requester)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    populate(pool, row).await
}

/// List all projects the requester owns or is a member of, newest first.
pub async fn list_for_user(
    pool: &PgPool,
    requester: &Uuid,
) -> Result<Vec<ProjectDetail>, TrackerError> {
    let rows = sqlx::query_as::<_, ProjectRow>(
        "SELECT p.id, p.title, p.description, p.owner_id, p.created_at, p.updated_at \
         FROM projects p \
         WHERE p.owner_id = $1 \
            OR EXISTS(SELECT 1 FROM project_members m \
                      WHERE m.project_id = p.id AND m.user_id = $1) \
         ORDER BY p.created_at DESC",
    )
    .bind(requester)
    .fetch_all(pool)
    .await?;

    let mut projects = Vec::with_capacity(rows.len());
    for row in rows {
        projects.push(populate(pool, row).await?);
    }
    Ok(projects)
}

/// Get a single project. Fails with `NotFound` for an absent id and
/// `Forbidden` when the requester is neither owner nor member.
pub async fn get(
    pool: &PgPool,
    id: &Uuid,
    requester: &Uuid,
) -> Result<ProjectDetail, TrackerError> {
    let row = fetch_row(pool, id)
        .await?
        .ok_or_else(|| TrackerError::NotFound("Project not found".into()))?;

    if !is_member(pool, id, requester).await? {
        return Err(TrackerError::Forbidden("Access denied".into()));
    }

    populate(pool, row).await
}

/// Update title/description. Owner only.
pub async fn update(
    pool: &PgPool,
    id: &Uuid,
    requester: &Uuid,
    patch: ProjectPatch,
) -> Result<ProjectDetail, TrackerError> {
    let row = fetch_row(pool, id)
        .await?
        .ok_or_else(|| TrackerError::NotFound("Project not found".into()))?;

    if row.owner_id != *requester {
        return Err(TrackerError::Forbidden(
            "Only owner can update project".into(),
        ));
    }

    let title = match patch.title {
        Some(t) if !t.is_empty() => t,
        _ => row.title,
    };
    let description = match patch.description {
        Some(d) if !d.is_empty() => Some(d),
        _ => row.description,
    };

    let row = sqlx::query_as::<_, ProjectRow>(
        "UPDATE projects SET title = $1, description = $2, updated_at = now() \
         WHERE id = $3 \
         RETURNING id, title, description, owner_id, created_at, updated_at",
    )
    .bind(title)
    .bind(description)
    .bind(id)
    .fetch_one(pool)
    .await?;

    populate(pool, row).await
}

/// Delete a project. Owner only. Tickets and comments are left in place.
pub async fn delete(pool: &PgPool, id: &Uuid, requester: &Uuid) -> Result<(), TrackerError> {
    let row = fetch_row(pool, id)
        .await?
        .ok_or_else(|| TrackerError::NotFound("Project not found".into()))?;

    if row.owner_id != *requester {
        return Err(TrackerError::Forbidden(
            "Only owner can delete project".into(),
        ));
    }

    sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Add a member. Owner only; adding an existing member is rejected.
pub async fn add_member(
    pool: &PgPool,
    id: &Uuid,
    requester: &Uuid,
    user_id: &Uuid,
) -> Result<ProjectDetail, TrackerError> {
    let row = fetch_row(pool, id)
        .await?
        .ok_or_else(|| TrackerError::NotFound("Project not found".into()))?;

    if row.owner_id != *requester {
        return Err(TrackerError::Forbidden("Only owner can add members".into()));
    }

    let user_exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    if !user_exists {
        return Err(TrackerError::NotFound("User not found".into()));
    }

    let already = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM project_members WHERE project_id = $1 AND user_id = $2)",
    )
    .bind(id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    if already {
        return Err(TrackerError::Validation("User already a member".into()));
    }

    sqlx::query("INSERT INTO project_members (project_id, user_id) VALUES ($1, $2)")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    populate(pool, row).await
}

/// Remove a member. Owner only; the owner themselves cannot be removed.
pub async fn remove_member(
    pool: &PgPool,
    id: &Uuid,
    requester: &Uuid,
    user_id: &Uuid,
) -> Result<ProjectDetail, TrackerError> {
    let row = fetch_row(pool, id)
        .await?
        .ok_or_else(|| TrackerError::NotFound("Project not found".into()))?;

    if row.owner_id != *requester {
        return Err(TrackerError::Forbidden(
            "Only owner can remove members".into(),
        ));
    }

    if *user_id == row.owner_id {
        return Err(TrackerError::Validation(
            "Cannot remove project owner".into(),
        ));
    }

    sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    notifications::dispatch(
        pool,
        NotificationEvent::MemberRemoved {
            recipient: *user_id,
            project_id: row.id,
            project_title: row.title.clone(),
            actor: *requester,
        },
    );

    populate(pool, row).await
}
