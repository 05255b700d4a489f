//! Issue tracker domain logic.
//!
//! Projects, tickets, comments, notifications and the dashboard aggregates,
//! each with its authorization rules. Identifiers are validated and required
//! fields checked before any store access; existence checks run before
//! authorization checks.

pub mod comments;
pub mod dashboard;
pub mod notifications;
pub mod projects;
pub mod tickets;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Tracker domain errors.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}

/// A user reference as exposed on populated entities (owner, members,
/// assignee, author, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}
