//! Request handlers.

pub mod auth;
pub mod comments;
pub mod dashboard;
pub mod health;
pub mod notifications;
pub mod projects;
pub mod tickets;
pub mod users;

use uuid::Uuid;

use crate::error::AppError;

/// Parse a path/body identifier, failing with the given 400-class message.
/// A malformed id is reported differently from a well-formed but absent one.
pub(crate) fn parse_uuid(value: &str, message: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value).map_err(|_| AppError::Validation(message.to_string()))
}
