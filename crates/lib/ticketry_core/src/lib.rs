//! # ticketry_core
//!
//! Core domain logic for Ticketry.

pub mod auth;
pub mod db;
pub mod migrate;
pub mod models;
pub mod tracker;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
