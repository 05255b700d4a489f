//! Service-layer logic sitting between handlers and `ticketry_core`.

pub mod auth;
