//! Shared domain types for the marketplace notification services.

pub mod error;
pub mod notification;
pub mod types;
