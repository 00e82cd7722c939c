//! Shared types for the restaurant POS
//!
//! Types used by both the server and its HTTP clients: the error system,
//! response envelopes, domain models and the sync event payload.

pub mod client;
pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use http;
pub use message::SyncPayload;
pub use serde::{Deserialize, Serialize};
