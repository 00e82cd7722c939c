//! Data models
//!
//! Shared between pos-server and its clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod customer;
pub mod draft;
pub mod employee;
pub mod expense;
pub mod invoice;
pub mod menu;
pub mod payment;
pub mod purchase;
pub mod report;
pub mod settings;
pub mod table;
pub mod user;

// Re-exports
pub use customer::*;
pub use draft::*;
pub use employee::*;
pub use expense::*;
pub use invoice::*;
pub use menu::*;
pub use payment::*;
pub use purchase::*;
pub use report::*;
pub use settings::*;
pub use table::*;
pub use user::*;
