//! Customer Model

use serde::{Deserialize, Serialize};

/// Customer entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    /// Default discount % applied to new drafts
    pub discount_percent: f64,
    pub is_active: bool,
    pub created_at: i64,
}

/// Create customer payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerCreate {
    pub name: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub discount_percent: f64,
}

/// Update customer payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub discount_percent: Option<f64>,
    pub is_active: Option<bool>,
}
