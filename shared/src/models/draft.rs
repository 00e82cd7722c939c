//! Draft Order Model
//!
//! A draft is the open order attached to a table before checkout.

use super::invoice::PaymentMethod;
use super::settings::Settings;
use serde::{Deserialize, Serialize};

/// Draft lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum DraftStatus {
    Open,
    /// Invoice created, waiting for print confirmation
    CheckedOut,
    Cancelled,
}

/// Draft order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DraftOrder {
    pub id: i64,
    pub branch_code: String,
    pub table_number: i64,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub discount_pct: f64,
    pub tax_pct: f64,
    pub payment_method: Option<String>,
    pub status: DraftStatus,
    /// Bumped on every successful save
    pub version: i64,
    pub created_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,

    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<DraftItem>,
}

/// Draft line (price snapshot resolved by the server)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DraftItem {
    pub meal_id: i64,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub line_total: f64,
}

/// Line input; prices are never taken from the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftItemInput {
    pub meal_id: i64,
    pub quantity: i64,
}

/// Upsert draft payload (`PUT /api/drafts/{branch}/{table}`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftSave {
    #[serde(default)]
    pub items: Vec<DraftItemInput>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub discount_pct: Option<f64>,
    pub tax_pct: Option<f64>,
    pub payment_method: Option<PaymentMethod>,
    /// Optimistic lock; mismatch yields a version conflict
    pub expected_version: Option<i64>,
    pub supervisor_password: Option<String>,
}

/// Cancel draft payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftCancel {
    pub supervisor_password: Option<String>,
}

/// Computed totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
}

/// Draft with totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftView {
    #[serde(flatten)]
    pub draft: DraftOrder,
    pub totals: OrderTotals,
}

/// Result of a draft save; `draft` is `None` when the save emptied it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftSaveResult {
    pub draft: Option<DraftView>,
    pub deleted: bool,
}

/// Pre-bill / kitchen preview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPreview {
    pub settings: Settings,
    pub branch_label: String,
    pub draft: DraftView,
}
