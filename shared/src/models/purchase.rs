//! Purchase Invoice Model

use super::invoice::{PaymentMethod, PaymentStatus};
use serde::{Deserialize, Serialize};

/// Purchase invoice (raw material restock)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PurchaseInvoice {
    pub id: i64,
    /// PUR-{year}-{seq:03}
    pub invoice_number: String,
    pub supplier_name: Option<String>,
    pub invoice_date: String,
    pub branch_code: Option<String>,
    pub payment_method: PaymentMethod,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: i64,

    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<PurchaseItem>,
}

/// Purchase line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PurchaseItem {
    pub id: i64,
    pub raw_material_id: i64,
    pub raw_material_name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub tax_amount: f64,
    pub discount_pct: f64,
    pub discount_amount: f64,
    pub line_total: f64,
}

/// Purchase line input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseItemInput {
    pub raw_material_id: i64,
    pub quantity: f64,
    pub unit_price: f64,
    #[serde(default)]
    pub discount_pct: f64,
}

/// Create purchase payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseCreate {
    pub supplier_name: Option<String>,
    /// YYYY-MM-DD, defaults to today
    pub invoice_date: Option<String>,
    pub branch_code: Option<String>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub items: Vec<PurchaseItemInput>,
}
