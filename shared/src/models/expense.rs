//! Expense Invoice Model

use super::invoice::{PaymentMethod, PaymentStatus};
use serde::{Deserialize, Serialize};

/// Expense invoice (rent, utilities, supplies ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ExpenseInvoice {
    pub id: i64,
    /// EXP-{year}-{seq:03}
    pub invoice_number: String,
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
    pub items: Vec<ExpenseItem>,
}

/// Expense line; `tax_amount` is entered as an absolute amount
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ExpenseItem {
    pub id: i64,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub tax_amount: f64,
    pub discount_pct: f64,
    pub discount_amount: f64,
    pub line_total: f64,
}

/// Expense line input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseItemInput {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    #[serde(default)]
    pub tax: f64,
    #[serde(default)]
    pub discount_pct: f64,
}

/// Create expense payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseCreate {
    pub invoice_date: Option<String>,
    pub branch_code: Option<String>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub items: Vec<ExpenseItemInput>,
}
