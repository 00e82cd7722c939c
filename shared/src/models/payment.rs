//! Payment Model

use super::invoice::PaymentMethod;
use serde::{Deserialize, Serialize};

/// Which document a payment settles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum InvoiceType {
    Sales,
    Purchase,
    Expense,
    Salary,
}

impl InvoiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Purchase => "purchase",
            Self::Expense => "expense",
            Self::Salary => "salary",
        }
    }
}

/// Payment record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub invoice_type: InvoiceType,
    pub invoice_id: i64,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub paid_at: i64,
    pub note: Option<String>,
    pub created_by: Option<i64>,
    /// Set when the sales invoice was voided
    pub is_reversed: bool,
}

/// Manual payment (`POST /api/payments`)
///
/// Salary payments go through `/api/payroll/pay` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreate {
    pub invoice_id: i64,
    pub invoice_type: InvoiceType,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
}

/// Payment list filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentQuery {
    pub invoice_type: Option<InvoiceType>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Settled state after a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResult {
    pub payment: Payment,
    pub paid_amount: f64,
    pub payment_status: super::invoice::PaymentStatus,
}
