//! Sales Invoice Model

use super::draft::DraftItemInput;
use super::payment::Payment;
use super::settings::Settings;
use serde::{Deserialize, Serialize};

/// Payment method
///
/// Checkout only accepts `CASH` and `CARD`; the rest appear on purchases,
/// expenses and manual payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "UPPERCASE"))]
pub enum PaymentMethod {
    #[serde(alias = "cash")]
    Cash,
    #[serde(alias = "card")]
    Card,
    #[serde(alias = "mada")]
    Mada,
    #[serde(alias = "visa")]
    Visa,
    #[serde(alias = "mastercard")]
    Mastercard,
    #[serde(alias = "bank")]
    Bank,
    #[serde(alias = "aks")]
    Aks,
    #[serde(alias = "gcc")]
    Gcc,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Card => "CARD",
            Self::Mada => "MADA",
            Self::Visa => "VISA",
            Self::Mastercard => "MASTERCARD",
            Self::Bank => "BANK",
            Self::Aks => "AKS",
            Self::Gcc => "GCC",
        }
    }

    /// Methods accepted at the POS checkout
    pub fn is_pos_checkout(&self) -> bool {
        matches!(self, Self::Cash | Self::Card)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Print confirmation state of a sales invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PrintStatus {
    Pending,
    Confirmed,
    Void,
}

/// Settlement state (sales / purchase / expense)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Partial => "partial",
            Self::Paid => "paid",
        }
    }
}

/// Sales invoice entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SalesInvoice {
    pub id: i64,
    /// SAL-{year}-{seq:03}
    pub invoice_number: String,
    /// YYYY-MM-DD (business timezone)
    pub invoice_date: String,
    pub branch_code: String,
    pub table_number: Option<i64>,
    pub draft_id: Option<i64>,
    pub draft_version: Option<i64>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_method: PaymentMethod,
    pub subtotal: f64,
    pub tax_pct: f64,
    pub tax_amount: f64,
    pub discount_pct: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub payment_status: PaymentStatus,
    pub print_status: PrintStatus,
    pub void_reason: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: i64,
    pub confirmed_at: Option<i64>,
    pub voided_at: Option<i64>,
}

/// Sales invoice line snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SalesInvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    pub meal_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub line_subtotal: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub line_total: f64,
}

/// Checkout an existing draft (`POST /api/drafts/{id}/checkout`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub discount_pct: Option<f64>,
    pub tax_pct: Option<f64>,
}

/// Checkout without a saved draft (`POST /api/sales/checkout`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectCheckoutRequest {
    pub branch_code: String,
    pub table_number: Option<i64>,
    pub items: Vec<DraftItemInput>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub discount_pct: Option<f64>,
    pub tax_pct: Option<f64>,
    pub payment_method: PaymentMethod,
}

/// Checkout result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub invoice_id: i64,
    pub invoice_number: String,
    pub print_url: String,
    pub payment_method: PaymentMethod,
    pub total_amount: f64,
}

/// Void payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceVoid {
    pub supervisor_password: Option<String>,
    pub reason: Option<String>,
}

/// Invoice list filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceQuery {
    pub branch: Option<String>,
    pub status: Option<PrintStatus>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Invoice with lines and payments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: SalesInvoice,
    pub items: Vec<SalesInvoiceItem>,
    pub payments: Vec<Payment>,
}

/// Printable receipt document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub settings: Settings,
    pub branch_label: String,
    pub invoice: SalesInvoice,
    pub items: Vec<SalesInvoiceItem>,
    /// Base64 TLV payload for the e-invoice QR code
    pub qr_base64: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_method_accepts_lowercase() {
        let m: PaymentMethod = serde_json::from_str("\"card\"").unwrap();
        assert_eq!(m, PaymentMethod::Card);
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"CARD\"");
    }

    #[test]
    fn only_cash_and_card_checkout() {
        assert!(PaymentMethod::Cash.is_pos_checkout());
        assert!(PaymentMethod::Card.is_pos_checkout());
        assert!(!PaymentMethod::Mada.is_pos_checkout());
    }
}
