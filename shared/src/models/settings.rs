//! Company Settings Model

use serde::{Deserialize, Serialize};

/// Company / receipt settings (singleton row)
///
/// The supervisor password hash lives in the same row but is never part of
/// this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Settings {
    pub company_name: String,
    /// VAT registration number (printed on receipts and in the ZATCA QR)
    pub tax_number: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// VAT percentage, default tax % for new drafts
    pub vat_rate: f64,
    pub currency: String,
    pub logo_url: Option<String>,
    /// 80 or 58 (mm)
    pub receipt_paper_width: i32,
    pub receipt_margin_top_mm: i32,
    pub receipt_margin_bottom_mm: i32,
    pub receipt_margin_left_mm: i32,
    pub receipt_margin_right_mm: i32,
    pub receipt_font_size: i32,
    pub receipt_show_logo: bool,
    pub receipt_show_tax_number: bool,
    pub receipt_footer_text: String,
    pub updated_at: i64,
}

/// Update settings payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub company_name: Option<String>,
    pub tax_number: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub vat_rate: Option<f64>,
    pub currency: Option<String>,
    pub logo_url: Option<String>,
    pub receipt_paper_width: Option<i32>,
    pub receipt_margin_top_mm: Option<i32>,
    pub receipt_margin_bottom_mm: Option<i32>,
    pub receipt_margin_left_mm: Option<i32>,
    pub receipt_margin_right_mm: Option<i32>,
    pub receipt_font_size: Option<i32>,
    pub receipt_show_logo: Option<bool>,
    pub receipt_show_tax_number: Option<bool>,
    pub receipt_footer_text: Option<String>,
    /// Branch code -> display label
    #[serde(default)]
    pub branch_labels: Vec<BranchLabel>,
}

/// Branch display label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchLabel {
    pub code: String,
    pub label: String,
}

/// Branch (restaurant location)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Branch {
    pub code: String,
    pub label: String,
    pub sort_order: i32,
}

/// Change the supervisor password
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorPasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// POS supervisor check (`POST /api/sales/void-check`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorCheck {
    pub password: String,
}

/// Supervisor check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorCheckResult {
    pub ok: bool,
}
