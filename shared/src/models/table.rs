//! Dining Table / Layout Model

use serde::{Deserialize, Serialize};

/// Dining table entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: i64,
    pub branch_code: String,
    pub table_number: i64,
}

/// Table occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    Available,
    Occupied,
}

/// Table with computed status (`GET /api/tables/{branch}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStatusView {
    pub table_number: i64,
    pub status: TableStatus,
    /// Open (or checked out, awaiting print) draft on this table
    pub draft_id: Option<i64>,
    /// Sales invoice awaiting print confirmation
    pub pending_invoice_id: Option<i64>,
    /// Section name from the saved layout
    pub section: Option<String>,
}

/// One named section; each row is an ordered list of table numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSection {
    pub name: String,
    #[serde(default)]
    pub rows: Vec<Vec<i64>>,
}

/// Branch table layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableLayout {
    #[serde(default)]
    pub sections: Vec<LayoutSection>,
}

impl TableLayout {
    /// All table numbers in layout order
    pub fn table_numbers(&self) -> impl Iterator<Item = i64> + '_ {
        self.sections
            .iter()
            .flat_map(|s| s.rows.iter())
            .flat_map(|r| r.iter().copied())
    }
}
