//! Report Models (read-only projections)

use serde::{Deserialize, Serialize};

/// Reporting period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    Today,
    ThisWeek,
    #[default]
    ThisMonth,
    ThisYear,
    Custom,
}

impl ReportPeriod {
    /// Lenient parse; unknown values fall back to this month
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(str::trim) {
            Some("today") => Self::Today,
            Some("this_week") => Self::ThisWeek,
            Some("this_year") => Self::ThisYear,
            Some("custom") => Self::Custom,
            _ => Self::ThisMonth,
        }
    }
}

/// Common report query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    pub period: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// `all` or a branch code
    pub branch: Option<String>,
}

/// Resolved inclusive date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRange {
    pub period: ReportPeriod,
    pub start_date: String,
    pub end_date: String,
    pub branch: Option<String>,
}

/// Sales total for a branch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchSales {
    pub branch_code: String,
    pub label: String,
    pub total: f64,
    pub invoice_count: i64,
}

/// Daily sales point
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DailySales {
    pub date: String,
    pub total: f64,
}

/// Payment method usage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PaymentMethodCount {
    pub payment_method: String,
    pub count: i64,
    pub total: f64,
}

/// Best seller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TopProduct {
    pub product_name: String,
    pub quantity: i64,
    pub revenue: f64,
}

/// Low stock raw material
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LowStockItem {
    pub id: i64,
    pub name: String,
    pub unit: String,
    pub stock_quantity: f64,
}

/// Cash movement over the range
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CashFlow {
    pub inflow: f64,
    pub outflow: f64,
    pub net: f64,
}

/// `GET /api/reports/summary`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub range: ReportRange,
    pub sales_by_branch: Vec<BranchSales>,
    pub total_sales: f64,
    pub total_purchases: f64,
    pub total_expenses: f64,
    pub total_salaries: f64,
    pub profit: f64,
    pub daily_sales: Vec<DailySales>,
    pub payment_methods: Vec<PaymentMethodCount>,
    pub cash_flow: CashFlow,
    pub top_products: Vec<TopProduct>,
    pub low_stock: Vec<LowStockItem>,
}

/// One invoice-like row in a tabular report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ReportRow {
    pub id: i64,
    pub invoice_number: String,
    pub invoice_date: String,
    pub branch_code: Option<String>,
    /// Customer (sales) or supplier (purchases)
    pub party: Option<String>,
    pub payment_method: String,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub payment_status: String,
}

/// Totals over report rows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportTotals {
    pub count: usize,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
    pub paid_amount: f64,
}

/// Sales / purchases / expenses report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabularReport {
    pub range: ReportRange,
    pub rows: Vec<ReportRow>,
    pub totals: ReportTotals,
}

/// Payroll report query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayrollReportQuery {
    /// YYYY-MM
    pub from: Option<String>,
    /// YYYY-MM
    pub to: Option<String>,
    /// Comma separated ids
    pub employee_ids: Option<String>,
}

/// Salary figures, shared by per-employee rows and grand totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayrollAmounts {
    pub basic: f64,
    pub allowances: f64,
    pub deductions: f64,
    pub previous_due: f64,
    pub total: f64,
    pub paid: f64,
    pub remaining: f64,
}

/// Per-employee payroll summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollEmployeeRow {
    pub employee_id: i64,
    pub employee_code: String,
    pub full_name: String,
    pub department: Option<String>,
    #[serde(flatten)]
    pub amounts: PayrollAmounts,
    /// Months with remaining > 0.01
    pub unpaid_months: usize,
}

/// `GET /api/reports/payroll`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollReport {
    pub from: String,
    pub to: String,
    pub rows: Vec<PayrollEmployeeRow>,
    pub totals: PayrollAmounts,
}

/// Month row of an employee payroll statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollMonthRow {
    /// YYYY-MM
    pub month: String,
    pub salary_id: i64,
    pub status: super::employee::SalaryStatus,
    #[serde(flatten)]
    pub amounts: PayrollAmounts,
}

/// `GET /api/reports/payroll/{employee_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollStatement {
    pub employee_id: i64,
    pub employee_code: String,
    pub full_name: String,
    pub from: String,
    pub to: String,
    pub months: Vec<PayrollMonthRow>,
    pub totals: PayrollAmounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_period_falls_back_to_this_month() {
        assert_eq!(ReportPeriod::parse(Some("yesterday")), ReportPeriod::ThisMonth);
        assert_eq!(ReportPeriod::parse(None), ReportPeriod::ThisMonth);
        assert_eq!(ReportPeriod::parse(Some("this_week")), ReportPeriod::ThisWeek);
        assert_eq!(ReportPeriod::parse(Some("custom")), ReportPeriod::Custom);
    }
}
