//! 报表 (只读)
//!
//! 所有报表先解析时间范围:
//!
//! | period | 范围 |
//! |--------|------|
//! | today | 今天 |
//! | this_week | 本周一 ~ 周日 |
//! | this_month | 当月 1 日 ~ 月末 (默认) |
//! | this_year | 1 月 1 日 ~ 12 月 31 日 |
//! | custom | start_date ~ end_date，无效时回退 this_month |
//!
//! 日期以业务时区计算，作废发票不计入。

use chrono::{Datelike, NaiveDate};
use shared::models::{
    CashFlow, PayrollAmounts, PayrollEmployeeRow, PayrollMonthRow, PayrollReport, PayrollReportQuery,
    PayrollStatement, ReportPeriod, ReportQuery, ReportRange, ReportRow, ReportTotals, Salary, SummaryReport,
    TabularReport,
};

use crate::billing::money;
use crate::core::ServerState;
use crate::db::repository::report::{self, DateScope};
use crate::db::repository::{employee, raw_material, salary};
use crate::sales::require_branch;
use crate::utils::time;
use crate::utils::types::parse_id_list;
use crate::utils::{AppError, AppResult, ErrorCode};

const TOP_PRODUCTS: i64 = 10;
const LOW_STOCK_ITEMS: i64 = 10;
/// Remaining balance above which a salary month counts as unpaid
const UNPAID_THRESHOLD: f64 = 0.01;

/// Tabular report kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Sales,
    Purchases,
    Expenses,
}

/// Resolve a period into an inclusive date range
pub fn resolve_period(
    period: ReportPeriod,
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> (ReportPeriod, NaiveDate, NaiveDate) {
    match period {
        ReportPeriod::Today => (period, today, today),
        ReportPeriod::ThisWeek => {
            let monday = time::week_start(today);
            (period, monday, monday + chrono::Duration::days(6))
        }
        ReportPeriod::ThisYear => {
            let last = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
            (period, time::year_start(today), last)
        }
        ReportPeriod::Custom => {
            let parsed = start
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
                .zip(end.and_then(|e| NaiveDate::parse_from_str(e.trim(), "%Y-%m-%d").ok()));
            match parsed {
                Some((s, e)) if s <= e => (period, s, e),
                _ => {
                    tracing::debug!(?start, ?end, "Invalid custom range, using this month");
                    resolve_period(ReportPeriod::ThisMonth, None, None, today)
                }
            }
        }
        ReportPeriod::ThisMonth => {
            let last = time::month_end(today.year(), today.month()).unwrap_or(today);
            (ReportPeriod::ThisMonth, time::month_start(today), last)
        }
    }
}

/// Resolve query period and branch filter (`all` / empty → every branch)
pub async fn resolve_range(state: &ServerState, query: &ReportQuery) -> AppResult<ReportRange> {
    let branch = query
        .branch
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty() && *b != "all")
        .map(str::to_string);
    if let Some(code) = &branch {
        require_branch(state, code).await?;
    }

    let (period, start, end) = resolve_period(
        ReportPeriod::parse(query.period.as_deref()),
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        time::today(state.tz()),
    );
    Ok(ReportRange {
        period,
        start_date: start.format("%Y-%m-%d").to_string(),
        end_date: end.format("%Y-%m-%d").to_string(),
        branch,
    })
}

fn scope(range: &ReportRange) -> DateScope<'_> {
    DateScope {
        start_date: &range.start_date,
        end_date: &range.end_date,
        branch: range.branch.as_deref(),
    }
}

fn range_millis(state: &ServerState, range: &ReportRange) -> AppResult<(i64, i64)> {
    let start = time::parse_date(&range.start_date)?;
    let end = time::parse_date(&range.end_date)?;
    Ok((time::day_start_millis(start, state.tz()), time::day_end_millis(end, state.tz())))
}

/// GET /api/reports/summary
pub async fn summary(state: &ServerState, query: ReportQuery) -> AppResult<SummaryReport> {
    let range = resolve_range(state, &query).await?;
    let pool = &state.pool;
    let scope = scope(&range);

    let sales_by_branch = report::sales_by_branch(pool, scope).await?;
    let total_sales = money::round_money(sales_by_branch.iter().map(|b| b.total).sum());
    let total_purchases = report::total_purchases(pool, scope).await?;
    let total_expenses = report::total_expenses(pool, scope).await?;
    let total_salaries = report::total_salaries(pool, &range.start_date, &range.end_date).await?;
    let profit = money::to_f64(
        money::to_decimal(total_sales)
            - (money::to_decimal(total_purchases) + money::to_decimal(total_expenses) + money::to_decimal(total_salaries)),
    );

    let (from_ms, to_ms) = range_millis(state, &range)?;
    let cash_flow: CashFlow = report::cash_flow(pool, from_ms, to_ms).await?;

    let summary = SummaryReport {
        sales_by_branch,
        total_sales,
        total_purchases,
        total_expenses,
        total_salaries,
        profit,
        daily_sales: report::daily_sales(pool, scope).await?,
        payment_methods: report::payment_methods(pool, scope).await?,
        cash_flow,
        top_products: report::top_products(pool, scope, TOP_PRODUCTS).await?,
        low_stock: raw_material::low_stock(pool, LOW_STOCK_ITEMS).await?,
        range,
    };
    tracing::debug!(
        start = %summary.range.start_date,
        end = %summary.range.end_date,
        total_sales = summary.total_sales,
        profit = summary.profit,
        "Summary report built"
    );
    Ok(summary)
}

fn row_totals(rows: &[ReportRow]) -> ReportTotals {
    let sum = |f: fn(&ReportRow) -> f64| money::to_f64(rows.iter().map(|r| money::to_decimal(f(r))).sum());
    ReportTotals {
        count: rows.len(),
        subtotal: sum(|r| r.subtotal),
        tax_amount: sum(|r| r.tax_amount),
        discount_amount: sum(|r| r.discount_amount),
        total_amount: sum(|r| r.total_amount),
        paid_amount: sum(|r| r.paid_amount),
    }
}

/// GET /api/reports/{sales|purchases|expenses}
pub async fn tabular(state: &ServerState, kind: ReportKind, query: ReportQuery) -> AppResult<TabularReport> {
    let range = resolve_range(state, &query).await?;
    let rows = match kind {
        ReportKind::Sales => report::sales_rows(&state.pool, scope(&range)).await?,
        ReportKind::Purchases => report::purchase_rows(&state.pool, scope(&range)).await?,
        ReportKind::Expenses => report::expense_rows(&state.pool, scope(&range)).await?,
    };
    let totals = row_totals(&rows);
    Ok(TabularReport { range, rows, totals })
}

// ── Payroll ──

fn parse_month_bound(value: Option<&str>, fallback: (i32, u32), field: &str) -> AppResult<(i32, u32)> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => shared::util::parse_year_month(v).ok_or_else(|| {
            AppError::validation(format!("Invalid {field} '{v}', expected YYYY-MM")).with_detail("field", field)
        }),
        None => Ok(fallback),
    }
}

fn month_label((year, month): (i32, u32)) -> String {
    format!("{year}-{month:02}")
}

/// `from` defaults to January of the current year, `to` to the current month
fn month_bounds(state: &ServerState, from: Option<&str>, to: Option<&str>) -> AppResult<((i32, u32), (i32, u32))> {
    let today = time::today(state.tz());
    let from = parse_month_bound(from, (today.year(), 1), "from")?;
    let to = parse_month_bound(to, (today.year(), today.month()), "to")?;
    if shared::util::month_key(from.0, from.1) > shared::util::month_key(to.0, to.1) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("from ({}) is after to ({})", month_label(from), month_label(to)),
        ));
    }
    Ok((from, to))
}

fn salary_amounts(s: &Salary) -> PayrollAmounts {
    PayrollAmounts {
        basic: s.basic_salary,
        allowances: s.allowances,
        deductions: s.deductions,
        previous_due: s.previous_salary_due,
        total: s.total_salary,
        paid: s.paid_amount,
        remaining: money::remaining(s.total_salary, s.paid_amount),
    }
}

/// Sum amounts with decimal precision
pub fn sum_amounts<'a>(items: impl IntoIterator<Item = &'a PayrollAmounts>) -> PayrollAmounts {
    let mut acc = [rust_decimal::Decimal::ZERO; 7];
    for a in items {
        for (slot, value) in acc.iter_mut().zip([
            a.basic,
            a.allowances,
            a.deductions,
            a.previous_due,
            a.total,
            a.paid,
            a.remaining,
        ]) {
            *slot += money::to_decimal(value);
        }
    }
    let [basic, allowances, deductions, previous_due, total, paid, remaining] = acc.map(money::to_f64);
    PayrollAmounts {
        basic,
        allowances,
        deductions,
        previous_due,
        total,
        paid,
        remaining,
    }
}

/// GET /api/reports/payroll
pub async fn payroll(state: &ServerState, query: PayrollReportQuery) -> AppResult<PayrollReport> {
    let (from, to) = month_bounds(state, query.from.as_deref(), query.to.as_deref())?;
    let ids = parse_id_list(query.employee_ids.as_deref());
    let employees = employee::find_many(&state.pool, &ids).await?;
    let salaries = salary::find_range(
        &state.pool,
        shared::util::month_key(from.0, from.1),
        shared::util::month_key(to.0, to.1),
    )
    .await?;

    let rows: Vec<PayrollEmployeeRow> = employees
        .into_iter()
        .map(|e| {
            let months: Vec<PayrollAmounts> = salaries
                .iter()
                .filter(|s| s.employee_id == e.id)
                .map(salary_amounts)
                .collect();
            PayrollEmployeeRow {
                employee_id: e.id,
                employee_code: e.employee_code,
                full_name: e.full_name,
                department: e.department,
                unpaid_months: months.iter().filter(|m| m.remaining > UNPAID_THRESHOLD).count(),
                amounts: sum_amounts(&months),
            }
        })
        .collect();

    let totals = sum_amounts(rows.iter().map(|r| &r.amounts));
    Ok(PayrollReport {
        from: month_label(from),
        to: month_label(to),
        rows,
        totals,
    })
}

/// GET /api/reports/payroll/{employee_id}
pub async fn payroll_statement(
    state: &ServerState,
    employee_id: i64,
    query: PayrollReportQuery,
) -> AppResult<PayrollStatement> {
    let (from, to) = month_bounds(state, query.from.as_deref(), query.to.as_deref())?;
    let emp = employee::find_by_id(&state.pool, employee_id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::EmployeeNotFound, format!("Employee {employee_id} not found"))
    })?;
    let months: Vec<PayrollMonthRow> = salary::find_range(
        &state.pool,
        shared::util::month_key(from.0, from.1),
        shared::util::month_key(to.0, to.1),
    )
    .await?
    .into_iter()
    .filter(|s| s.employee_id == employee_id)
    .map(|s| PayrollMonthRow {
        month: format!("{}-{:02}", s.year, s.month),
        salary_id: s.id,
        status: s.status,
        amounts: salary_amounts(&s),
    })
    .collect();

    let totals = sum_amounts(months.iter().map(|m| &m.amounts));
    Ok(PayrollStatement {
        employee_id,
        employee_code: emp.employee_code,
        full_name: emp.full_name,
        from: month_label(from),
        to: month_label(to),
        months,
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sales::{checkout, draft};
    use crate::test_support::{SUPERVISOR, TestEnv, admin};
    use shared::models::{CheckoutRequest, DraftItemInput, DraftSave, InvoiceVoid, PaymentMethod};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn periods_resolve_in_calendar_units() {
        let today = date("2025-03-13"); // Thursday
        assert_eq!(
            resolve_period(ReportPeriod::Today, None, None, today),
            (ReportPeriod::Today, today, today)
        );
        assert_eq!(
            resolve_period(ReportPeriod::ThisWeek, None, None, today),
            (ReportPeriod::ThisWeek, date("2025-03-10"), date("2025-03-16"))
        );
        assert_eq!(
            resolve_period(ReportPeriod::ThisMonth, None, None, today),
            (ReportPeriod::ThisMonth, date("2025-03-01"), date("2025-03-31"))
        );
        assert_eq!(
            resolve_period(ReportPeriod::ThisYear, None, None, today),
            (ReportPeriod::ThisYear, date("2025-01-01"), date("2025-12-31"))
        );
    }

    #[test]
    fn invalid_custom_range_falls_back_to_this_month() {
        let today = date("2024-02-10");
        assert_eq!(
            resolve_period(ReportPeriod::Custom, Some("2024-01-05"), Some("2024-01-20"), today),
            (ReportPeriod::Custom, date("2024-01-05"), date("2024-01-20"))
        );
        let fallback = (ReportPeriod::ThisMonth, date("2024-02-01"), date("2024-02-29"));
        assert_eq!(
            resolve_period(ReportPeriod::Custom, Some("2024-01-20"), Some("2024-01-05"), today),
            fallback
        );
        assert_eq!(
            resolve_period(ReportPeriod::Custom, Some("garbage"), None, today),
            fallback
        );
    }

    #[test]
    fn amounts_sum_without_float_drift() {
        let a = PayrollAmounts {
            basic: 0.1,
            paid: 0.2,
            ..Default::default()
        };
        let total = sum_amounts([&a, &a, &a]);
        assert_eq!(total.basic, 0.3);
        assert_eq!(total.paid, 0.6);
    }

    #[tokio::test]
    async fn summary_excludes_void_invoices() {
        let env = TestEnv::new().await;
        let meal = env.meal("Mandi", 50.0).await;
        let mut invoice_ids = vec![];
        for table in [1, 2] {
            let saved = draft::save(
                &env.state,
                &admin(),
                "china_town",
                table,
                DraftSave {
                    items: vec![DraftItemInput { meal_id: meal, quantity: 2 }],
                    tax_pct: Some(0.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
            let resp = checkout::checkout_draft(
                &env.state,
                &admin(),
                saved.draft.unwrap().draft.id,
                CheckoutRequest {
                    payment_method: PaymentMethod::Cash,
                    customer_name: None,
                    customer_phone: None,
                    discount_pct: None,
                    tax_pct: None,
                },
            )
            .await
            .unwrap();
            invoice_ids.push(resp.invoice_id);
        }
        checkout::void(
            &env.state,
            &admin(),
            invoice_ids[1],
            InvoiceVoid {
                supervisor_password: Some(SUPERVISOR.into()),
                reason: None,
            },
        )
        .await
        .unwrap();

        let report = summary(&env.state, ReportQuery::default()).await.unwrap();
        assert_eq!(report.range.period, ReportPeriod::ThisMonth);
        assert_eq!(report.total_sales, 100.0);
        assert_eq!(report.cash_flow.inflow, 100.0);
        assert_eq!(report.top_products[0].quantity, 2);
        let china = report.sales_by_branch.iter().find(|b| b.branch_code == "china_town").unwrap();
        assert_eq!(china.invoice_count, 1);

        let sales = tabular(
            &env.state,
            ReportKind::Sales,
            ReportQuery {
                branch: Some("china_town".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(sales.totals.count, 1);
        assert_eq!(sales.totals.total_amount, 100.0);
    }

    #[tokio::test]
    async fn unknown_branch_is_rejected() {
        let env = TestEnv::new().await;
        let err = summary(
            &env.state,
            ReportQuery {
                branch: Some("atlantis".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::BranchNotFound);
    }

    #[tokio::test]
    async fn payroll_report_rejects_inverted_months() {
        let env = TestEnv::new().await;
        let err = payroll(
            &env.state,
            PayrollReportQuery {
                from: Some("2025-06".into()),
                to: Some("2025-01".into()),
                employee_ids: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
    }
}
