//! Purchase and expense invoices
//!
//! Both are numbered per year (`PUR-2025-001`, `EXP-2025-001`). The invoice
//! date defaults to today in the business timezone and its year picks the
//! numbering sequence.

use chrono::Datelike;
use shared::models::{ExpenseCreate, ExpenseInvoice, PurchaseCreate, PurchaseInvoice};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{expense, purchase, settings};
use crate::sales::require_branch;
use crate::utils::time;
use crate::utils::types::DateRangeQuery;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_amount, validate_optional_text, validate_percent, validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};

/// Resolve `invoice_date` (default today) into `(YYYY-MM-DD, year)`
fn invoice_date(state: &ServerState, raw: Option<&str>) -> AppResult<(String, i32)> {
    let date = match raw.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => time::parse_date(d)?,
        None => time::today(state.tz()),
    };
    Ok((date.format("%Y-%m-%d").to_string(), date.year()))
}

fn require_items(count: usize) -> AppResult<()> {
    if count == 0 {
        return Err(AppError::with_message(ErrorCode::RequiredField, "At least one line is required")
            .with_detail("field", "items"));
    }
    Ok(())
}

fn validate_quantity(quantity: f64) -> AppResult<()> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(AppError::with_message(
            ErrorCode::InvalidQuantity,
            format!("quantity must be greater than 0, got {quantity}"),
        ));
    }
    Ok(())
}

async fn validate_branch(state: &ServerState, branch: Option<&str>) -> AppResult<()> {
    if let Some(code) = branch {
        require_branch(state, code).await?;
    }
    Ok(())
}

fn purchase_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::PurchaseNotFound, format!("Purchase invoice {id} not found"))
        .with_detail("id", id)
}

fn expense_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::ExpenseNotFound, format!("Expense invoice {id} not found"))
        .with_detail("id", id)
}

// ── Purchases ───────────────────────────────────────────────────────

/// POST /api/purchases
pub async fn create_purchase(
    state: &ServerState,
    user: &CurrentUser,
    req: PurchaseCreate,
) -> AppResult<PurchaseInvoice> {
    require_items(req.items.len())?;
    validate_optional_text(&req.supplier_name, "supplier_name", MAX_NAME_LEN)?;
    validate_optional_text(&req.notes, "notes", MAX_NOTE_LEN)?;
    for item in &req.items {
        validate_quantity(item.quantity)?;
        validate_amount(item.unit_price, "unit_price")?;
        validate_percent(item.discount_pct, "discount_pct")?;
    }
    validate_branch(state, req.branch_code.as_deref()).await?;

    let (date, year) = invoice_date(state, req.invoice_date.as_deref())?;
    let vat_pct = settings::vat_rate(&state.pool).await?;
    let invoice = purchase::create(&state.pool, &req, &date, year, vat_pct, Some(user.id)).await?;
    tracing::info!(
        purchase_id = invoice.id,
        invoice_number = %invoice.invoice_number,
        user = %user.username,
        "Purchase recorded"
    );
    Ok(invoice)
}

/// GET /api/purchases
pub async fn list_purchases(state: &ServerState, query: DateRangeQuery) -> AppResult<Vec<PurchaseInvoice>> {
    let (start, end) = query.resolve(state.tz())?;
    Ok(purchase::find_all(&state.pool, &start, &end).await?)
}

/// GET /api/purchases/{id}
pub async fn get_purchase(state: &ServerState, id: i64) -> AppResult<PurchaseInvoice> {
    purchase::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| purchase_not_found(id))
}

/// DELETE /api/purchases/{id}
///
/// Received stock is taken back out (floored at zero).
pub async fn delete_purchase(state: &ServerState, user: &CurrentUser, id: i64) -> AppResult<()> {
    get_purchase(state, id).await?;
    purchase::delete(&state.pool, id).await?;
    tracing::warn!(purchase_id = id, user = %user.username, "Purchase deleted");
    Ok(())
}

// ── Expenses ────────────────────────────────────────────────────────

/// POST /api/expenses
pub async fn create_expense(state: &ServerState, user: &CurrentUser, req: ExpenseCreate) -> AppResult<ExpenseInvoice> {
    require_items(req.items.len())?;
    validate_optional_text(&req.notes, "notes", MAX_NOTE_LEN)?;
    for item in &req.items {
        validate_required_text(&item.description, "description", MAX_NAME_LEN)?;
        validate_quantity(item.quantity)?;
        validate_amount(item.unit_price, "unit_price")?;
        validate_amount(item.tax, "tax")?;
        validate_percent(item.discount_pct, "discount_pct")?;
    }
    validate_branch(state, req.branch_code.as_deref()).await?;

    let (date, year) = invoice_date(state, req.invoice_date.as_deref())?;
    let invoice = expense::create(&state.pool, &req, &date, year, Some(user.id)).await?;
    tracing::info!(
        expense_id = invoice.id,
        invoice_number = %invoice.invoice_number,
        user = %user.username,
        "Expense recorded"
    );
    Ok(invoice)
}

/// GET /api/expenses
pub async fn list_expenses(state: &ServerState, query: DateRangeQuery) -> AppResult<Vec<ExpenseInvoice>> {
    let (start, end) = query.resolve(state.tz())?;
    Ok(expense::find_all(&state.pool, &start, &end).await?)
}

/// GET /api/expenses/{id}
pub async fn get_expense(state: &ServerState, id: i64) -> AppResult<ExpenseInvoice> {
    expense::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| expense_not_found(id))
}

/// DELETE /api/expenses/{id}
pub async fn delete_expense(state: &ServerState, user: &CurrentUser, id: i64) -> AppResult<()> {
    get_expense(state, id).await?;
    expense::delete(&state.pool, id).await?;
    tracing::warn!(expense_id = id, user = %user.username, "Expense deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::raw_material;
    use crate::test_support::{TestEnv, admin};
    use shared::models::{ExpenseItemInput, PaymentMethod, PaymentStatus, PurchaseItemInput, RawMaterialCreate};

    async fn flour(env: &TestEnv) -> i64 {
        raw_material::create(
            &env.state.pool,
            &RawMaterialCreate {
                name: "Flour".into(),
                name_ar: None,
                unit: "kg".into(),
                cost_per_unit: 2.0,
                stock_quantity: 10.0,
                category: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    fn purchase_of(raw_material_id: i64, quantity: f64, unit_price: f64) -> PurchaseCreate {
        PurchaseCreate {
            supplier_name: Some("Mill Co".into()),
            invoice_date: Some("2025-02-10".into()),
            branch_code: None,
            payment_method: PaymentMethod::Bank,
            notes: None,
            items: vec![PurchaseItemInput {
                raw_material_id,
                quantity,
                unit_price,
                discount_pct: 0.0,
            }],
        }
    }

    #[tokio::test]
    async fn purchase_receives_stock_at_average_cost() {
        let env = TestEnv::new().await;
        let id = flour(&env).await;

        let invoice = create_purchase(&env.state, &admin(), purchase_of(id, 10.0, 4.0)).await.unwrap();
        assert_eq!(invoice.invoice_number, "PUR-2025-001");
        assert_eq!(invoice.payment_status, PaymentStatus::Unpaid);
        // 40 + 15% VAT
        assert_eq!(invoice.total_amount, 46.0);

        let rm = raw_material::find_by_id(&env.state.pool, id).await.unwrap().unwrap();
        assert_eq!(rm.stock_quantity, 20.0);
        assert_eq!(rm.cost_per_unit, 3.0);

        delete_purchase(&env.state, &admin(), invoice.id).await.unwrap();
        let rm = raw_material::find_by_id(&env.state.pool, id).await.unwrap().unwrap();
        assert_eq!(rm.stock_quantity, 10.0);
    }

    #[tokio::test]
    async fn purchase_validation() {
        let env = TestEnv::new().await;
        let id = flour(&env).await;

        let mut empty = purchase_of(id, 1.0, 1.0);
        empty.items.clear();
        let err = create_purchase(&env.state, &admin(), empty).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);

        let err = create_purchase(&env.state, &admin(), purchase_of(id, 0.0, 1.0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidQuantity);

        let err = create_purchase(&env.state, &admin(), purchase_of(999, 1.0, 1.0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RawMaterialNotFound);
    }

    #[tokio::test]
    async fn expense_is_paid_on_creation() {
        let env = TestEnv::new().await;
        let invoice = create_expense(
            &env.state,
            &admin(),
            ExpenseCreate {
                invoice_date: Some("2025-03-01".into()),
                branch_code: Some("china_town".into()),
                payment_method: PaymentMethod::Cash,
                notes: None,
                items: vec![ExpenseItemInput {
                    description: "Electricity".into(),
                    quantity: 1.0,
                    unit_price: 100.0,
                    tax: 15.0,
                    discount_pct: 10.0,
                }],
            },
        )
        .await
        .unwrap();
        assert_eq!(invoice.invoice_number, "EXP-2025-001");
        assert_eq!(invoice.total_amount, 103.5);
        assert_eq!(invoice.payment_status, PaymentStatus::Paid);

        let listed = list_expenses(
            &env.state,
            DateRangeQuery {
                start_date: Some("2025-03-01".into()),
                end_date: Some("2025-03-31".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(listed.len(), 1);

        let err = get_expense(&env.state, 42).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ExpenseNotFound);
    }
}
