//! 结账与销售发票
//!
//! 发票生命周期: `pending` (已结账待打印) → `confirmed` (打印确认，释放桌台)
//! 或 `void` (主管作废，冲销付款，草稿单重新打开)。

use chrono::Datelike;
use shared::models::{
    CheckoutRequest, CheckoutResponse, DirectCheckoutRequest, DraftItem, DraftOrder, DraftStatus,
    InvoiceDetail, InvoiceQuery, InvoiceType, InvoiceVoid, PaymentMethod, PrintStatus, Receipt,
    SalesInvoice,
};
use sqlx::SqliteConnection;

use super::draft::{customer_discount, merge_inputs, price_lines};
use super::{DRAFT_RESOURCE, INVOICE_RESOURCE, PAYMENT_RESOURCE, broadcast_table, require_branch, require_table, supervisor};
use crate::auth::{CurrentUser, ensure_branch_permission};
use crate::billing::{money, zatca};
use crate::core::ServerState;
use crate::db::repository::draft_order;
use crate::db::repository::numbering::{self, DocumentKind};
use crate::db::repository::payment::{self, NewPayment};
use crate::db::repository::sales_invoice::{self, InvoiceFilter, NewSalesInvoice, NewSalesLine};
use crate::db::repository::settings;
use crate::utils::error::db_error;
use crate::utils::time;
use crate::utils::types::{Page, PaginationParams};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, normalize_optional, validate_optional_text, validate_percent,
};
use crate::utils::{AppError, AppResult, ErrorCode};

pub fn print_url(invoice_id: i64) -> String {
    format!("/api/invoices/{invoice_id}/receipt")
}

fn response(invoice: &SalesInvoice) -> CheckoutResponse {
    CheckoutResponse {
        invoice_id: invoice.id,
        invoice_number: invoice.invoice_number.clone(),
        print_url: print_url(invoice.id),
        payment_method: invoice.payment_method,
        total_amount: invoice.total_amount,
    }
}

fn require_pos_method(method: PaymentMethod) -> AppResult<()> {
    if method.is_pos_checkout() {
        return Ok(());
    }
    Err(AppError::with_message(
        ErrorCode::PaymentInvalidMethod,
        format!("POS checkout accepts CASH or CARD, got {}", method.as_str()),
    ))
}

fn validate_header(
    customer_name: &Option<String>,
    customer_phone: &Option<String>,
    discount_pct: Option<f64>,
    tax_pct: Option<f64>,
) -> AppResult<()> {
    if let Some(pct) = discount_pct {
        validate_percent(pct, "discount_pct")?;
    }
    if let Some(pct) = tax_pct {
        validate_percent(pct, "tax_pct")?;
    }
    validate_optional_text(customer_name, "customer_name", MAX_NAME_LEN)?;
    validate_optional_text(customer_phone, "customer_phone", MAX_SHORT_TEXT_LEN)
}

fn invoice_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::InvoiceNotFound, format!("Invoice {id} not found")).with_detail("invoice_id", id)
}

fn already_voided(invoice: &SalesInvoice) -> AppError {
    AppError::with_message(
        ErrorCode::InvoiceAlreadyVoided,
        format!("Invoice {} is void", invoice.invoice_number),
    )
    .with_detail("invoice_id", invoice.id)
}

/// Everything needed to write one sales invoice
struct InvoiceDraft<'a> {
    branch_code: &'a str,
    table_number: Option<i64>,
    source: Option<&'a DraftOrder>,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    tax_pct: f64,
    discount_pct: f64,
    payment_method: PaymentMethod,
    items: &'a [DraftItem],
}

/// Insert invoice + lines + full payment inside the caller's transaction
async fn write_invoice(
    conn: &mut SqliteConnection,
    state: &ServerState,
    user: &CurrentUser,
    data: &InvoiceDraft<'_>,
) -> AppResult<SalesInvoice> {
    if data.items.is_empty() {
        return Err(AppError::with_message(ErrorCode::DraftEmpty, "Cannot checkout an empty order"));
    }
    let today = time::today(state.tz());
    let invoice_number = numbering::next_number(&mut *conn, DocumentKind::Sales, today.year()).await?;

    let lines: Vec<(f64, i64)> = data.items.iter().map(|i| (i.unit_price, i.quantity)).collect();
    let totals = money::order_totals(&lines, data.tax_pct, data.discount_pct);
    let snapshots: Vec<NewSalesLine> = data
        .items
        .iter()
        .map(|item| {
            let amounts = money::sales_line(item.unit_price, item.quantity, data.tax_pct, data.discount_pct);
            NewSalesLine {
                meal_id: item.meal_id,
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                line_subtotal: amounts.subtotal,
                tax_amount: amounts.tax,
                discount_amount: amounts.discount,
                line_total: amounts.total,
            }
        })
        .collect();

    let header = NewSalesInvoice {
        invoice_number,
        invoice_date: today.format("%Y-%m-%d").to_string(),
        branch_code: data.branch_code.to_string(),
        table_number: data.table_number,
        draft_id: data.source.map(|d| d.id),
        draft_version: data.source.map(|d| d.version),
        customer_name: data.customer_name.clone(),
        customer_phone: data.customer_phone.clone(),
        payment_method: data.payment_method,
        subtotal: totals.subtotal,
        tax_pct: data.tax_pct,
        tax_amount: totals.tax_amount,
        discount_pct: data.discount_pct,
        discount_amount: totals.discount_amount,
        total_amount: totals.total_amount,
        created_by: Some(user.id),
    };
    let id = sales_invoice::insert(&mut *conn, &header, &snapshots).await?;

    if totals.total_amount > 0.0 {
        payment::insert(
            &mut *conn,
            &NewPayment {
                invoice_type: InvoiceType::Sales,
                invoice_id: id,
                amount: totals.total_amount,
                payment_method: data.payment_method,
                note: None,
                created_by: Some(user.id),
            },
        )
        .await?;
    }
    payment::refresh_settlement(&mut *conn, InvoiceType::Sales, id).await?;

    sales_invoice::find_by_id(conn, id)
        .await?
        .ok_or_else(|| invoice_not_found(id))
}

async fn announce_invoice(state: &ServerState, action: &str, invoice: &SalesInvoice) {
    state
        .broadcast_branch_sync(
            INVOICE_RESOURCE,
            action,
            &invoice.id.to_string(),
            &invoice.branch_code,
            Some(invoice),
        )
        .await;
    if let Some(table) = invoice.table_number {
        broadcast_table(state, &invoice.branch_code, table).await;
    }
}

/// POST /api/drafts/{id}/checkout
pub async fn checkout_draft(
    state: &ServerState,
    user: &CurrentUser,
    draft_id: i64,
    req: CheckoutRequest,
) -> AppResult<CheckoutResponse> {
    require_pos_method(req.payment_method)?;
    validate_header(&req.customer_name, &req.customer_phone, req.discount_pct, req.tax_pct)?;

    let _guard = state.sales_lock.lock().await;

    let (draft, pending) = {
        let mut conn = state.pool.acquire().await.map_err(db_error)?;
        let draft = draft_order::find_by_id(&mut conn, draft_id).await?.ok_or_else(|| {
            AppError::with_message(ErrorCode::DraftNotFound, format!("Draft {draft_id} not found"))
                .with_detail("draft_id", draft_id)
        })?;
        let pending = sales_invoice::find_pending_for_draft(&mut conn, draft_id).await?;
        (draft, pending)
    };
    ensure_branch_permission(user, "sales:add", &draft.branch_code)?;

    match draft.status {
        DraftStatus::CheckedOut => {
            if let Some(invoice) = pending
                && invoice.draft_version == Some(draft.version)
            {
                tracing::info!(
                    draft_id,
                    invoice_id = invoice.id,
                    invoice_number = %invoice.invoice_number,
                    "Repeated checkout returns pending invoice"
                );
                return Ok(response(&invoice));
            }
            return Err(AppError::with_message(
                ErrorCode::DraftNotOpen,
                format!("Draft {draft_id} is already checked out"),
            ));
        }
        DraftStatus::Cancelled => {
            return Err(AppError::with_message(
                ErrorCode::DraftNotOpen,
                format!("Draft {draft_id} is cancelled"),
            ));
        }
        DraftStatus::Open => {}
    }

    let data = InvoiceDraft {
        branch_code: &draft.branch_code,
        table_number: Some(draft.table_number),
        source: Some(&draft),
        customer_name: normalize_optional(req.customer_name).or_else(|| draft.customer_name.clone()),
        customer_phone: normalize_optional(req.customer_phone).or_else(|| draft.customer_phone.clone()),
        tax_pct: req.tax_pct.unwrap_or(draft.tax_pct),
        discount_pct: req.discount_pct.unwrap_or(draft.discount_pct),
        payment_method: req.payment_method,
        items: &draft.items,
    };

    let mut tx = state.pool.begin().await.map_err(db_error)?;
    let invoice = write_invoice(&mut tx, state, user, &data).await?;
    draft_order::set_status(&mut tx, draft_id, DraftStatus::CheckedOut).await?;
    tx.commit().await.map_err(db_error)?;

    tracing::info!(
        draft_id,
        invoice_id = invoice.id,
        invoice_number = %invoice.invoice_number,
        total = invoice.total_amount,
        method = invoice.payment_method.as_str(),
        "Draft checked out"
    );
    state
        .broadcast_branch_sync::<()>(DRAFT_RESOURCE, "checked_out", &draft_id.to_string(), &draft.branch_code, None)
        .await;
    announce_invoice(state, "created", &invoice).await;
    Ok(response(&invoice))
}

/// POST /api/sales/checkout: order straight to invoice without a saved draft
pub async fn direct_checkout(
    state: &ServerState,
    user: &CurrentUser,
    req: DirectCheckoutRequest,
) -> AppResult<CheckoutResponse> {
    require_pos_method(req.payment_method)?;
    validate_header(&req.customer_name, &req.customer_phone, req.discount_pct, req.tax_pct)?;
    require_branch(state, &req.branch_code).await?;
    ensure_branch_permission(user, "sales:add", &req.branch_code)?;
    if let Some(table) = req.table_number {
        require_table(state, &req.branch_code, table).await?;
    }

    let merged = merge_inputs(&req.items)?;
    if merged.is_empty() {
        return Err(AppError::with_message(ErrorCode::DraftEmpty, "Cannot checkout an empty order"));
    }
    let items = price_lines(state, &merged).await?;

    let customer_name = normalize_optional(req.customer_name);
    let customer_phone = normalize_optional(req.customer_phone);
    let tax_pct = match req.tax_pct {
        Some(pct) => pct,
        None => settings::vat_rate(&state.pool).await?,
    };
    let discount_pct = match req.discount_pct {
        Some(pct) => pct,
        None => customer_discount(state, customer_phone.as_deref()).await?.unwrap_or(0.0),
    };

    let _guard = state.sales_lock.lock().await;

    if let Some(table) = req.table_number {
        let active = {
            let mut conn = state.pool.acquire().await.map_err(db_error)?;
            draft_order::find_active(&mut conn, &req.branch_code, table).await?
        };
        if let Some(d) = active {
            return Err(AppError::with_message(
                ErrorCode::TableOccupied,
                format!("Table {table} has an active draft"),
            )
            .with_detail("draft_id", d.id));
        }
    }

    let data = InvoiceDraft {
        branch_code: &req.branch_code,
        table_number: req.table_number,
        source: None,
        customer_name,
        customer_phone,
        tax_pct,
        discount_pct,
        payment_method: req.payment_method,
        items: &items,
    };
    let mut tx = state.pool.begin().await.map_err(db_error)?;
    let invoice = write_invoice(&mut tx, state, user, &data).await?;
    tx.commit().await.map_err(db_error)?;

    tracing::info!(
        invoice_id = invoice.id,
        invoice_number = %invoice.invoice_number,
        branch = %invoice.branch_code,
        total = invoice.total_amount,
        "Direct checkout"
    );
    announce_invoice(state, "created", &invoice).await;
    Ok(response(&invoice))
}

async fn load_invoice(state: &ServerState, id: i64) -> AppResult<SalesInvoice> {
    let mut conn = state.pool.acquire().await.map_err(db_error)?;
    sales_invoice::find_by_id(&mut conn, id)
        .await?
        .ok_or_else(|| invoice_not_found(id))
}

/// POST /api/invoices/{id}/confirm-print
pub async fn confirm_print(state: &ServerState, user: &CurrentUser, invoice_id: i64) -> AppResult<SalesInvoice> {
    let _guard = state.sales_lock.lock().await;

    let invoice = load_invoice(state, invoice_id).await?;
    ensure_branch_permission(user, "sales:print", &invoice.branch_code)?;
    match invoice.print_status {
        PrintStatus::Void => return Err(already_voided(&invoice)),
        PrintStatus::Confirmed => return Ok(invoice),
        PrintStatus::Pending => {}
    }

    let mut tx = state.pool.begin().await.map_err(db_error)?;
    sales_invoice::set_confirmed(&mut tx, invoice_id).await?;
    let removed_draft = match invoice.draft_id {
        Some(draft_id) => draft_order::delete(&mut tx, draft_id).await?.then_some(draft_id),
        None => None,
    };
    let confirmed = sales_invoice::find_by_id(&mut tx, invoice_id)
        .await?
        .ok_or_else(|| invoice_not_found(invoice_id))?;
    tx.commit().await.map_err(db_error)?;

    tracing::info!(
        invoice_id,
        invoice_number = %confirmed.invoice_number,
        user = %user.username,
        "Invoice print confirmed"
    );
    if let Some(draft_id) = removed_draft {
        state
            .broadcast_branch_sync::<()>(DRAFT_RESOURCE, "deleted", &draft_id.to_string(), &confirmed.branch_code, None)
            .await;
    }
    announce_invoice(state, "confirmed", &confirmed).await;
    Ok(confirmed)
}

/// POST /api/invoices/{id}/void
pub async fn void(state: &ServerState, user: &CurrentUser, invoice_id: i64, req: InvoiceVoid) -> AppResult<SalesInvoice> {
    validate_optional_text(&req.reason, "reason", MAX_NOTE_LEN)?;

    let _guard = state.sales_lock.lock().await;

    let invoice = load_invoice(state, invoice_id).await?;
    ensure_branch_permission(user, "sales:delete", &invoice.branch_code)?;
    if invoice.print_status == PrintStatus::Void {
        return Err(already_voided(&invoice));
    }
    supervisor::require(state, user, req.supervisor_password.as_deref(), "void_invoice").await?;

    let reason = normalize_optional(req.reason);
    let mut tx = state.pool.begin().await.map_err(db_error)?;
    sales_invoice::set_void(&mut tx, invoice_id, reason.as_deref()).await?;
    let reversed = payment::reverse_for_invoice(&mut tx, InvoiceType::Sales, invoice_id).await?;
    let mut reopened = None;
    if let Some(draft_id) = invoice.draft_id
        && let Some(draft) = draft_order::find_by_id(&mut tx, draft_id).await?
        && draft.status == DraftStatus::CheckedOut
    {
        draft_order::set_status(&mut tx, draft_id, DraftStatus::Open).await?;
        reopened = Some(draft_id);
    }
    let voided = sales_invoice::find_by_id(&mut tx, invoice_id)
        .await?
        .ok_or_else(|| invoice_not_found(invoice_id))?;
    tx.commit().await.map_err(db_error)?;

    tracing::warn!(
        invoice_id,
        invoice_number = %voided.invoice_number,
        reversed_payments = reversed,
        reopened_draft = ?reopened,
        user = %user.username,
        "Invoice voided"
    );
    if reversed > 0 {
        state
            .broadcast_branch_sync::<()>(PAYMENT_RESOURCE, "reversed", &invoice_id.to_string(), &voided.branch_code, None)
            .await;
    }
    if let Some(draft_id) = reopened {
        state
            .broadcast_branch_sync::<()>(DRAFT_RESOURCE, "reopened", &draft_id.to_string(), &voided.branch_code, None)
            .await;
    }
    announce_invoice(state, "voided", &voided).await;
    Ok(voided)
}

/// GET /api/invoices/{id}
pub async fn detail(state: &ServerState, user: &CurrentUser, invoice_id: i64) -> AppResult<InvoiceDetail> {
    let invoice = load_invoice(state, invoice_id).await?;
    ensure_branch_permission(user, "sales:view", &invoice.branch_code)?;
    let items = sales_invoice::find_items(&state.pool, invoice_id).await?;
    let payments = payment::find_for_invoice(&state.pool, InvoiceType::Sales, invoice_id).await?;
    Ok(InvoiceDetail {
        invoice,
        items,
        payments,
    })
}

/// GET /api/invoices/{id}/receipt
pub async fn receipt(state: &ServerState, user: &CurrentUser, invoice_id: i64) -> AppResult<Receipt> {
    let invoice = load_invoice(state, invoice_id).await?;
    ensure_branch_permission(user, "sales:print", &invoice.branch_code)?;
    let items = sales_invoice::find_items(&state.pool, invoice_id).await?;
    let settings = settings::get(&state.pool).await?;
    let branch_label = require_branch(state, &invoice.branch_code).await?.label;

    let qr_base64 = zatca::qr_base64(
        &settings.company_name,
        settings.tax_number.as_deref().unwrap_or_default(),
        &time::millis_to_rfc3339(invoice.created_at, state.tz()),
        invoice.total_amount,
        invoice.tax_amount,
    );
    Ok(Receipt {
        settings,
        branch_label,
        invoice,
        items,
        qr_base64,
    })
}

/// GET /api/invoices
pub async fn list(state: &ServerState, user: &CurrentUser, query: InvoiceQuery) -> AppResult<Page<SalesInvoice>> {
    let branch_code = query.branch.filter(|b| !b.is_empty() && b != "all");
    match &branch_code {
        Some(code) => {
            require_branch(state, code).await?;
            ensure_branch_permission(user, "sales:view", code)?;
        }
        None => ensure_branch_permission(user, "sales:view", "all")?,
    }
    for date in [&query.start_date, &query.end_date].into_iter().flatten() {
        time::parse_date(date)?;
    }
    let params = PaginationParams::from_query(query.page, query.limit);
    let filter = InvoiceFilter {
        branch_code,
        print_status: query.status,
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let (items, total) = sales_invoice::list(&state.pool, &filter, params.offset(), params.limit()).await?;
    Ok(Page::new(items, total, &params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sales::draft;
    use crate::test_support::{SUPERVISOR, TestEnv, admin, staff};
    use shared::models::{DraftItemInput, DraftSave, PaymentStatus, TableStatus};

    async fn open_draft(env: &TestEnv, table: i64, price: f64, qty: i64) -> i64 {
        let meal = env.meal(&format!("Meal {table}"), price).await;
        let saved = draft::save(
            &env.state,
            &admin(),
            "china_town",
            table,
            DraftSave {
                items: vec![DraftItemInput { meal_id: meal, quantity: qty }],
                tax_pct: Some(15.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        saved.draft.unwrap().draft.id
    }

    fn cash() -> CheckoutRequest {
        CheckoutRequest {
            payment_method: PaymentMethod::Cash,
            customer_name: None,
            customer_phone: None,
            discount_pct: None,
            tax_pct: None,
        }
    }

    #[tokio::test]
    async fn checkout_creates_paid_pending_invoice() {
        let env = TestEnv::new().await;
        let draft_id = open_draft(&env, 1, 20.0, 2).await;

        let resp = checkout_draft(&env.state, &admin(), draft_id, cash()).await.unwrap();
        assert!(resp.invoice_number.starts_with("SAL-"));
        assert!(resp.invoice_number.ends_with("-001"));
        assert_eq!(resp.total_amount, 46.0);
        assert_eq!(resp.print_url, format!("/api/invoices/{}/receipt", resp.invoice_id));

        let detail = detail(&env.state, &admin(), resp.invoice_id).await.unwrap();
        assert_eq!(detail.invoice.print_status, PrintStatus::Pending);
        assert_eq!(detail.invoice.payment_status, PaymentStatus::Paid);
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.payments.len(), 1);

        let table = crate::db::repository::branch::table_status(&env.state.pool, "china_town", 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(table.status, TableStatus::Occupied);
    }

    #[tokio::test]
    async fn repeated_checkout_is_idempotent() {
        let env = TestEnv::new().await;
        let draft_id = open_draft(&env, 2, 10.0, 1).await;
        let first = checkout_draft(&env.state, &admin(), draft_id, cash()).await.unwrap();
        let second = checkout_draft(&env.state, &admin(), draft_id, cash()).await.unwrap();
        assert_eq!(first.invoice_id, second.invoice_id);
        assert_eq!(first.invoice_number, second.invoice_number);
    }

    #[tokio::test]
    async fn only_cash_or_card() {
        let env = TestEnv::new().await;
        let draft_id = open_draft(&env, 3, 10.0, 1).await;
        let mut req = cash();
        req.payment_method = PaymentMethod::Mada;
        let err = checkout_draft(&env.state, &admin(), draft_id, req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentInvalidMethod);
    }

    #[tokio::test]
    async fn confirm_print_frees_table() {
        let env = TestEnv::new().await;
        let draft_id = open_draft(&env, 4, 10.0, 1).await;
        let resp = checkout_draft(&env.state, &admin(), draft_id, cash()).await.unwrap();

        let confirmed = confirm_print(&env.state, &admin(), resp.invoice_id).await.unwrap();
        assert_eq!(confirmed.print_status, PrintStatus::Confirmed);
        let again = confirm_print(&env.state, &admin(), resp.invoice_id).await.unwrap();
        assert_eq!(again.print_status, PrintStatus::Confirmed);

        assert!(draft::get(&env.state, &admin(), "china_town", 4).await.unwrap().is_none());
        let table = crate::db::repository::branch::table_status(&env.state.pool, "china_town", 4)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(table.status, TableStatus::Available);
    }

    #[tokio::test]
    async fn void_reverses_payment_and_reopens_draft() {
        let env = TestEnv::new().await;
        let draft_id = open_draft(&env, 5, 50.0, 1).await;
        let resp = checkout_draft(&env.state, &admin(), draft_id, cash()).await.unwrap();

        let err = void(&env.state, &admin(), resp.invoice_id, InvoiceVoid::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SupervisorPasswordRequired);

        let voided = void(
            &env.state,
            &admin(),
            resp.invoice_id,
            InvoiceVoid {
                supervisor_password: Some(SUPERVISOR.into()),
                reason: Some("wrong table".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(voided.print_status, PrintStatus::Void);
        assert_eq!(voided.paid_amount, 0.0);

        let reopened = draft::get(&env.state, &admin(), "china_town", 5).await.unwrap().unwrap();
        assert_eq!(reopened.draft.status, DraftStatus::Open);

        let err = confirm_print(&env.state, &admin(), resp.invoice_id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvoiceAlreadyVoided);

        let detail = detail(&env.state, &admin(), resp.invoice_id).await.unwrap();
        assert!(detail.payments.iter().all(|p| p.is_reversed));
    }

    #[tokio::test]
    async fn direct_checkout_rejects_occupied_table() {
        let env = TestEnv::new().await;
        open_draft(&env, 6, 10.0, 1).await;
        let meal = env.meal("Water", 1.0).await;

        let req = DirectCheckoutRequest {
            branch_code: "china_town".into(),
            table_number: Some(6),
            items: vec![DraftItemInput { meal_id: meal, quantity: 3 }],
            customer_name: None,
            customer_phone: None,
            discount_pct: None,
            tax_pct: Some(0.0),
            payment_method: PaymentMethod::Card,
        };
        let err = direct_checkout(&env.state, &admin(), req.clone()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TableOccupied);

        let resp = direct_checkout(
            &env.state,
            &admin(),
            DirectCheckoutRequest {
                table_number: Some(7),
                ..req
            },
        )
        .await
        .unwrap();
        assert_eq!(resp.total_amount, 3.0);
        assert_eq!(resp.payment_method, PaymentMethod::Card);
    }

    #[tokio::test]
    async fn receipt_carries_qr_payload() {
        let env = TestEnv::new().await;
        let draft_id = open_draft(&env, 8, 100.0, 1).await;
        let resp = checkout_draft(&env.state, &admin(), draft_id, cash()).await.unwrap();
        let receipt = receipt(&env.state, &admin(), resp.invoice_id).await.unwrap();
        assert_eq!(receipt.branch_label, "China Town");
        assert!(!receipt.qr_base64.is_empty());
        assert_eq!(receipt.items.len(), 1);
    }

    #[tokio::test]
    async fn branch_scoped_staff_cannot_checkout_other_branch() {
        let env = TestEnv::new().await;
        let draft_id = open_draft(&env, 9, 10.0, 1).await;
        let cashier = staff(&["sales:add@place_india"]);
        let err = checkout_draft(&env.state, &cashier, draft_id, cash()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BranchNotPermitted);
    }

    async fn walk_in(env: &TestEnv, branch: &str, table: i64) -> CheckoutResponse {
        let meal = env.meal(&format!("Walk-in {branch} {table}"), 10.0).await;
        direct_checkout(
            &env.state,
            &admin(),
            DirectCheckoutRequest {
                branch_code: branch.into(),
                table_number: Some(table),
                items: vec![DraftItemInput { meal_id: meal, quantity: 1 }],
                customer_name: None,
                customer_phone: None,
                discount_pct: None,
                tax_pct: Some(0.0),
                payment_method: PaymentMethod::Cash,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn scoped_staff_lists_only_their_branch() {
        let env = TestEnv::new().await;
        walk_in(&env, "china_town", 1).await;
        let india = walk_in(&env, "place_india", 1).await;
        let cashier = staff(&["sales:view@place_india"]);

        let err = list(&env.state, &cashier, InvoiceQuery::default()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BranchNotPermitted);

        let all = InvoiceQuery {
            branch: Some("all".into()),
            ..Default::default()
        };
        let err = list(&env.state, &cashier, all).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BranchNotPermitted);

        let china = InvoiceQuery {
            branch: Some("china_town".into()),
            ..Default::default()
        };
        let err = list(&env.state, &cashier, china).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BranchNotPermitted);

        let own = InvoiceQuery {
            branch: Some("place_india".into()),
            ..Default::default()
        };
        let page = list(&env.state, &cashier, own).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, india.invoice_id);
        assert_eq!(page.items[0].branch_code, "place_india");

        let page = list(&env.state, &staff(&["sales:view"]), InvoiceQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn list_filters_and_paginates() {
        let env = TestEnv::new().await;
        let first = walk_in(&env, "china_town", 1).await;
        walk_in(&env, "china_town", 2).await;
        walk_in(&env, "china_town", 3).await;
        walk_in(&env, "place_india", 1).await;
        confirm_print(&env.state, &admin(), first.invoice_id).await.unwrap();

        let china = |page: u32| InvoiceQuery {
            branch: Some("china_town".into()),
            page: Some(page),
            limit: Some(2),
            ..Default::default()
        };
        let p1 = list(&env.state, &admin(), china(1)).await.unwrap();
        assert_eq!((p1.total, p1.items.len(), p1.page, p1.limit), (3, 2, 1, 2));
        assert!(p1.items[0].id > p1.items[1].id);
        let p2 = list(&env.state, &admin(), china(2)).await.unwrap();
        assert_eq!((p2.total, p2.items.len()), (3, 1));
        assert_eq!(p2.items[0].id, first.invoice_id);

        let confirmed = InvoiceQuery {
            status: Some(PrintStatus::Confirmed),
            ..Default::default()
        };
        let page = list(&env.state, &admin(), confirmed).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, first.invoice_id);

        let today = time::today(env.state.tz());
        let today_str = today.format("%Y-%m-%d").to_string();
        let tomorrow = (today + chrono::Duration::days(1)).format("%Y-%m-%d").to_string();
        let window = |start: &str, end: &str| InvoiceQuery {
            start_date: Some(start.into()),
            end_date: Some(end.into()),
            ..Default::default()
        };
        let page = list(&env.state, &admin(), window(&today_str, &today_str)).await.unwrap();
        assert_eq!(page.total, 4);
        let page = list(&env.state, &admin(), window(&tomorrow, &tomorrow)).await.unwrap();
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());

        let err = list(&env.state, &admin(), window("15/10/2026", &today_str))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let unknown = InvoiceQuery {
            branch: Some("nowhere".into()),
            ..Default::default()
        };
        assert!(list(&env.state, &admin(), unknown).await.is_err());
    }
}
