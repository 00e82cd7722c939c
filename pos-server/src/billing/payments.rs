//! 付款登记 (销售、采购、费用发票)
//!
//! 工资付款走 `/api/payroll/pay`，这里拒绝 `salary` 类型。

use shared::models::{InvoiceType, Payment, PaymentCreate, PaymentQuery, PaymentResult, PaymentStatus, PrintStatus};

use super::money;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::payment::{self, NewPayment};
use crate::db::repository::sales_invoice;
use crate::utils::error::db_error;
use crate::utils::time;
use crate::utils::types::DateRangeQuery;
use crate::utils::validation::{MAX_NOTE_LEN, normalize_optional, validate_optional_text};
use crate::utils::{AppError, AppResult, ErrorCode};

const PAYMENT_RESOURCE: &str = "payment";

fn document_not_found(invoice_type: InvoiceType, id: i64) -> AppError {
    let code = match invoice_type {
        InvoiceType::Purchase => ErrorCode::PurchaseNotFound,
        InvoiceType::Expense => ErrorCode::ExpenseNotFound,
        _ => ErrorCode::InvoiceNotFound,
    };
    AppError::with_message(code, format!("{} invoice {id} not found", invoice_type.as_str()))
        .with_detail("invoice_id", id)
}

/// POST /api/payments
pub async fn record(state: &ServerState, user: &CurrentUser, req: PaymentCreate) -> AppResult<PaymentResult> {
    money::validate_payment_amount(req.amount)?;
    validate_optional_text(&req.note, "note", MAX_NOTE_LEN)?;
    if req.invoice_type == InvoiceType::Salary {
        return Err(AppError::validation("Salary payments are recorded through /api/payroll/pay")
            .with_detail("invoice_type", "salary"));
    }

    // 销售发票与结账/作废共用同一把锁
    let _guard = match req.invoice_type {
        InvoiceType::Sales => Some(state.sales_lock.lock().await),
        _ => None,
    };

    let mut tx = state.pool.begin().await.map_err(db_error)?;
    let (total, paid) = payment::invoice_amounts(&mut tx, req.invoice_type, req.invoice_id)
        .await?
        .ok_or_else(|| document_not_found(req.invoice_type, req.invoice_id))?;

    let sales = match req.invoice_type {
        InvoiceType::Sales => sales_invoice::find_by_id(&mut tx, req.invoice_id).await?,
        _ => None,
    };
    if let Some(invoice) = &sales
        && invoice.print_status == PrintStatus::Void
    {
        return Err(AppError::with_message(
            ErrorCode::InvoiceAlreadyVoided,
            format!("Invoice {} is void", invoice.invoice_number),
        )
        .with_detail("invoice_id", invoice.id));
    }
    if money::settlement_status(paid, total) == PaymentStatus::Paid {
        return Err(AppError::with_message(
            ErrorCode::PaymentAlreadySettled,
            format!("{} invoice {} is already paid", req.invoice_type.as_str(), req.invoice_id),
        )
        .with_detail("paid_amount", paid)
        .with_detail("total_amount", total));
    }

    let note = normalize_optional(req.note);
    let recorded = payment::insert(
        &mut tx,
        &NewPayment {
            invoice_type: req.invoice_type,
            invoice_id: req.invoice_id,
            amount: req.amount,
            payment_method: req.payment_method,
            note: note.as_deref(),
            created_by: Some(user.id),
        },
    )
    .await?;
    let (paid_amount, payment_status) =
        payment::refresh_settlement(&mut tx, req.invoice_type, req.invoice_id).await?;
    tx.commit().await.map_err(db_error)?;

    tracing::info!(
        payment_id = recorded.id,
        invoice_type = req.invoice_type.as_str(),
        invoice_id = req.invoice_id,
        amount = recorded.amount,
        paid_amount,
        user = %user.username,
        "Payment recorded"
    );
    let id = recorded.id.to_string();
    match &sales {
        Some(invoice) => {
            state
                .broadcast_branch_sync(PAYMENT_RESOURCE, "created", &id, &invoice.branch_code, Some(&recorded))
                .await
        }
        None => state.broadcast_sync(PAYMENT_RESOURCE, "created", &id, Some(&recorded)).await,
    }

    Ok(PaymentResult {
        payment: recorded,
        paid_amount,
        payment_status,
    })
}

/// GET /api/payments
pub async fn list(state: &ServerState, query: PaymentQuery) -> AppResult<Vec<Payment>> {
    let range = DateRangeQuery {
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let (start, end) = range.resolve(state.tz())?;
    let from = time::day_start_millis(time::parse_date(&start)?, state.tz());
    let to = time::day_end_millis(time::parse_date(&end)?, state.tz());
    Ok(payment::find_in_range(&state.pool, query.invoice_type, from, to).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::documents;
    use crate::sales::checkout;
    use crate::test_support::{SUPERVISOR, TestEnv, admin};
    use shared::models::{
        DirectCheckoutRequest, DraftItemInput, ExpenseCreate, ExpenseItemInput, InvoiceVoid, PaymentMethod,
    };

    fn pay(invoice_type: InvoiceType, invoice_id: i64, amount: f64) -> PaymentCreate {
        PaymentCreate {
            invoice_id,
            invoice_type,
            amount,
            payment_method: PaymentMethod::Bank,
            note: None,
        }
    }

    #[tokio::test]
    async fn settled_expense_rejects_more_payments() {
        let env = TestEnv::new().await;
        let expense = documents::create_expense(
            &env.state,
            &admin(),
            ExpenseCreate {
                invoice_date: None,
                branch_code: None,
                payment_method: PaymentMethod::Cash,
                notes: None,
                items: vec![ExpenseItemInput {
                    description: "Gas".into(),
                    quantity: 1.0,
                    unit_price: 50.0,
                    tax: 0.0,
                    discount_pct: 0.0,
                }],
            },
        )
        .await
        .unwrap();

        let err = record(&env.state, &admin(), pay(InvoiceType::Expense, expense.id, 10.0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentAlreadySettled);
    }

    #[tokio::test]
    async fn rejects_salary_and_bad_amounts() {
        let env = TestEnv::new().await;
        let err = record(&env.state, &admin(), pay(InvoiceType::Salary, 1, 10.0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let err = record(&env.state, &admin(), pay(InvoiceType::Purchase, 1, 0.0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentInvalidAmount);
        let err = record(&env.state, &admin(), pay(InvoiceType::Purchase, 99, 5.0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PurchaseNotFound);
    }

    #[tokio::test]
    async fn void_sales_invoice_rejects_payments() {
        let env = TestEnv::new().await;
        let meal = env.meal("Tea", 10.0).await;
        let done = checkout::direct_checkout(
            &env.state,
            &admin(),
            DirectCheckoutRequest {
                branch_code: "china_town".into(),
                table_number: None,
                items: vec![DraftItemInput { meal_id: meal, quantity: 1 }],
                customer_name: None,
                customer_phone: None,
                discount_pct: None,
                tax_pct: Some(0.0),
                payment_method: PaymentMethod::Cash,
            },
        )
        .await
        .unwrap();
        checkout::void(
            &env.state,
            &admin(),
            done.invoice_id,
            InvoiceVoid {
                supervisor_password: Some(SUPERVISOR.into()),
                reason: None,
            },
        )
        .await
        .unwrap();

        let err = record(&env.state, &admin(), pay(InvoiceType::Sales, done.invoice_id, 1.0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvoiceAlreadyVoided);
    }
}
