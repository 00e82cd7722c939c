//! 草稿单 (桌台上未结账的订单)
//!
//! # 保存规则
//!
//! - 同一菜品的多行合并，数量 1..=9999
//! - 单价由服务端解析 (菜单覆盖价 → 菜品售价)，忽略客户端价格
//! - `expected_version` 与当前版本不一致 → 409 DraftVersionConflict
//! - 减少或删除已有行需要主管密码
//! - 空列表删除草稿单并释放桌台
//! - 每次成功保存版本号 +1

use shared::models::{
    DraftCancel, DraftItem, DraftItemInput, DraftOrder, DraftSave, DraftSaveResult, DraftStatus,
    DraftView, OrderPreview, display_name,
};

use super::{DRAFT_RESOURCE, broadcast_table, require_branch, require_table, supervisor};
use crate::auth::{CurrentUser, ensure_branch_permission};
use crate::billing::money;
use crate::core::ServerState;
use crate::db::repository::draft_order::{self, DraftFields};
use crate::db::repository::{customer, settings};
use crate::utils::error::db_error;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, normalize_optional, validate_optional_text, validate_percent,
};
use crate::utils::{AppError, AppResult, ErrorCode};

/// Merge duplicate meal ids (first occurrence keeps its position)
pub fn merge_inputs(inputs: &[DraftItemInput]) -> AppResult<Vec<(i64, i64)>> {
    let mut merged: Vec<(i64, i64)> = Vec::with_capacity(inputs.len());
    for input in inputs {
        money::validate_quantity(input.quantity)?;
        match merged.iter_mut().find(|(id, _)| *id == input.meal_id) {
            Some((_, qty)) => *qty += input.quantity,
            None => merged.push((input.meal_id, input.quantity)),
        }
    }
    for (_, qty) in &merged {
        money::validate_quantity(*qty)?;
    }
    Ok(merged)
}

/// Whether `next` lowers the quantity of (or drops) any existing line
pub fn reduces(existing: &[DraftItem], next: &[(i64, i64)]) -> bool {
    existing.iter().any(|line| {
        let new_qty = next
            .iter()
            .find(|(id, _)| *id == line.meal_id)
            .map(|(_, qty)| *qty)
            .unwrap_or(0);
        new_qty < line.quantity
    })
}

/// Price merged lines from the menu; unknown or inactive meals are rejected
pub async fn price_lines(state: &ServerState, merged: &[(i64, i64)]) -> AppResult<Vec<DraftItem>> {
    let ids: Vec<i64> = merged.iter().map(|(id, _)| *id).collect();
    let meals = {
        let mut conn = state.pool.acquire().await.map_err(db_error)?;
        draft_order::resolve_meals(&mut conn, &ids).await?
    };

    merged
        .iter()
        .map(|(meal_id, quantity)| {
            let meal = meals.get(meal_id).ok_or_else(|| {
                AppError::validation(format!("Meal {meal_id} does not exist")).with_detail("meal_id", *meal_id)
            })?;
            if !meal.is_active {
                return Err(AppError::with_message(
                    ErrorCode::MealInactive,
                    format!("Meal '{}' is not active", meal.name),
                )
                .with_detail("meal_id", *meal_id));
            }
            let (totals, unit_price) = (
                money::order_totals(&[(meal.price, *quantity)], 0.0, 0.0),
                money::round_money(meal.price),
            );
            Ok(DraftItem {
                meal_id: *meal_id,
                product_name: display_name(&meal.name, meal.name_ar.as_deref()),
                unit_price,
                quantity: *quantity,
                line_total: totals.subtotal,
            })
        })
        .collect()
}

/// Attach computed totals
pub fn to_view(draft: DraftOrder) -> DraftView {
    let lines: Vec<(f64, i64)> = draft.items.iter().map(|i| (i.unit_price, i.quantity)).collect();
    let totals = money::order_totals(&lines, draft.tax_pct, draft.discount_pct);
    DraftView { draft, totals }
}

fn not_open(draft: &DraftOrder) -> AppError {
    AppError::with_message(
        ErrorCode::DraftNotOpen,
        format!("Draft {} is {:?}, not open", draft.id, draft.status),
    )
    .with_detail("draft_id", draft.id)
}

fn draft_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::DraftNotFound, format!("Draft {id} not found")).with_detail("draft_id", id)
}

/// Discount of an active customer found by phone
pub(crate) async fn customer_discount(state: &ServerState, phone: Option<&str>) -> AppResult<Option<f64>> {
    let Some(phone) = phone else {
        return Ok(None);
    };
    Ok(customer::find_by_phone(&state.pool, phone)
        .await?
        .filter(|c| c.is_active)
        .map(|c| c.discount_percent))
}

async fn resolve_fields(
    state: &ServerState,
    existing: Option<&DraftOrder>,
    req: &DraftSave,
) -> AppResult<DraftFields> {
    let requested_phone = normalize_optional(req.customer_phone.clone());
    let phone_changed = requested_phone.is_some()
        && requested_phone.as_deref() != existing.and_then(|d| d.customer_phone.as_deref());

    let customer_name = normalize_optional(req.customer_name.clone())
        .or_else(|| existing.and_then(|d| d.customer_name.clone()));
    let customer_phone = requested_phone.or_else(|| existing.and_then(|d| d.customer_phone.clone()));

    let tax_pct = match (req.tax_pct, existing) {
        (Some(pct), _) => pct,
        (None, Some(d)) => d.tax_pct,
        (None, None) => settings::vat_rate(&state.pool).await?,
    };

    let kept_discount = existing.map(|d| d.discount_pct).unwrap_or(0.0);
    let discount_pct = match req.discount_pct {
        Some(pct) => pct,
        None if existing.is_none() || phone_changed => customer_discount(state, customer_phone.as_deref())
            .await?
            .unwrap_or(kept_discount),
        None => kept_discount,
    };

    let payment_method = req
        .payment_method
        .map(|m| m.as_str().to_string())
        .or_else(|| existing.and_then(|d| d.payment_method.clone()));

    Ok(DraftFields {
        customer_name,
        customer_phone,
        discount_pct,
        tax_pct,
        payment_method,
    })
}

/// GET: active draft of a table with totals
pub async fn get(
    state: &ServerState,
    user: &CurrentUser,
    branch_code: &str,
    table_number: i64,
) -> AppResult<Option<DraftView>> {
    require_branch(state, branch_code).await?;
    ensure_branch_permission(user, "sales:view", branch_code)?;
    let mut conn = state.pool.acquire().await.map_err(db_error)?;
    let draft = draft_order::find_active(&mut conn, branch_code, table_number).await?;
    Ok(draft.map(to_view))
}

/// PUT: upsert the draft of a table
pub async fn save(
    state: &ServerState,
    user: &CurrentUser,
    branch_code: &str,
    table_number: i64,
    req: DraftSave,
) -> AppResult<DraftSaveResult> {
    require_branch(state, branch_code).await?;
    ensure_branch_permission(user, "sales:add", branch_code)?;
    require_table(state, branch_code, table_number).await?;
    if let Some(pct) = req.discount_pct {
        validate_percent(pct, "discount_pct")?;
    }
    if let Some(pct) = req.tax_pct {
        validate_percent(pct, "tax_pct")?;
    }
    validate_optional_text(&req.customer_name, "customer_name", MAX_NAME_LEN)?;
    validate_optional_text(&req.customer_phone, "customer_phone", MAX_SHORT_TEXT_LEN)?;
    let merged = merge_inputs(&req.items)?;

    let _guard = state.sales_lock.lock().await;

    let existing = {
        let mut conn = state.pool.acquire().await.map_err(db_error)?;
        draft_order::find_active(&mut conn, branch_code, table_number).await?
    };

    if let Some(d) = &existing
        && d.status != DraftStatus::Open
    {
        return Err(not_open(d));
    }

    let current_version = existing.as_ref().map(|d| d.version).unwrap_or(0);
    if let Some(expected) = req.expected_version
        && expected != current_version
    {
        tracing::info!(
            branch = %branch_code,
            table = table_number,
            expected,
            current_version,
            "Draft version conflict"
        );
        return Err(AppError::with_message(
            ErrorCode::DraftVersionConflict,
            format!("Draft was changed elsewhere (expected version {expected}, current {current_version})"),
        )
        .with_detail("current_version", current_version));
    }

    if let Some(d) = &existing
        && reduces(&d.items, &merged)
    {
        supervisor::require(state, user, req.supervisor_password.as_deref(), "reduce_draft").await?;
    }

    if merged.is_empty() {
        let Some(d) = existing else {
            return Ok(DraftSaveResult {
                draft: None,
                deleted: false,
            });
        };
        {
            let mut conn = state.pool.acquire().await.map_err(db_error)?;
            draft_order::delete(&mut conn, d.id).await?;
        }
        tracing::info!(draft_id = d.id, branch = %branch_code, table = table_number, "Emptied draft deleted");
        state
            .broadcast_branch_sync::<()>(DRAFT_RESOURCE, "deleted", &d.id.to_string(), branch_code, None)
            .await;
        broadcast_table(state, branch_code, table_number).await;
        return Ok(DraftSaveResult {
            draft: None,
            deleted: true,
        });
    }

    let items = price_lines(state, &merged).await?;
    let fields = resolve_fields(state, existing.as_ref(), &req).await?;

    let mut tx = state.pool.begin().await.map_err(db_error)?;
    let id = match &existing {
        Some(d) => {
            draft_order::update(&mut tx, d.id, &fields, &items).await?;
            d.id
        }
        None => {
            draft_order::insert(&mut tx, branch_code, table_number, &fields, &items, Some(user.id)).await?
        }
    };
    let saved = draft_order::find_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| draft_not_found(id))?;
    tx.commit().await.map_err(db_error)?;

    let view = to_view(saved);
    let action = if existing.is_some() { "updated" } else { "created" };
    tracing::debug!(
        draft_id = id,
        version = view.draft.version,
        items = view.draft.items.len(),
        total = view.totals.total_amount,
        "Draft {}",
        action
    );
    state
        .broadcast_branch_sync(DRAFT_RESOURCE, action, &id.to_string(), branch_code, Some(&view))
        .await;
    if existing.is_none() {
        broadcast_table(state, branch_code, table_number).await;
    }

    Ok(DraftSaveResult {
        draft: Some(view),
        deleted: false,
    })
}

/// POST cancel: supervisor-gated, frees the table
pub async fn cancel(state: &ServerState, user: &CurrentUser, draft_id: i64, req: DraftCancel) -> AppResult<DraftOrder> {
    let _guard = state.sales_lock.lock().await;

    let draft = {
        let mut conn = state.pool.acquire().await.map_err(db_error)?;
        draft_order::find_by_id(&mut conn, draft_id).await?
    }
    .ok_or_else(|| draft_not_found(draft_id))?;
    ensure_branch_permission(user, "sales:delete", &draft.branch_code)?;
    if draft.status != DraftStatus::Open {
        return Err(not_open(&draft));
    }
    supervisor::require(state, user, req.supervisor_password.as_deref(), "cancel_draft").await?;

    let cancelled = {
        let mut conn = state.pool.acquire().await.map_err(db_error)?;
        draft_order::set_status(&mut conn, draft_id, DraftStatus::Cancelled).await?;
        draft_order::find_by_id(&mut conn, draft_id).await?
    }
    .ok_or_else(|| draft_not_found(draft_id))?;

    tracing::info!(
        draft_id,
        branch = %draft.branch_code,
        table = draft.table_number,
        user = %user.username,
        "Draft cancelled"
    );
    state
        .broadcast_branch_sync(
            DRAFT_RESOURCE,
            "cancelled",
            &draft_id.to_string(),
            &draft.branch_code,
            Some(&cancelled),
        )
        .await;
    broadcast_table(state, &draft.branch_code, draft.table_number).await;
    Ok(cancelled)
}

/// Kitchen / pre-bill preview of a table's draft
pub async fn preview(
    state: &ServerState,
    user: &CurrentUser,
    branch_code: &str,
    table_number: i64,
) -> AppResult<OrderPreview> {
    let branch = require_branch(state, branch_code).await?;
    ensure_branch_permission(user, "sales:print", branch_code)?;
    let draft = {
        let mut conn = state.pool.acquire().await.map_err(db_error)?;
        draft_order::find_active(&mut conn, branch_code, table_number).await?
    }
    .ok_or_else(|| {
        AppError::with_message(
            ErrorCode::DraftNotFound,
            format!("No draft on table {table_number} in '{branch_code}'"),
        )
    })?;
    let settings = settings::get(&state.pool).await?;
    Ok(OrderPreview {
        settings,
        branch_label: branch.label,
        draft: to_view(draft),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestEnv, admin};

    fn input(meal_id: i64, quantity: i64) -> DraftItemInput {
        DraftItemInput { meal_id, quantity }
    }

    fn line(meal_id: i64, quantity: i64) -> DraftItem {
        DraftItem {
            meal_id,
            product_name: String::new(),
            unit_price: 1.0,
            quantity,
            line_total: quantity as f64,
        }
    }

    #[test]
    fn duplicates_are_merged_in_order() {
        let merged = merge_inputs(&[input(3, 1), input(1, 2), input(3, 4)]).unwrap();
        assert_eq!(merged, vec![(3, 5), (1, 2)]);
    }

    #[test]
    fn merged_quantity_is_capped() {
        let err = merge_inputs(&[input(1, 9000), input(1, 1000)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidQuantity);
        let err = merge_inputs(&[input(1, 0)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidQuantity);
    }

    #[test]
    fn reduction_detection() {
        let existing = vec![line(1, 2), line(2, 1)];
        assert!(!reduces(&existing, &[(1, 2), (2, 1), (3, 1)]));
        assert!(!reduces(&existing, &[(1, 3), (2, 1)]));
        assert!(reduces(&existing, &[(1, 1), (2, 1)]));
        assert!(reduces(&existing, &[(1, 2)]));
        assert!(!reduces(&[], &[]));
    }

    fn save_req(items: Vec<DraftItemInput>) -> DraftSave {
        DraftSave {
            items,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn first_save_creates_version_one_with_vat_default() {
        let env = TestEnv::new().await;
        let meal = env.meal("Shawarma", 12.5).await;
        let result = save(&env.state, &admin(), "china_town", 1, save_req(vec![input(meal, 2)]))
            .await
            .unwrap();
        let view = result.draft.unwrap();
        assert_eq!(view.draft.version, 1);
        assert_eq!(view.draft.tax_pct, 15.0);
        assert_eq!(view.totals.subtotal, 25.0);
        assert_eq!(view.totals.tax_amount, 3.75);
        assert_eq!(view.totals.total_amount, 28.75);
    }

    #[tokio::test]
    async fn stale_version_is_a_conflict() {
        let env = TestEnv::new().await;
        let meal = env.meal("Shawarma", 10.0).await;
        save(&env.state, &admin(), "china_town", 1, save_req(vec![input(meal, 1)]))
            .await
            .unwrap();
        save(&env.state, &admin(), "china_town", 1, save_req(vec![input(meal, 2)]))
            .await
            .unwrap();

        let mut req = save_req(vec![input(meal, 3)]);
        req.expected_version = Some(1);
        let err = save(&env.state, &admin(), "china_town", 1, req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DraftVersionConflict);
        let details = err.details.unwrap();
        assert_eq!(details["current_version"], 2);
    }

    #[tokio::test]
    async fn reduction_requires_supervisor() {
        let env = TestEnv::new().await;
        let meal = env.meal("Kabsa", 30.0).await;
        save(&env.state, &admin(), "china_town", 2, save_req(vec![input(meal, 3)]))
            .await
            .unwrap();

        let err = save(&env.state, &admin(), "china_town", 2, save_req(vec![input(meal, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SupervisorPasswordRequired);

        let mut req = save_req(vec![input(meal, 1)]);
        req.supervisor_password = Some("0000".into());
        let err = save(&env.state, &admin(), "china_town", 2, req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SupervisorPasswordInvalid);

        let mut req = save_req(vec![input(meal, 1)]);
        req.supervisor_password = Some("1991".into());
        let view = save(&env.state, &admin(), "china_town", 2, req)
            .await
            .unwrap()
            .draft
            .unwrap();
        assert_eq!(view.draft.items[0].quantity, 1);
        assert_eq!(view.draft.version, 2);
    }

    #[tokio::test]
    async fn empty_save_deletes_draft() {
        let env = TestEnv::new().await;
        let meal = env.meal("Tea", 2.0).await;
        save(&env.state, &admin(), "china_town", 3, save_req(vec![input(meal, 1)]))
            .await
            .unwrap();

        let mut req = save_req(vec![]);
        req.supervisor_password = Some("1991".into());
        let result = save(&env.state, &admin(), "china_town", 3, req).await.unwrap();
        assert!(result.deleted);
        assert!(get(&env.state, &admin(), "china_town", 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_meal_and_branch_are_rejected() {
        let env = TestEnv::new().await;
        let err = save(&env.state, &admin(), "china_town", 1, save_req(vec![input(999, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let err = save(&env.state, &admin(), "nowhere", 1, save_req(vec![]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BranchNotFound);
    }

    #[tokio::test]
    async fn customer_discount_applies_to_new_draft() {
        let env = TestEnv::new().await;
        let meal = env.meal("Biryani", 100.0).await;
        customer::create(
            &env.state.pool,
            &shared::models::CustomerCreate {
                name: "Regular".into(),
                phone: Some("0500000001".into()),
                discount_percent: 10.0,
            },
        )
        .await
        .unwrap();

        let mut req = save_req(vec![input(meal, 1)]);
        req.customer_phone = Some("0500000001".into());
        req.tax_pct = Some(0.0);
        let view = save(&env.state, &admin(), "china_town", 4, req)
            .await
            .unwrap()
            .draft
            .unwrap();
        assert_eq!(view.draft.discount_pct, 10.0);
        assert_eq!(view.totals.total_amount, 90.0);
    }

    #[tokio::test]
    async fn cancel_frees_table() {
        let env = TestEnv::new().await;
        let meal = env.meal("Juice", 8.0).await;
        let draft = save(&env.state, &admin(), "china_town", 5, save_req(vec![input(meal, 1)]))
            .await
            .unwrap()
            .draft
            .unwrap();

        let err = cancel(&env.state, &admin(), draft.draft.id, DraftCancel::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SupervisorPasswordRequired);

        let cancelled = cancel(
            &env.state,
            &admin(),
            draft.draft.id,
            DraftCancel {
                supervisor_password: Some("1991".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(cancelled.status, DraftStatus::Cancelled);
        assert!(get(&env.state, &admin(), "china_town", 5).await.unwrap().is_none());
    }
}
