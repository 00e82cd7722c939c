//! 销售流程
//!
//! 草稿单保存 → 结账 → 打印 → 确认，全部以服务端为准：
//!
//! - [`draft`] - 草稿单保存、取消、预结单
//! - [`checkout`] - 结账、直接结账、打印确认、作废、小票
//! - [`supervisor`] - 主管密码校验 (减量、取消、作废)
//! - [`stale`] - 滞留草稿单检测 (后台任务)
//!
//! 所有写操作持有 `ServerState::sales_lock`，同一时刻只有一个销售写事务。

pub mod checkout;
pub mod draft;
pub mod stale;
pub mod supervisor;

pub use stale::StaleDraftWatcher;

use shared::models::{Branch, TableStatusView};

use crate::core::ServerState;
use crate::db::repository::branch;
use crate::utils::{AppError, AppResult, ErrorCode};

pub(crate) const DRAFT_RESOURCE: &str = "draft";
pub(crate) const TABLE_RESOURCE: &str = "table";
pub(crate) const INVOICE_RESOURCE: &str = "invoice";
pub(crate) const PAYMENT_RESOURCE: &str = "payment";

/// 分店必须存在 (来自配置)
pub async fn require_branch(state: &ServerState, code: &str) -> AppResult<Branch> {
    branch::find(&state.pool, code)
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::BranchNotFound, format!("Branch '{code}' not found"))
                .with_detail("branch", code)
        })
}

/// 桌台必须存在于分店
pub async fn require_table(state: &ServerState, code: &str, table_number: i64) -> AppResult<()> {
    if branch::table_exists(&state.pool, code, table_number).await? {
        return Ok(());
    }
    Err(AppError::with_message(
        ErrorCode::TableNotFound,
        format!("Table {table_number} not found in branch '{code}'"),
    )
    .with_detail("table_number", table_number))
}

/// 广播桌台最新状态
pub(crate) async fn broadcast_table(state: &ServerState, code: &str, table_number: i64) {
    let id = format!("{code}:{table_number}");
    match branch::table_status(&state.pool, code, table_number).await {
        Ok(Some(view)) => {
            let action = match view.status {
                shared::models::TableStatus::Occupied => "occupied",
                shared::models::TableStatus::Available => "available",
            };
            state
                .broadcast_branch_sync::<TableStatusView>(TABLE_RESOURCE, action, &id, code, Some(&view))
                .await;
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(table = %id, error = %e, "Failed to read table status for broadcast"),
    }
}
