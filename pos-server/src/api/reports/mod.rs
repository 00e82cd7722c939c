//! Report API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/reports/summary | GET | 营业概览 |
//! | /api/reports/sales | GET | 销售明细 |
//! | /api/reports/purchases | GET | 采购明细 |
//! | /api/reports/expenses | GET | 费用明细 |
//! | /api/reports/payroll | GET | 工资汇总 |
//! | /api/reports/payroll/{employee_id} | GET | 员工工资单 |
//!
//! 全部需要 `reports:view`；按分店过滤时校验分店范围。

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reports", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/summary", get(handler::summary))
        .route("/sales", get(handler::sales))
        .route("/purchases", get(handler::purchases))
        .route("/expenses", get(handler::expenses))
        .route("/payroll", get(handler::payroll))
        .route("/payroll/{employee_id}", get(handler::payroll_statement))
        .layer(middleware::from_fn(require_permission("reports:view")))
}
