//! Salary / Payroll API Module
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/salaries?month=YYYY-MM | GET | salaries:view |
//! | /api/salaries | PUT | salaries:edit |
//! | /api/payroll/pay | POST | salaries:add |
//! | /api/payroll/pay-bulk | POST | salaries:add |
//! | /api/payroll/pay-summary | GET | salaries:view |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/api/salaries", get(handler::list_salaries))
        .route("/api/payroll/pay-summary", get(handler::pay_summary))
        .layer(middleware::from_fn(require_permission("salaries:view")));

    let edit_routes = Router::new()
        .route("/api/salaries", put(handler::upsert_salary))
        .layer(middleware::from_fn(require_permission("salaries:edit")));

    let pay_routes = Router::new()
        .route("/api/payroll/pay", post(handler::pay))
        .route("/api/payroll/pay-bulk", post(handler::pay_bulk))
        .layer(middleware::from_fn(require_permission("salaries:add")));

    read_routes.merge(edit_routes).merge(pay_routes)
}
