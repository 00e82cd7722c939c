//! POS Sales API Module
//!
//! - `POST /api/sales/checkout` - 直接结账 (不经草稿单)
//! - `POST /api/sales/void-check` - 主管密码校验 (减量/作废前)

mod handler;

use axum::{Router, middleware, routing::post};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/sales", routes())
}

fn routes() -> Router<ServerState> {
    let add_routes = Router::new()
        .route("/checkout", post(handler::direct_checkout))
        .layer(middleware::from_fn(require_permission("sales:add")));

    let check_routes = Router::new()
        .route("/void-check", post(handler::void_check))
        .layer(middleware::from_fn(require_permission("sales:view")));

    add_routes.merge(check_routes)
}
