//! Draft Order API Module
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/drafts/{branch}/{table} | GET | sales:view |
//! | /api/drafts/{branch}/{table} | PUT | sales:add |
//! | /api/drafts/{id}/checkout | POST | sales:add |
//! | /api/drafts/{id}/cancel | POST | sales:delete |
//! | /api/print/order-preview/{branch}/{table} | GET | sales:print |
//!
//! 分店范围的权限 (`sales:add@china_town`) 在服务层按草稿单所属分店校验。
//!
//! 第一段路径参数统一命名为 `{key}` (分店代码或草稿单 ID)，同一位置的参数名必须一致。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/api/drafts/{key}/{table}", get(handler::get))
        .layer(middleware::from_fn(require_permission("sales:view")));

    let add_routes = Router::new()
        .route("/api/drafts/{key}/{table}", put(handler::save))
        .route("/api/drafts/{key}/checkout", post(handler::checkout))
        .layer(middleware::from_fn(require_permission("sales:add")));

    let delete_routes = Router::new()
        .route("/api/drafts/{key}/cancel", post(handler::cancel))
        .layer(middleware::from_fn(require_permission("sales:delete")));

    let print_routes = Router::new()
        .route("/api/print/order-preview/{branch}/{table}", get(handler::preview))
        .layer(middleware::from_fn(require_permission("sales:print")));

    read_routes
        .merge(add_routes)
        .merge(delete_routes)
        .merge(print_routes)
}
