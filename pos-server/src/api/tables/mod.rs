//! Table / Layout API 模块
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/branches | GET | 登录即可 |
//! | /api/tables/{branch} | GET | tables:view |
//! | /api/table-layout/{branch} | GET | tables:view |
//! | /api/table-layout/{branch} | POST | tables:edit |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/api/tables/{branch}", get(handler::statuses))
        .route("/api/table-layout/{branch}", get(handler::get_layout))
        .layer(middleware::from_fn(require_permission("tables:view")));

    let manage_routes = Router::new()
        .route("/api/table-layout/{branch}", post(handler::save_layout))
        .layer(middleware::from_fn(require_permission("tables:edit")));

    Router::new()
        .route("/api/branches", get(handler::branches))
        .merge(read_routes)
        .merge(manage_routes)
}
