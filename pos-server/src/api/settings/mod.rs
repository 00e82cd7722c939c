//! Settings API Module
//!
//! 公司信息、小票选项、分店名称与主管密码。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

/// Settings router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/settings", routes())
}

fn routes() -> Router<ServerState> {
    // 读取：POS 小票抬头也需要，登录即可
    let read_routes = Router::new().route("/", get(handler::get));

    let edit_routes = Router::new()
        .route("/", put(handler::update))
        .route("/supervisor-password", put(handler::change_supervisor_password))
        .layer(middleware::from_fn(require_permission("settings:edit")));

    read_routes.merge(edit_routes)
}
