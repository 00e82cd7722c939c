//! Employee API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

/// Employee router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/employees", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_permission("employees:view")));

    let add_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_permission("employees:add")));

    let edit_routes = Router::new()
        .route("/{id}", put(handler::update))
        .route("/{id}/salary-default", put(handler::salary_default))
        .layer(middleware::from_fn(require_permission("employees:edit")));

    // 删除员工会连带删除其工资记录
    let delete_routes = Router::new()
        .route("/{id}", axum::routing::delete(handler::delete))
        .layer(middleware::from_fn(require_permission("employees:delete")));

    read_routes
        .merge(add_routes)
        .merge(edit_routes)
        .merge(delete_routes)
}
