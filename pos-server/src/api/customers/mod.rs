//! Customer API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

/// Customer router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/customers", routes())
}

fn routes() -> Router<ServerState> {
    // POS 结账时按电话/姓名查找客户
    let search_routes = Router::new()
        .route("/search", get(handler::search))
        .layer(middleware::from_fn(require_permission("sales:view")));

    let read_routes = Router::new()
        .route("/", get(handler::list))
        .layer(middleware::from_fn(require_permission("customers:view")));

    let add_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_permission("customers:add")));

    let edit_routes = Router::new()
        .route("/{id}", put(handler::update))
        .layer(middleware::from_fn(require_permission("customers:edit")));

    search_routes
        .merge(read_routes)
        .merge(add_routes)
        .merge(edit_routes)
}
