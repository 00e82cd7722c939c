//! Menu API Module
//!
//! 菜单分类 (POS 标签页) 与分类下的菜品。读取供 POS 网格使用，登录即可。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

/// Menu router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/menu", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/categories", get(handler::list_categories))
        .route("/categories/{id}/items", get(handler::list_items));

    let add_routes = Router::new()
        .route("/categories", post(handler::create_category))
        .route("/categories/{id}/items", post(handler::create_item))
        .layer(middleware::from_fn(require_permission("menu:add")));

    let edit_routes = Router::new()
        .route("/categories/{id}", put(handler::update_category))
        .route("/items/{id}", put(handler::update_item))
        .layer(middleware::from_fn(require_permission("menu:edit")));

    let delete_routes = Router::new()
        .route("/categories/{id}", axum::routing::delete(handler::delete_category))
        .route("/items/{id}", axum::routing::delete(handler::delete_item))
        .layer(middleware::from_fn(require_permission("menu:delete")));

    read_routes
        .merge(add_routes)
        .merge(edit_routes)
        .merge(delete_routes)
}
