//! Meal API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

/// Meal router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/meals", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_permission("menu:view")));

    let add_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_permission("menu:add")));

    let edit_routes = Router::new()
        .route("/{id}", put(handler::update))
        .layer(middleware::from_fn(require_permission("menu:edit")));

    let delete_routes = Router::new()
        .route("/{id}", axum::routing::delete(handler::delete))
        .layer(middleware::from_fn(require_permission("menu:delete")));

    read_routes
        .merge(add_routes)
        .merge(edit_routes)
        .merge(delete_routes)
}
