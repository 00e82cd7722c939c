//! Expense Invoice API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/expenses", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_permission("expenses:view")));

    let add_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_permission("expenses:add")));

    let delete_routes = Router::new()
        .route("/{id}", axum::routing::delete(handler::delete))
        .layer(middleware::from_fn(require_permission("expenses:delete")));

    read_routes.merge(add_routes).merge(delete_routes)
}
