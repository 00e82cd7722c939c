//! Payment API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .layer(middleware::from_fn(require_permission("payments:view")));

    let add_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_permission("payments:add")));

    read_routes.merge(add_routes)
}
