//! Sales Invoice API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/invoices", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_permission("sales:view")));

    let print_routes = Router::new()
        .route("/{id}/receipt", get(handler::receipt))
        .route("/{id}/confirm-print", post(handler::confirm_print))
        .layer(middleware::from_fn(require_permission("sales:print")));

    let delete_routes = Router::new()
        .route("/{id}/void", post(handler::void))
        .layer(middleware::from_fn(require_permission("sales:delete")));

    read_routes.merge(print_routes).merge(delete_routes)
}
