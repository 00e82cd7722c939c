//! User API Module
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/users | GET | users:view |
//! | /api/users | POST | users:add |
//! | /api/users/{id} | PUT | users:edit |
//! | /api/users/{id} | DELETE | users:delete |
//! | /api/users/{id}/permissions | GET | users:view |
//! | /api/users/{id}/permissions | PUT | users:edit |

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

/// User router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/users", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}/permissions", get(handler::get_permissions))
        .layer(middleware::from_fn(require_permission("users:view")));

    let add_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_permission("users:add")));

    let edit_routes = Router::new()
        .route("/{id}", put(handler::update))
        .route("/{id}/permissions", put(handler::replace_permissions))
        .layer(middleware::from_fn(require_permission("users:edit")));

    let delete_routes = Router::new()
        .route("/{id}", delete(handler::delete))
        .layer(middleware::from_fn(require_permission("users:delete")));

    read_routes
        .merge(add_routes)
        .merge(edit_routes)
        .merge(delete_routes)
}
