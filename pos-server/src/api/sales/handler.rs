//! POS Sales API Handlers

use axum::{
    Extension, Json,
    extract::State,
};
use shared::models::{CheckoutResponse, DirectCheckoutRequest, SupervisorCheck, SupervisorCheckResult};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::sales::{checkout, supervisor};
use crate::security_log;
use crate::utils::AppResult;

pub async fn direct_checkout(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<DirectCheckoutRequest>,
) -> AppResult<Json<CheckoutResponse>> {
    Ok(Json(checkout::direct_checkout(&state, &user, payload).await?))
}

/// Supervisor password check; a wrong password is `ok: false`, not an error
pub async fn void_check(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<SupervisorCheck>,
) -> AppResult<Json<SupervisorCheckResult>> {
    let ok = supervisor::check(&state, payload.password.trim()).await?;
    if !ok {
        security_log!(
            "WARN",
            "supervisor_check_failed",
            user_id = user.id,
            username = user.username.clone()
        );
    }
    Ok(Json(SupervisorCheckResult { ok }))
}
