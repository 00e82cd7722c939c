//! Settings API Handlers

use axum::{
    Json,
    extract::{Extension, State},
};
use serde::Serialize;
use shared::models::{Branch, Settings, SettingsUpdate, SupervisorPasswordChange};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{branch, settings};
use crate::sales::supervisor;
use crate::utils::types::AckResponse;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN,
    validate_optional_text, validate_percent,
};
use crate::utils::{AppError, AppResult, ErrorCode};

const RESOURCE: &str = "settings";

/// Settings plus branch labels
#[derive(Debug, Serialize)]
pub struct SettingsView {
    #[serde(flatten)]
    pub settings: Settings,
    pub branches: Vec<Branch>,
}

async fn view(state: &ServerState) -> AppResult<SettingsView> {
    Ok(SettingsView {
        settings: settings::get(&state.pool).await?,
        branches: branch::find_all(&state.pool).await?,
    })
}

fn validate(payload: &SettingsUpdate) -> AppResult<()> {
    validate_optional_text(&payload.company_name, "company_name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.tax_number, "tax_number", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.address, "address", MAX_ADDRESS_LEN)?;
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.email, "email", MAX_EMAIL_LEN)?;
    validate_optional_text(&payload.currency, "currency", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.logo_url, "logo_url", MAX_URL_LEN)?;
    validate_optional_text(&payload.receipt_footer_text, "receipt_footer_text", MAX_NOTE_LEN)?;
    if let Some(rate) = payload.vat_rate {
        validate_percent(rate, "vat_rate")?;
    }
    if let Some(width) = payload.receipt_paper_width
        && width != 80
        && width != 58
    {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("receipt_paper_width must be 80 or 58, got {width}"),
        ));
    }
    let margins = [
        ("receipt_margin_top_mm", payload.receipt_margin_top_mm),
        ("receipt_margin_bottom_mm", payload.receipt_margin_bottom_mm),
        ("receipt_margin_left_mm", payload.receipt_margin_left_mm),
        ("receipt_margin_right_mm", payload.receipt_margin_right_mm),
    ];
    for (field, value) in margins {
        if let Some(v) = value
            && !(0..=50).contains(&v)
        {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                format!("{field} must be between 0 and 50, got {v}"),
            )
            .with_detail("field", field));
        }
    }
    if let Some(size) = payload.receipt_font_size
        && !(6..=32).contains(&size)
    {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("receipt_font_size must be between 6 and 32, got {size}"),
        ));
    }
    if let Some(label) = payload.branch_labels.iter().find(|l| l.label.len() > MAX_NAME_LEN) {
        return Err(AppError::validation(format!("Label of branch '{}' is too long", label.code))
            .with_detail("branch", label.code.clone()));
    }
    Ok(())
}

/// Get settings
pub async fn get(State(state): State<ServerState>) -> AppResult<Json<SettingsView>> {
    Ok(Json(view(&state).await?))
}

/// Update settings and branch labels
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<SettingsUpdate>,
) -> AppResult<Json<SettingsView>> {
    validate(&payload)?;
    for label in &payload.branch_labels {
        let name = label.label.trim();
        if name.is_empty() {
            continue;
        }
        if !branch::update_label(&state.pool, &label.code, name).await? {
            return Err(AppError::with_message(
                ErrorCode::BranchNotFound,
                format!("Branch '{}' not found", label.code),
            )
            .with_detail("branch", label.code.clone()));
        }
    }
    settings::update(&state.pool, &payload).await?;

    let updated = view(&state).await?;
    tracing::info!(
        company = %updated.settings.company_name,
        user = %current_user.username,
        "Settings updated"
    );
    state
        .broadcast_sync(RESOURCE, "updated", "main", Some(&updated))
        .await;
    Ok(Json(updated))
}

/// Change the supervisor password (the hash never leaves the server)
pub async fn change_supervisor_password(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<SupervisorPasswordChange>,
) -> AppResult<Json<AckResponse>> {
    supervisor::change(
        &state,
        &current_user,
        &payload.current_password,
        &payload.new_password,
    )
    .await?;
    Ok(Json(AckResponse::ok()))
}
