//! Raw Material API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{RawMaterial, RawMaterialCreate, RawMaterialUpdate};

use crate::core::ServerState;
use crate::db::repository::raw_material;
use crate::utils::AppResult;
use crate::utils::types::DeleteResponse;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_amount, validate_optional_text, validate_required_text,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// List raw materials
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<RawMaterial>>> {
    Ok(Json(raw_material::find_all(&state.pool, query.include_inactive).await?))
}

/// Create a raw material
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<RawMaterialCreate>,
) -> AppResult<Json<RawMaterial>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.name_ar, "name_ar", MAX_NAME_LEN)?;
    validate_required_text(&payload.unit, "unit", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.category, "category", MAX_NAME_LEN)?;
    validate_amount(payload.cost_per_unit, "cost_per_unit")?;
    validate_amount(payload.stock_quantity, "stock_quantity")?;

    let created = raw_material::create(&state.pool, &payload).await?;
    tracing::info!(raw_material_id = created.id, name = %created.name, "Raw material created");
    Ok(Json(created))
}

/// Update a raw material
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<RawMaterialUpdate>,
) -> AppResult<Json<RawMaterial>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(unit) = &payload.unit {
        validate_required_text(unit, "unit", MAX_SHORT_TEXT_LEN)?;
    }
    validate_optional_text(&payload.name_ar, "name_ar", MAX_NAME_LEN)?;
    validate_optional_text(&payload.category, "category", MAX_NAME_LEN)?;
    if let Some(cost) = payload.cost_per_unit {
        validate_amount(cost, "cost_per_unit")?;
    }
    if let Some(stock) = payload.stock_quantity {
        validate_amount(stock, "stock_quantity")?;
    }

    Ok(Json(raw_material::update(&state.pool, id, &payload).await?))
}

/// Delete a raw material (refused while meals or purchases reference it)
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<DeleteResponse>> {
    raw_material::delete(&state.pool, id).await?;
    tracing::info!(raw_material_id = id, "Raw material deleted");
    Ok(Json(DeleteResponse { deleted: true }))
}
