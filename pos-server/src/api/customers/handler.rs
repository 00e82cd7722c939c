//! Customer API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{Customer, CustomerCreate, CustomerUpdate};

use crate::core::ServerState;
use crate::db::repository::customer;
use crate::utils::AppResult;
use crate::utils::types::PaginationParams;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_percent, validate_required_text,
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// List customers by name
pub async fn list(State(state): State<ServerState>, Query(query): Query<ListQuery>) -> AppResult<Json<Vec<Customer>>> {
    let params = PaginationParams::from_query(query.page, query.limit);
    Ok(Json(customer::find_all(&state.pool, params.offset(), params.limit()).await?))
}

/// Name or phone substring match, at most 10 results
pub async fn search(
    State(state): State<ServerState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Customer>>> {
    Ok(Json(customer::search(&state.pool, &query.q).await?))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CustomerCreate>,
) -> AppResult<Json<Customer>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_percent(payload.discount_percent, "discount_percent")?;

    let created = customer::create(&state.pool, &payload).await?;
    tracing::info!(customer_id = created.id, name = %created.name, "Customer created");
    Ok(Json(created))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CustomerUpdate>,
) -> AppResult<Json<Customer>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    if let Some(pct) = payload.discount_percent {
        validate_percent(pct, "discount_percent")?;
    }
    Ok(Json(customer::update(&state.pool, id, &payload).await?))
}
