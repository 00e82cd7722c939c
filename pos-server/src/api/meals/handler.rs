//! Meal API Handlers
//!
//! Cost and selling price are derived server-side from the ingredient list.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{Meal, MealCreate, MealIngredientInput, MealUpdate};

use crate::billing::money::MAX_PRICE;
use crate::core::ServerState;
use crate::db::repository::meal;
use crate::utils::types::DeleteResponse;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_amount, validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

fn validate_price(price: Option<f64>) -> AppResult<()> {
    if let Some(p) = price {
        validate_amount(p, "selling_price")?;
        if p > MAX_PRICE {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                format!("selling_price must be at most {MAX_PRICE}"),
            ));
        }
    }
    Ok(())
}

fn validate_margin(margin: Option<f64>) -> AppResult<()> {
    if let Some(m) = margin {
        validate_amount(m, "profit_margin_percent")?;
    }
    Ok(())
}

fn validate_ingredients(ingredients: &[MealIngredientInput]) -> AppResult<()> {
    for ingredient in ingredients {
        if !ingredient.quantity.is_finite() || ingredient.quantity <= 0.0 {
            return Err(AppError::with_message(
                ErrorCode::InvalidQuantity,
                format!("Ingredient quantity must be greater than 0, got {}", ingredient.quantity),
            )
            .with_detail("raw_material_id", ingredient.raw_material_id));
        }
    }
    Ok(())
}

/// List meals
pub async fn list(State(state): State<ServerState>, Query(query): Query<ListQuery>) -> AppResult<Json<Vec<Meal>>> {
    Ok(Json(meal::find_all(&state.pool, query.include_inactive).await?))
}

/// Get a meal with its ingredients
pub async fn get_by_id(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<Meal>> {
    let found = meal::find_by_id(&state.pool, id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::MealNotFound, format!("Meal {id} not found")).with_detail("id", id)
    })?;
    Ok(Json(found))
}

/// Create a meal
pub async fn create(State(state): State<ServerState>, Json(payload): Json<MealCreate>) -> AppResult<Json<Meal>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.name_ar, "name_ar", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&payload.category, "category", MAX_NAME_LEN)?;
    validate_price(payload.selling_price)?;
    validate_margin(payload.profit_margin_percent)?;
    validate_ingredients(&payload.ingredients)?;

    let created = meal::create(&state.pool, &payload).await?;
    tracing::info!(
        meal_id = created.id,
        name = %created.name,
        cost = created.total_cost,
        price = created.selling_price,
        "Meal created"
    );
    Ok(Json(created))
}

/// Update a meal; a new ingredient list re-derives cost
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<MealUpdate>,
) -> AppResult<Json<Meal>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.name_ar, "name_ar", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&payload.category, "category", MAX_NAME_LEN)?;
    validate_price(payload.selling_price)?;
    validate_margin(payload.profit_margin_percent)?;
    if let Some(ingredients) = &payload.ingredients {
        validate_ingredients(ingredients)?;
    }

    Ok(Json(meal::update(&state.pool, id, &payload).await?))
}

/// Delete a meal (menu listings go with it)
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<DeleteResponse>> {
    meal::delete(&state.pool, id).await?;
    tracing::info!(meal_id = id, "Meal deleted");
    Ok(Json(DeleteResponse { deleted: true }))
}
