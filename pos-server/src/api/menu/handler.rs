//! Menu API Handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{
    MenuCategory, MenuCategoryCreate, MenuCategoryUpdate, MenuItem, MenuItemCreate, MenuItemUpdate,
};

use crate::auth::CurrentUser;
use crate::billing::money::MAX_PRICE;
use crate::core::ServerState;
use crate::db::repository::menu;
use crate::utils::types::DeleteResponse;
use crate::utils::validation::{MAX_NAME_LEN, validate_amount, validate_required_text};
use crate::utils::{AppError, AppResult, ErrorCode};

const RESOURCE: &str = "menu";

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

fn validate_override(price: Option<f64>) -> AppResult<()> {
    if let Some(p) = price {
        validate_amount(p, "price_override")?;
        if p > MAX_PRICE {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                format!("price_override must be at most {MAX_PRICE}"),
            ));
        }
    }
    Ok(())
}

/// Menu categories; inactive ones only for users who manage the menu
pub async fn list_categories(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<MenuCategory>>> {
    let include_inactive = query.include_inactive && user.has_permission("menu:view");
    Ok(Json(menu::find_categories(&state.pool, include_inactive).await?))
}

/// POS grid: meals listed in a category with their effective price
pub async fn list_items(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<MenuItem>>> {
    menu::find_category(&state.pool, id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::MenuCategoryNotFound, format!("Menu category {id} not found"))
            .with_detail("id", id)
    })?;
    let only_active = !(query.include_inactive && user.has_permission("menu:view"));
    Ok(Json(menu::find_items(&state.pool, id, only_active).await?))
}

pub async fn create_category(
    State(state): State<ServerState>,
    Json(payload): Json<MenuCategoryCreate>,
) -> AppResult<Json<MenuCategory>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    let created = menu::create_category(&state.pool, &payload).await?;
    state
        .broadcast_sync(RESOURCE, "category_created", &created.id.to_string(), Some(&created))
        .await;
    Ok(Json(created))
}

pub async fn update_category(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<MenuCategoryUpdate>,
) -> AppResult<Json<MenuCategory>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    let updated = menu::update_category(&state.pool, id, &payload).await?;
    state
        .broadcast_sync(RESOURCE, "category_updated", &id.to_string(), Some(&updated))
        .await;
    Ok(Json(updated))
}

pub async fn delete_category(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<DeleteResponse>> {
    menu::delete_category(&state.pool, id).await?;
    state
        .broadcast_sync::<()>(RESOURCE, "category_deleted", &id.to_string(), None)
        .await;
    Ok(Json(DeleteResponse { deleted: true }))
}

/// Add a meal to a category
pub async fn create_item(
    State(state): State<ServerState>,
    Path(category_id): Path<i64>,
    Json(payload): Json<MenuItemCreate>,
) -> AppResult<Json<MenuItem>> {
    validate_override(payload.price_override)?;
    let created = menu::create_item(&state.pool, category_id, &payload).await?;
    state
        .broadcast_sync(RESOURCE, "item_created", &created.id.to_string(), Some(&created))
        .await;
    Ok(Json(created))
}

pub async fn update_item(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<MenuItemUpdate>,
) -> AppResult<Json<MenuItem>> {
    validate_override(payload.price_override)?;
    let updated = menu::update_item(&state.pool, id, &payload).await?;
    state
        .broadcast_sync(RESOURCE, "item_updated", &id.to_string(), Some(&updated))
        .await;
    Ok(Json(updated))
}

pub async fn delete_item(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<DeleteResponse>> {
    menu::delete_item(&state.pool, id).await?;
    state
        .broadcast_sync::<()>(RESOURCE, "item_deleted", &id.to_string(), None)
        .await;
    Ok(Json(DeleteResponse { deleted: true }))
}
