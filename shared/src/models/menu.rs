//! Menu Models: raw materials, meals, menu categories and items

use serde::{Deserialize, Serialize};

/// Raw material (原料)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RawMaterial {
    pub id: i64,
    pub name: String,
    pub name_ar: Option<String>,
    /// kg, g, liter, piece ...
    pub unit: String,
    pub cost_per_unit: f64,
    pub stock_quantity: f64,
    pub category: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create raw material payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMaterialCreate {
    pub name: String,
    pub name_ar: Option<String>,
    pub unit: String,
    #[serde(default)]
    pub cost_per_unit: f64,
    #[serde(default)]
    pub stock_quantity: f64,
    pub category: Option<String>,
}

/// Update raw material payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RawMaterialUpdate {
    pub name: Option<String>,
    pub name_ar: Option<String>,
    pub unit: Option<String>,
    pub cost_per_unit: Option<f64>,
    pub stock_quantity: Option<f64>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

/// Meal (菜品)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Meal {
    pub id: i64,
    pub name: String,
    pub name_ar: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Σ ingredient quantity × raw material cost
    pub total_cost: f64,
    pub profit_margin_percent: f64,
    pub selling_price: f64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,

    // -- Relations (populated by application code, skipped by FromRow) --
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub ingredients: Vec<MealIngredient>,
}

impl Meal {
    /// "name / name_ar" when an Arabic name exists
    pub fn display_name(&self) -> String {
        display_name(&self.name, self.name_ar.as_deref())
    }
}

/// Bilingual display name
pub fn display_name(name: &str, name_ar: Option<&str>) -> String {
    match name_ar.map(str::trim).filter(|s| !s.is_empty()) {
        Some(ar) => format!("{} / {}", name, ar),
        None => name.to_string(),
    }
}

/// Meal ingredient row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MealIngredient {
    pub raw_material_id: i64,
    pub raw_material_name: String,
    pub unit: String,
    pub quantity: f64,
    pub cost_per_unit: f64,
}

/// Ingredient input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealIngredientInput {
    pub raw_material_id: i64,
    pub quantity: f64,
}

/// Create meal payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealCreate {
    pub name: String,
    pub name_ar: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Default 30
    pub profit_margin_percent: Option<f64>,
    /// Explicit price; otherwise derived from cost and margin
    pub selling_price: Option<f64>,
    #[serde(default)]
    pub ingredients: Vec<MealIngredientInput>,
}

/// Update meal payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MealUpdate {
    pub name: Option<String>,
    pub name_ar: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub profit_margin_percent: Option<f64>,
    pub selling_price: Option<f64>,
    pub is_active: Option<bool>,
    /// Replaces the ingredient list when present
    pub ingredients: Option<Vec<MealIngredientInput>>,
}

/// Menu category (POS tab)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuCategory {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub sort_order: i32,
}

/// Create menu category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuCategoryCreate {
    pub name: String,
    #[serde(default)]
    pub sort_order: i32,
}

/// Update menu category payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MenuCategoryUpdate {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Menu item joined with its meal; `price` is the effective unit price
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuItem {
    pub id: i64,
    pub category_id: i64,
    pub meal_id: i64,
    pub name: String,
    pub name_ar: Option<String>,
    pub price_override: Option<f64>,
    pub price: f64,
    pub display_order: i32,
    pub meal_active: bool,
}

/// Add meal to category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemCreate {
    pub meal_id: i64,
    pub price_override: Option<f64>,
    #[serde(default)]
    pub display_order: i32,
}

/// Update menu item payload
///
/// `clear_price_override` removes the override so the meal price applies.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MenuItemUpdate {
    pub price_override: Option<f64>,
    #[serde(default)]
    pub clear_price_override: bool,
    pub display_order: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_joins_arabic() {
        assert_eq!(display_name("Rice", Some("أرز")), "Rice / أرز");
        assert_eq!(display_name("Rice", Some("  ")), "Rice");
        assert_eq!(display_name("Rice", None), "Rice");
    }
}
