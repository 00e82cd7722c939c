//! Meal database operations
//!
//! Cost and selling price are derived when the meal is saved:
//! `total_cost = Σ qty × raw_material.cost_per_unit`,
//! `selling_price = total_cost × (1 + margin / 100)` unless given explicitly.

use std::collections::BTreeMap;

use shared::ErrorCode;
use shared::models::{Meal, MealCreate, MealIngredient, MealIngredientInput, MealUpdate};
use sqlx::{SqliteConnection, SqlitePool};

use super::{RepoError, RepoResult, raw_material};
use crate::billing::money;

const COLUMNS: &str = "id, name, name_ar, description, category, total_cost, \
    profit_margin_percent, selling_price, is_active, created_at, updated_at";

pub const DEFAULT_MARGIN_PERCENT: f64 = 30.0;

fn not_found(id: i64) -> RepoError {
    RepoError::business(ErrorCode::MealNotFound, format!("Meal {id} not found"))
}

fn map_duplicate(err: sqlx::Error, name: &str) -> RepoError {
    match RepoError::from(err) {
        RepoError::Duplicate(_) => RepoError::business(
            ErrorCode::MealNameExists,
            format!("Meal '{}' already exists", name),
        ),
        other => other,
    }
}

/// Merge duplicate raw materials, dropping non-positive quantities
fn merge_ingredients(inputs: &[MealIngredientInput]) -> BTreeMap<i64, f64> {
    let mut merged = BTreeMap::new();
    for input in inputs.iter().filter(|i| i.quantity > 0.0) {
        *merged.entry(input.raw_material_id).or_insert(0.0) += input.quantity;
    }
    merged
}

/// Resolve ingredient costs and return the total meal cost
async fn ingredient_cost(conn: &mut SqliteConnection, merged: &BTreeMap<i64, f64>) -> RepoResult<f64> {
    let mut lines = Vec::with_capacity(merged.len());
    for (raw_material_id, quantity) in merged {
        let rm = raw_material::find_by_id_in(conn, *raw_material_id)
            .await?
            .ok_or_else(|| {
                RepoError::business(
                    ErrorCode::RawMaterialNotFound,
                    format!("Raw material {raw_material_id} not found"),
                )
            })?;
        lines.push((*quantity, rm.cost_per_unit));
    }
    Ok(money::meal_cost(&lines))
}

async fn write_ingredients(
    conn: &mut SqliteConnection,
    meal_id: i64,
    merged: &BTreeMap<i64, f64>,
) -> RepoResult<()> {
    sqlx::query("DELETE FROM meal_ingredient WHERE meal_id = ?")
        .bind(meal_id)
        .execute(&mut *conn)
        .await?;
    for (raw_material_id, quantity) in merged {
        sqlx::query("INSERT INTO meal_ingredient (meal_id, raw_material_id, quantity) VALUES (?, ?, ?)")
            .bind(meal_id)
            .bind(raw_material_id)
            .bind(quantity)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn find_all(pool: &SqlitePool, include_inactive: bool) -> RepoResult<Vec<Meal>> {
    let sql = if include_inactive {
        format!("SELECT {COLUMNS} FROM meal ORDER BY name")
    } else {
        format!("SELECT {COLUMNS} FROM meal WHERE is_active = 1 ORDER BY name")
    };
    let meals = sqlx::query_as::<_, Meal>(&sql).fetch_all(pool).await?;
    Ok(meals)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Meal>> {
    let meal = sqlx::query_as::<_, Meal>(&format!("SELECT {COLUMNS} FROM meal WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let Some(mut meal) = meal else {
        return Ok(None);
    };
    meal.ingredients = find_ingredients(pool, id).await?;
    Ok(Some(meal))
}

/// Meal row without ingredients, inside a transaction
pub async fn find_row_in(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Meal>> {
    let meal = sqlx::query_as::<_, Meal>(&format!("SELECT {COLUMNS} FROM meal WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(meal)
}

pub async fn find_ingredients(pool: &SqlitePool, meal_id: i64) -> RepoResult<Vec<MealIngredient>> {
    let rows = sqlx::query_as::<_, MealIngredient>(
        "SELECT mi.raw_material_id, rm.name AS raw_material_name, rm.unit, mi.quantity, rm.cost_per_unit \
         FROM meal_ingredient mi JOIN raw_material rm ON rm.id = mi.raw_material_id \
         WHERE mi.meal_id = ? ORDER BY rm.name",
    )
    .bind(meal_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, data: &MealCreate) -> RepoResult<Meal> {
    let name = data.name.trim();
    let margin = data.profit_margin_percent.unwrap_or(DEFAULT_MARGIN_PERCENT);
    let merged = merge_ingredients(&data.ingredients);
    let now = shared::util::now_millis();

    let mut tx = pool.begin().await?;
    let cost = ingredient_cost(&mut tx, &merged).await?;
    let price = data
        .selling_price
        .map(money::round_money)
        .unwrap_or_else(|| money::selling_price(cost, margin));

    let id = sqlx::query(
        "INSERT INTO meal (name, name_ar, description, category, total_cost, profit_margin_percent, \
         selling_price, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(name)
    .bind(&data.name_ar)
    .bind(&data.description)
    .bind(&data.category)
    .bind(cost)
    .bind(margin)
    .bind(price)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| map_duplicate(e, name))?
    .last_insert_rowid();

    write_ingredients(&mut tx, id, &merged).await?;
    tx.commit().await?;

    find_by_id(pool, id).await?.ok_or_else(|| not_found(id))
}

/// Update a meal; cost and price are re-derived when ingredients or margin change
pub async fn update(pool: &SqlitePool, id: i64, data: &MealUpdate) -> RepoResult<Meal> {
    let mut tx = pool.begin().await?;
    let existing = find_row_in(&mut tx, id).await?.ok_or_else(|| not_found(id))?;

    let margin = data
        .profit_margin_percent
        .unwrap_or(existing.profit_margin_percent);

    let (cost, reprice) = match &data.ingredients {
        Some(inputs) => {
            let merged = merge_ingredients(inputs);
            let cost = ingredient_cost(&mut tx, &merged).await?;
            write_ingredients(&mut tx, id, &merged).await?;
            (cost, true)
        }
        None => (existing.total_cost, data.profit_margin_percent.is_some()),
    };
    let price = match data.selling_price {
        Some(p) => money::round_money(p),
        None if reprice => money::selling_price(cost, margin),
        None => existing.selling_price,
    };

    let name = data.name.as_deref().map(str::trim);
    sqlx::query(
        "UPDATE meal SET \
            name = COALESCE(?, name), \
            name_ar = COALESCE(?, name_ar), \
            description = COALESCE(?, description), \
            category = COALESCE(?, category), \
            is_active = COALESCE(?, is_active), \
            total_cost = ?, profit_margin_percent = ?, selling_price = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(name)
    .bind(&data.name_ar)
    .bind(&data.description)
    .bind(&data.category)
    .bind(data.is_active)
    .bind(cost)
    .bind(margin)
    .bind(price)
    .bind(shared::util::now_millis())
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| map_duplicate(e, name.unwrap_or(&existing.name)))?;
    tx.commit().await?;

    find_by_id(pool, id).await?.ok_or_else(|| not_found(id))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("DELETE FROM meal WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use shared::models::RawMaterialCreate;

    async fn setup() -> (SqlitePool, i64, i64) {
        let pool = DbService::memory().await.unwrap().pool;
        let rice = raw_material::create(
            &pool,
            &RawMaterialCreate {
                name: "Rice".into(),
                name_ar: None,
                unit: "kg".into(),
                cost_per_unit: 8.0,
                stock_quantity: 0.0,
                category: None,
            },
        )
        .await
        .unwrap();
        let chicken = raw_material::create(
            &pool,
            &RawMaterialCreate {
                name: "Chicken".into(),
                name_ar: None,
                unit: "kg".into(),
                cost_per_unit: 20.0,
                stock_quantity: 0.0,
                category: None,
            },
        )
        .await
        .unwrap();
        (pool, rice.id, chicken.id)
    }

    fn meal(ingredients: Vec<MealIngredientInput>) -> MealCreate {
        MealCreate {
            name: "Kabsa".into(),
            name_ar: Some("كبسة".into()),
            description: None,
            category: Some("Main".into()),
            profit_margin_percent: None,
            selling_price: None,
            ingredients,
        }
    }

    #[tokio::test]
    async fn create_derives_cost_and_price() {
        let (pool, rice, chicken) = setup().await;
        let created = create(
            &pool,
            &meal(vec![
                MealIngredientInput { raw_material_id: rice, quantity: 0.25 },
                MealIngredientInput { raw_material_id: chicken, quantity: 0.25 },
                MealIngredientInput { raw_material_id: rice, quantity: 0.25 },
            ]),
        )
        .await
        .unwrap();

        // 0.5 × 8 + 0.25 × 20 = 9.00; +30% = 11.70
        assert_eq!(created.total_cost, 9.0);
        assert_eq!(created.selling_price, 11.7);
        assert_eq!(created.ingredients.len(), 2);
        assert_eq!(created.display_name(), "Kabsa / كبسة");
    }

    #[tokio::test]
    async fn explicit_price_wins_and_survives_rename() {
        let (pool, rice, _) = setup().await;
        let mut data = meal(vec![MealIngredientInput { raw_material_id: rice, quantity: 1.0 }]);
        data.selling_price = Some(25.0);
        let created = create(&pool, &data).await.unwrap();
        assert_eq!(created.selling_price, 25.0);

        let renamed = update(
            &pool,
            created.id,
            &MealUpdate {
                name: Some("Kabsa Royal".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.selling_price, 25.0);

        let repriced = update(
            &pool,
            created.id,
            &MealUpdate {
                profit_margin_percent: Some(50.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(repriced.selling_price, 12.0);
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let (pool, _, _) = setup().await;
        create(&pool, &meal(vec![])).await.unwrap();
        let err = create(&pool, &meal(vec![])).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::MealNameExists, _)));
    }

    #[tokio::test]
    async fn unknown_raw_material_is_rejected() {
        let (pool, _, _) = setup().await;
        let err = create(
            &pool,
            &meal(vec![MealIngredientInput { raw_material_id: 999, quantity: 1.0 }]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::RawMaterialNotFound, _)));
    }
}
