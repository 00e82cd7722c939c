//! Menu categories and menu items (the POS grid)

use shared::ErrorCode;
use shared::models::{
    MenuCategory, MenuCategoryCreate, MenuCategoryUpdate, MenuItem, MenuItemCreate, MenuItemUpdate,
};
use sqlx::SqlitePool;

use super::{RepoError, RepoResult};

fn category_not_found(id: i64) -> RepoError {
    RepoError::business(ErrorCode::MenuCategoryNotFound, format!("Menu category {id} not found"))
}

fn item_not_found(id: i64) -> RepoError {
    RepoError::business(ErrorCode::MenuItemNotFound, format!("Menu item {id} not found"))
}

fn category_name_taken(err: sqlx::Error, name: &str) -> RepoError {
    match RepoError::from(err) {
        RepoError::Duplicate(_) => RepoError::business(
            ErrorCode::MenuCategoryNameExists,
            format!("Menu category '{}' already exists", name),
        ),
        other => other,
    }
}

// ── Categories ──

pub async fn find_categories(pool: &SqlitePool, include_inactive: bool) -> RepoResult<Vec<MenuCategory>> {
    let sql = if include_inactive {
        "SELECT id, name, is_active, sort_order FROM menu_category ORDER BY sort_order, name"
    } else {
        "SELECT id, name, is_active, sort_order FROM menu_category WHERE is_active = 1 ORDER BY sort_order, name"
    };
    let rows = sqlx::query_as::<_, MenuCategory>(sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_category(pool: &SqlitePool, id: i64) -> RepoResult<Option<MenuCategory>> {
    let row = sqlx::query_as::<_, MenuCategory>(
        "SELECT id, name, is_active, sort_order FROM menu_category WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create_category(pool: &SqlitePool, data: &MenuCategoryCreate) -> RepoResult<MenuCategory> {
    let name = data.name.trim();
    let id = sqlx::query("INSERT INTO menu_category (name, is_active, sort_order) VALUES (?, 1, ?)")
        .bind(name)
        .bind(data.sort_order)
        .execute(pool)
        .await
        .map_err(|e| category_name_taken(e, name))?
        .last_insert_rowid();
    find_category(pool, id).await?.ok_or_else(|| category_not_found(id))
}

pub async fn update_category(
    pool: &SqlitePool,
    id: i64,
    data: &MenuCategoryUpdate,
) -> RepoResult<MenuCategory> {
    let name = data.name.as_deref().map(str::trim);
    let rows = sqlx::query(
        "UPDATE menu_category SET \
            name = COALESCE(?, name), \
            is_active = COALESCE(?, is_active), \
            sort_order = COALESCE(?, sort_order) \
         WHERE id = ?",
    )
    .bind(name)
    .bind(data.is_active)
    .bind(data.sort_order)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| category_name_taken(e, name.unwrap_or_default()))?;
    if rows.rows_affected() == 0 {
        return Err(category_not_found(id));
    }
    find_category(pool, id).await?.ok_or_else(|| category_not_found(id))
}

pub async fn delete_category(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("DELETE FROM menu_category WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(category_not_found(id));
    }
    Ok(())
}

// ── Items ──

const ITEM_SELECT: &str = r#"
    SELECT mi.id, mi.category_id, mi.meal_id, m.name, m.name_ar, mi.price_override,
           COALESCE(mi.price_override, m.selling_price) AS price,
           mi.display_order, m.is_active AS meal_active
    FROM menu_item mi JOIN meal m ON m.id = mi.meal_id
"#;

/// Items of a category with their effective price
pub async fn find_items(pool: &SqlitePool, category_id: i64, only_active: bool) -> RepoResult<Vec<MenuItem>> {
    let filter = if only_active { " AND m.is_active = 1" } else { "" };
    let rows = sqlx::query_as::<_, MenuItem>(&format!(
        "{ITEM_SELECT} WHERE mi.category_id = ?{filter} ORDER BY mi.display_order, m.name"
    ))
    .bind(category_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_item(pool: &SqlitePool, id: i64) -> RepoResult<Option<MenuItem>> {
    let row = sqlx::query_as::<_, MenuItem>(&format!("{ITEM_SELECT} WHERE mi.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create_item(pool: &SqlitePool, category_id: i64, data: &MenuItemCreate) -> RepoResult<MenuItem> {
    if find_category(pool, category_id).await?.is_none() {
        return Err(category_not_found(category_id));
    }
    let meal_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM meal WHERE id = ?")
        .bind(data.meal_id)
        .fetch_optional(pool)
        .await?;
    if meal_exists.is_none() {
        return Err(RepoError::business(
            ErrorCode::MealNotFound,
            format!("Meal {} not found", data.meal_id),
        ));
    }

    let id = sqlx::query(
        "INSERT INTO menu_item (category_id, meal_id, price_override, display_order) VALUES (?, ?, ?, ?)",
    )
    .bind(category_id)
    .bind(data.meal_id)
    .bind(data.price_override)
    .bind(data.display_order)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::business(
            ErrorCode::MenuItemExists,
            format!("Meal {} is already listed in category {}", data.meal_id, category_id),
        ),
        other => other,
    })?
    .last_insert_rowid();

    find_item(pool, id).await?.ok_or_else(|| item_not_found(id))
}

pub async fn update_item(pool: &SqlitePool, id: i64, data: &MenuItemUpdate) -> RepoResult<MenuItem> {
    let rows = sqlx::query(
        "UPDATE menu_item SET \
            price_override = CASE WHEN ? THEN NULL ELSE COALESCE(?, price_override) END, \
            display_order = COALESCE(?, display_order) \
         WHERE id = ?",
    )
    .bind(data.clear_price_override)
    .bind(data.price_override)
    .bind(data.display_order)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(item_not_found(id));
    }
    find_item(pool, id).await?.ok_or_else(|| item_not_found(id))
}

pub async fn delete_item(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("DELETE FROM menu_item WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(item_not_found(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::meal;
    use shared::models::MealCreate;

    async fn setup() -> (SqlitePool, i64, i64) {
        let pool = DbService::memory().await.unwrap().pool;
        let category = create_category(
            &pool,
            &MenuCategoryCreate {
                name: "Grill".into(),
                sort_order: 1,
            },
        )
        .await
        .unwrap();
        let meal = meal::create(
            &pool,
            &MealCreate {
                name: "Shish Tawook".into(),
                name_ar: None,
                description: None,
                category: None,
                profit_margin_percent: None,
                selling_price: Some(18.0),
                ingredients: vec![],
            },
        )
        .await
        .unwrap();
        (pool, category.id, meal.id)
    }

    #[tokio::test]
    async fn price_override_takes_precedence_until_cleared() {
        let (pool, category_id, meal_id) = setup().await;
        let item = create_item(
            &pool,
            category_id,
            &MenuItemCreate {
                meal_id,
                price_override: Some(15.5),
                display_order: 0,
            },
        )
        .await
        .unwrap();
        assert_eq!(item.price, 15.5);

        let cleared = update_item(
            &pool,
            item.id,
            &MenuItemUpdate {
                clear_price_override: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(cleared.price_override, None);
        assert_eq!(cleared.price, 18.0);
    }

    #[tokio::test]
    async fn same_meal_twice_in_category_is_rejected() {
        let (pool, category_id, meal_id) = setup().await;
        let data = MenuItemCreate {
            meal_id,
            price_override: None,
            display_order: 0,
        };
        create_item(&pool, category_id, &data).await.unwrap();
        let err = create_item(&pool, category_id, &data).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::MenuItemExists, _)));
    }

    #[tokio::test]
    async fn category_names_are_case_insensitive() {
        let (pool, _, _) = setup().await;
        let err = create_category(
            &pool,
            &MenuCategoryCreate {
                name: "GRILL".into(),
                sort_order: 0,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::MenuCategoryNameExists, _)));
    }
}
