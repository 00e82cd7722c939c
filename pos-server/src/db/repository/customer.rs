//! Customer database operations

use shared::ErrorCode;
use shared::models::{Customer, CustomerCreate, CustomerUpdate};
use sqlx::SqlitePool;

use super::{RepoError, RepoResult};

const COLUMNS: &str = "id, name, phone, discount_percent, is_active, created_at";

/// Maximum rows returned by the POS search box
pub const SEARCH_LIMIT: i64 = 10;

fn not_found(id: i64) -> RepoError {
    RepoError::business(ErrorCode::CustomerNotFound, format!("Customer {id} not found"))
}

pub async fn find_all(pool: &SqlitePool, offset: i64, limit: i64) -> RepoResult<Vec<Customer>> {
    let rows = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {COLUMNS} FROM customer ORDER BY name LIMIT ? OFFSET ?"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Customer>> {
    let row = sqlx::query_as::<_, Customer>(&format!("SELECT {COLUMNS} FROM customer WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Active customer by exact phone, used to default a draft's discount
pub async fn find_by_phone(pool: &SqlitePool, phone: &str) -> RepoResult<Option<Customer>> {
    let row = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {COLUMNS} FROM customer WHERE phone = ? AND is_active = 1 ORDER BY id LIMIT 1"
    ))
    .bind(phone.trim())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Substring match on name or phone, active customers only
pub async fn search(pool: &SqlitePool, query: &str) -> RepoResult<Vec<Customer>> {
    let q = query.trim();
    if q.is_empty() {
        return Ok(Vec::new());
    }
    let pattern = format!("%{}%", q.replace('%', "\\%").replace('_', "\\_"));
    let rows = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {COLUMNS} FROM customer \
         WHERE is_active = 1 AND (name LIKE ?1 ESCAPE '\\' OR phone LIKE ?1 ESCAPE '\\') \
         ORDER BY name LIMIT ?2"
    ))
    .bind(pattern)
    .bind(SEARCH_LIMIT)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, data: &CustomerCreate) -> RepoResult<Customer> {
    let id = sqlx::query(
        "INSERT INTO customer (name, phone, discount_percent, is_active, created_at) VALUES (?, ?, ?, 1, ?)",
    )
    .bind(data.name.trim())
    .bind(data.phone.as_deref().map(str::trim))
    .bind(data.discount_percent)
    .bind(shared::util::now_millis())
    .execute(pool)
    .await?
    .last_insert_rowid();
    find_by_id(pool, id).await?.ok_or_else(|| not_found(id))
}

pub async fn update(pool: &SqlitePool, id: i64, data: &CustomerUpdate) -> RepoResult<Customer> {
    let rows = sqlx::query(
        "UPDATE customer SET \
            name = COALESCE(?, name), \
            phone = COALESCE(?, phone), \
            discount_percent = COALESCE(?, discount_percent), \
            is_active = COALESCE(?, is_active) \
         WHERE id = ?",
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(data.phone.as_deref().map(str::trim))
    .bind(data.discount_percent)
    .bind(data.is_active)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(not_found(id));
    }
    find_by_id(pool, id).await?.ok_or_else(|| not_found(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    async fn add(pool: &SqlitePool, name: &str, phone: &str) -> Customer {
        create(
            pool,
            &CustomerCreate {
                name: name.into(),
                phone: Some(phone.into()),
                discount_percent: 5.0,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn search_matches_name_or_phone_and_caps_results() {
        let pool = DbService::memory().await.unwrap().pool;
        add(&pool, "Ahmed Ali", "0501112222").await;
        add(&pool, "Sara", "0559998888").await;
        for i in 0..12 {
            add(&pool, &format!("Guest {i}"), &format!("0580000{i:03}")).await;
        }

        let by_name = search(&pool, "ahmed").await.unwrap();
        assert_eq!(by_name.len(), 1);
        let by_phone = search(&pool, "99988").await.unwrap();
        assert_eq!(by_phone[0].name, "Sara");
        assert_eq!(search(&pool, "Guest").await.unwrap().len(), 10);
        assert!(search(&pool, "  ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inactive_customers_are_hidden_from_search() {
        let pool = DbService::memory().await.unwrap().pool;
        let c = add(&pool, "Omar", "0500000000").await;
        update(
            &pool,
            c.id,
            &CustomerUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(search(&pool, "Omar").await.unwrap().is_empty());
    }
}
