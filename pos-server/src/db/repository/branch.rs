//! Branch and dining-table database operations

use shared::models::{Branch, TableStatus, TableStatusView};
use sqlx::{SqliteConnection, SqlitePool};

use super::RepoResult;

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Branch>> {
    let rows = sqlx::query_as::<_, Branch>(
        "SELECT code, label, sort_order FROM branch ORDER BY sort_order, code",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find(pool: &SqlitePool, code: &str) -> RepoResult<Option<Branch>> {
    let row = sqlx::query_as::<_, Branch>(
        "SELECT code, label, sort_order FROM branch WHERE code = ?",
    )
    .bind(code)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Insert a branch from configuration; an existing label is kept
pub async fn ensure(pool: &SqlitePool, code: &str, label: &str, sort_order: i32) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO branch (code, label, sort_order) VALUES (?, ?, ?) \
         ON CONFLICT (code) DO UPDATE SET sort_order = excluded.sort_order",
    )
    .bind(code)
    .bind(label)
    .bind(sort_order)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_label(pool: &SqlitePool, code: &str, label: &str) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE branch SET label = ? WHERE code = ?")
        .bind(label)
        .bind(code)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Seed tables `1..=count` for a branch (existing tables untouched)
pub async fn ensure_tables(pool: &SqlitePool, code: &str, count: i64) -> RepoResult<()> {
    let mut tx = pool.begin().await?;
    for n in 1..=count {
        ensure_table(&mut tx, code, n).await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn ensure_table(conn: &mut SqliteConnection, code: &str, table_number: i64) -> RepoResult<()> {
    sqlx::query("INSERT OR IGNORE INTO dining_table (branch_code, table_number) VALUES (?, ?)")
        .bind(code)
        .bind(table_number)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn table_exists(pool: &SqlitePool, code: &str, table_number: i64) -> RepoResult<bool> {
    let found: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM dining_table WHERE branch_code = ? AND table_number = ?",
    )
    .bind(code)
    .bind(table_number)
    .fetch_optional(pool)
    .await?;
    Ok(found.is_some())
}

#[derive(sqlx::FromRow)]
struct TableStatusRow {
    table_number: i64,
    draft_id: Option<i64>,
    pending_invoice_id: Option<i64>,
    section: Option<String>,
}

impl From<TableStatusRow> for TableStatusView {
    fn from(row: TableStatusRow) -> Self {
        let occupied = row.draft_id.is_some() || row.pending_invoice_id.is_some();
        TableStatusView {
            table_number: row.table_number,
            status: if occupied {
                TableStatus::Occupied
            } else {
                TableStatus::Available
            },
            draft_id: row.draft_id,
            pending_invoice_id: row.pending_invoice_id,
            section: row.section,
        }
    }
}

const TABLE_STATUS_SELECT: &str = r#"
    SELECT t.table_number,
        (SELECT d.id FROM draft_order d
          WHERE d.branch_code = t.branch_code AND d.table_number = t.table_number
            AND d.status IN ('open', 'checked_out')
          LIMIT 1) AS draft_id,
        (SELECT i.id FROM sales_invoice i
          WHERE i.branch_code = t.branch_code AND i.table_number = t.table_number
            AND i.print_status = 'pending'
          ORDER BY i.id DESC LIMIT 1) AS pending_invoice_id,
        (SELECT s.name FROM table_slot sl JOIN table_section s ON s.id = sl.section_id
          WHERE sl.branch_code = t.branch_code AND sl.table_number = t.table_number) AS section
    FROM dining_table t
"#;

/// Status of every table in a branch
pub async fn table_statuses(pool: &SqlitePool, code: &str) -> RepoResult<Vec<TableStatusView>> {
    let rows = sqlx::query_as::<_, TableStatusRow>(&format!(
        "{TABLE_STATUS_SELECT} WHERE t.branch_code = ? ORDER BY t.table_number"
    ))
    .bind(code)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn table_status(
    pool: &SqlitePool,
    code: &str,
    table_number: i64,
) -> RepoResult<Option<TableStatusView>> {
    let row = sqlx::query_as::<_, TableStatusRow>(&format!(
        "{TABLE_STATUS_SELECT} WHERE t.branch_code = ? AND t.table_number = ?"
    ))
    .bind(code)
    .bind(table_number)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Into::into))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    #[tokio::test]
    async fn seeded_tables_start_available() {
        let pool = DbService::memory().await.unwrap().pool;
        ensure(&pool, "china_town", "China Town", 0).await.unwrap();
        ensure_tables(&pool, "china_town", 5).await.unwrap();
        ensure_tables(&pool, "china_town", 5).await.unwrap();

        let statuses = table_statuses(&pool, "china_town").await.unwrap();
        assert_eq!(statuses.len(), 5);
        assert!(statuses.iter().all(|t| t.status == TableStatus::Available));
        assert!(table_exists(&pool, "china_town", 5).await.unwrap());
        assert!(!table_exists(&pool, "china_town", 6).await.unwrap());
    }

    #[tokio::test]
    async fn ensure_keeps_renamed_label() {
        let pool = DbService::memory().await.unwrap().pool;
        ensure(&pool, "china_town", "China Town", 0).await.unwrap();
        update_label(&pool, "china_town", "CT Riyadh").await.unwrap();
        ensure(&pool, "china_town", "China Town", 0).await.unwrap();
        let branch = find(&pool, "china_town").await.unwrap().unwrap();
        assert_eq!(branch.label, "CT Riyadh");
    }
}
