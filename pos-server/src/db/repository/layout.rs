//! Table layout (sections → rows → table slots) per branch

use std::collections::HashSet;

use shared::ErrorCode;
use shared::models::{LayoutSection, TableLayout};
use sqlx::SqlitePool;

use super::{RepoError, RepoResult, branch};

#[derive(sqlx::FromRow)]
struct SectionRow {
    id: i64,
    name: String,
    row_count: i64,
}

#[derive(sqlx::FromRow)]
struct SlotRow {
    section_id: i64,
    row_index: i64,
    table_number: i64,
}

pub async fn get(pool: &SqlitePool, branch_code: &str) -> RepoResult<TableLayout> {
    let sections = sqlx::query_as::<_, SectionRow>(
        "SELECT id, name, row_count FROM table_section WHERE branch_code = ? ORDER BY sort_order",
    )
    .bind(branch_code)
    .fetch_all(pool)
    .await?;

    let slots = sqlx::query_as::<_, SlotRow>(
        "SELECT section_id, row_index, table_number FROM table_slot \
         WHERE branch_code = ? ORDER BY section_id, row_index, position",
    )
    .bind(branch_code)
    .fetch_all(pool)
    .await?;

    let sections = sections
        .into_iter()
        .map(|section| {
            let mut rows: Vec<Vec<i64>> = vec![Vec::new(); section.row_count.max(0) as usize];
            for slot in slots.iter().filter(|s| s.section_id == section.id) {
                let idx = slot.row_index.max(0) as usize;
                if idx >= rows.len() {
                    rows.resize(idx + 1, Vec::new());
                }
                rows[idx].push(slot.table_number);
            }
            LayoutSection {
                name: section.name,
                rows,
            }
        })
        .collect();

    Ok(TableLayout { sections })
}

/// Structural checks on a layout before it is persisted
///
/// - section names non-empty, unique (case-insensitive)
/// - table numbers positive, each at most once
pub fn validate_layout(layout: &TableLayout) -> RepoResult<()> {
    let mut names = HashSet::new();
    for section in &layout.sections {
        let name = section.name.trim();
        if name.is_empty() {
            return Err(RepoError::business(
                ErrorCode::LayoutInvalid,
                "Section name must not be empty",
            ));
        }
        if !names.insert(name.to_lowercase()) {
            return Err(RepoError::business(
                ErrorCode::SectionNameExists,
                format!("Section '{}' appears more than once", name),
            ));
        }
    }

    let mut seen = HashSet::new();
    for number in layout.table_numbers() {
        if number <= 0 {
            return Err(RepoError::business(
                ErrorCode::LayoutInvalid,
                format!("Table number must be a positive integer, got {}", number),
            ));
        }
        if !seen.insert(number) {
            return Err(RepoError::business(
                ErrorCode::TableDuplicatedInLayout,
                format!("Table {} appears more than once", number),
            ));
        }
    }
    Ok(())
}

/// Replace the whole layout of a branch; unknown tables are created
pub async fn save(pool: &SqlitePool, branch_code: &str, layout: &TableLayout) -> RepoResult<TableLayout> {
    validate_layout(layout)?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM table_slot WHERE branch_code = ?")
        .bind(branch_code)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM table_section WHERE branch_code = ?")
        .bind(branch_code)
        .execute(&mut *tx)
        .await?;

    for (order, section) in layout.sections.iter().enumerate() {
        let section_id = sqlx::query(
            "INSERT INTO table_section (branch_code, name, sort_order, row_count) VALUES (?, ?, ?, ?)",
        )
        .bind(branch_code)
        .bind(section.name.trim())
        .bind(order as i64)
        .bind(section.rows.len() as i64)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for (row_index, row) in section.rows.iter().enumerate() {
            for (position, table_number) in row.iter().enumerate() {
                branch::ensure_table(&mut tx, branch_code, *table_number).await?;
                sqlx::query(
                    "INSERT INTO table_slot (section_id, branch_code, row_index, position, table_number) \
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(section_id)
                .bind(branch_code)
                .bind(row_index as i64)
                .bind(position as i64)
                .bind(table_number)
                .execute(&mut *tx)
                .await?;
            }
        }
    }
    tx.commit().await?;

    get(pool, branch_code).await
}
