//! Invoice numbering: `{PREFIX}-{year}-{seq:03}`, sequence per prefix per year

use sqlx::SqliteConnection;

use super::RepoResult;

/// Numbered document kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Sales,
    Purchase,
    Expense,
}

impl DocumentKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentKind::Sales => "SAL",
            DocumentKind::Purchase => "PUR",
            DocumentKind::Expense => "EXP",
        }
    }

    fn table(&self) -> &'static str {
        match self {
            DocumentKind::Sales => "sales_invoice",
            DocumentKind::Purchase => "purchase_invoice",
            DocumentKind::Expense => "expense_invoice",
        }
    }
}

pub fn format_number(kind: DocumentKind, year: i32, seq: i64) -> String {
    format!("{}-{}-{:03}", kind.prefix(), year, seq)
}

/// Next free number for `kind` in `year`
///
/// Must run inside the transaction that inserts the document; the UNIQUE
/// constraint on `invoice_number` rejects a concurrent duplicate.
pub async fn next_number(conn: &mut SqliteConnection, kind: DocumentKind, year: i32) -> RepoResult<String> {
    let prefix = format!("{}-{}-", kind.prefix(), year);
    let max: Option<i64> = sqlx::query_scalar(&format!(
        "SELECT MAX(CAST(SUBSTR(invoice_number, ?) AS INTEGER)) FROM {} WHERE invoice_number LIKE ?",
        kind.table()
    ))
    .bind(prefix.len() as i64 + 1)
    .bind(format!("{prefix}%"))
    .fetch_one(conn)
    .await?;
    Ok(format_number(kind, year, max.unwrap_or(0) + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    #[test]
    fn pads_to_three_digits() {
        assert_eq!(format_number(DocumentKind::Sales, 2025, 7), "SAL-2025-007");
        assert_eq!(format_number(DocumentKind::Purchase, 2025, 1234), "PUR-2025-1234");
    }

    #[tokio::test]
    async fn sequence_restarts_each_year() {
        let pool = DbService::memory().await.unwrap().pool;
        for number in ["EXP-2024-009", "EXP-2025-001", "EXP-2025-002"] {
            sqlx::query(
                "INSERT INTO expense_invoice (invoice_number, invoice_date, payment_method, subtotal, \
                 tax_amount, discount_amount, total_amount, created_at) VALUES (?, '2025-01-01', 'CASH', 0, 0, 0, 0, 0)",
            )
            .bind(number)
            .execute(&pool)
            .await
            .unwrap();
        }
        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(
            next_number(&mut conn, DocumentKind::Expense, 2025).await.unwrap(),
            "EXP-2025-003"
        );
        assert_eq!(
            next_number(&mut conn, DocumentKind::Expense, 2026).await.unwrap(),
            "EXP-2026-001"
        );
        assert_eq!(
            next_number(&mut conn, DocumentKind::Sales, 2025).await.unwrap(),
            "SAL-2025-001"
        );
    }
}
