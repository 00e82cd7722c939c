//! Company settings (singleton row id = 1)

use shared::models::{Settings, SettingsUpdate};
use sqlx::SqlitePool;

use super::{RepoError, RepoResult};

const SETTINGS_COLUMNS: &str = "company_name, tax_number, address, phone, email, vat_rate, \
    currency, logo_url, receipt_paper_width, receipt_margin_top_mm, receipt_margin_bottom_mm, \
    receipt_margin_left_mm, receipt_margin_right_mm, receipt_font_size, receipt_show_logo, \
    receipt_show_tax_number, receipt_footer_text, updated_at";

/// Insert the settings row if missing
pub async fn ensure(pool: &SqlitePool, supervisor_hash: &str) -> RepoResult<()> {
    sqlx::query(
        "INSERT OR IGNORE INTO settings (id, supervisor_password_hash, updated_at) VALUES (1, ?, ?)",
    )
    .bind(supervisor_hash)
    .bind(shared::util::now_millis())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get(pool: &SqlitePool) -> RepoResult<Settings> {
    sqlx::query_as::<_, Settings>(&format!("SELECT {SETTINGS_COLUMNS} FROM settings WHERE id = 1"))
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| RepoError::NotFound("Settings not initialized".into()))
}

pub async fn update(pool: &SqlitePool, data: &SettingsUpdate) -> RepoResult<Settings> {
    sqlx::query(
        "UPDATE settings SET \
            company_name = COALESCE(?, company_name), \
            tax_number = COALESCE(?, tax_number), \
            address = COALESCE(?, address), \
            phone = COALESCE(?, phone), \
            email = COALESCE(?, email), \
            vat_rate = COALESCE(?, vat_rate), \
            currency = COALESCE(?, currency), \
            logo_url = COALESCE(?, logo_url), \
            receipt_paper_width = COALESCE(?, receipt_paper_width), \
            receipt_margin_top_mm = COALESCE(?, receipt_margin_top_mm), \
            receipt_margin_bottom_mm = COALESCE(?, receipt_margin_bottom_mm), \
            receipt_margin_left_mm = COALESCE(?, receipt_margin_left_mm), \
            receipt_margin_right_mm = COALESCE(?, receipt_margin_right_mm), \
            receipt_font_size = COALESCE(?, receipt_font_size), \
            receipt_show_logo = COALESCE(?, receipt_show_logo), \
            receipt_show_tax_number = COALESCE(?, receipt_show_tax_number), \
            receipt_footer_text = COALESCE(?, receipt_footer_text), \
            updated_at = ? \
         WHERE id = 1",
    )
    .bind(&data.company_name)
    .bind(&data.tax_number)
    .bind(&data.address)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(data.vat_rate)
    .bind(&data.currency)
    .bind(&data.logo_url)
    .bind(data.receipt_paper_width)
    .bind(data.receipt_margin_top_mm)
    .bind(data.receipt_margin_bottom_mm)
    .bind(data.receipt_margin_left_mm)
    .bind(data.receipt_margin_right_mm)
    .bind(data.receipt_font_size)
    .bind(data.receipt_show_logo)
    .bind(data.receipt_show_tax_number)
    .bind(&data.receipt_footer_text)
    .bind(shared::util::now_millis())
    .execute(pool)
    .await?;
    get(pool).await
}

pub async fn vat_rate(pool: &SqlitePool) -> RepoResult<f64> {
    let rate: Option<f64> = sqlx::query_scalar("SELECT vat_rate FROM settings WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(rate.unwrap_or(15.0))
}

pub async fn supervisor_hash(pool: &SqlitePool) -> RepoResult<Option<String>> {
    let hash: Option<Option<String>> =
        sqlx::query_scalar("SELECT supervisor_password_hash FROM settings WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(hash.flatten())
}

pub async fn set_supervisor_hash(pool: &SqlitePool, hash: &str) -> RepoResult<()> {
    sqlx::query("UPDATE settings SET supervisor_password_hash = ?, updated_at = ? WHERE id = 1")
        .bind(hash)
        .bind(shared::util::now_millis())
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    #[tokio::test]
    async fn update_keeps_unset_fields() {
        let pool = DbService::memory().await.unwrap().pool;
        ensure(&pool, "hash").await.unwrap();

        let updated = update(
            &pool,
            &SettingsUpdate {
                company_name: Some("Golden Spoon".into()),
                receipt_paper_width: Some(58),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.company_name, "Golden Spoon");
        assert_eq!(updated.receipt_paper_width, 58);
        assert_eq!(updated.vat_rate, 15.0);
        assert_eq!(updated.currency, "SAR");
        assert_eq!(supervisor_hash(&pool).await.unwrap().as_deref(), Some("hash"));
    }
}
