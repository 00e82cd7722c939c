//! Shared Types
//!
//! Common types used across the application

use serde::{Deserialize, Serialize};

/// Pagination query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u32,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    50
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PaginationParams {
    /// Build from optional `page` / `limit` query values (limit capped at 500)
    pub fn from_query(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or_else(default_page).max(1),
            page_size: limit.unwrap_or_else(default_page_size).clamp(1, 500),
        }
    }

    /// Calculate offset for SQL queries
    pub fn offset(&self) -> i64 {
        (self.page.max(1) as i64 - 1) * self.page_size as i64
    }

    /// Get limit for SQL queries
    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

/// One page of a list endpoint
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, params: &PaginationParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            limit: params.page_size,
        }
    }
}

/// Response for delete operations
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// Acknowledgement for commands without a resource body
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub ok: bool,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// `start_date` / `end_date` list filter (defaults to the current month)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateRangeQuery {
    /// Resolve into inclusive `YYYY-MM-DD` bounds in the business timezone
    pub fn resolve(&self, tz: chrono_tz::Tz) -> crate::utils::AppResult<(String, String)> {
        use chrono::Datelike;
        use crate::utils::time;

        let today = time::today(tz);
        let start = match self.start_date.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(s) => time::parse_date(s)?,
            None => time::month_start(today),
        };
        let end = match self.end_date.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(s) => time::parse_date(s)?,
            None => time::month_end(today.year(), today.month()).unwrap_or(today),
        };
        if start > end {
            return Err(crate::utils::AppError::with_message(
                crate::utils::ErrorCode::ValueOutOfRange,
                format!("start_date {start} is after end_date {end}"),
            ));
        }
        Ok((start.format("%Y-%m-%d").to_string(), end.format("%Y-%m-%d").to_string()))
    }
}

/// Parse a comma separated id list (`1,2,3`); invalid entries are skipped
pub fn parse_id_list(raw: Option<&str>) -> Vec<i64> {
    raw.map(|s| {
        s.split(',')
            .filter_map(|p| p.trim().parse::<i64>().ok())
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_offsets() {
        let p = PaginationParams::from_query(Some(3), Some(20));
        assert_eq!(p.offset(), 40);
        assert_eq!(p.limit(), 20);
        let p = PaginationParams::from_query(Some(0), Some(10_000));
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 500);
    }

    #[test]
    fn date_range_rejects_inverted_bounds() {
        let q = DateRangeQuery {
            start_date: Some("2024-03-10".into()),
            end_date: Some("2024-03-01".into()),
        };
        assert!(q.resolve(chrono_tz::Asia::Riyadh).is_err());

        let q = DateRangeQuery {
            start_date: Some("2024-03-01".into()),
            end_date: Some("2024-03-31".into()),
        };
        let (start, end) = q.resolve(chrono_tz::Asia::Riyadh).unwrap();
        assert_eq!((start.as_str(), end.as_str()), ("2024-03-01", "2024-03-31"));
    }

    #[test]
    fn id_list_skips_garbage() {
        assert_eq!(parse_id_list(Some("1, 2,x,3")), vec![1, 2, 3]);
        assert!(parse_id_list(None).is_empty());
    }
}
