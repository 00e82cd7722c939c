/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 把 `YYYY-MM` 解析为 (year, month)
pub fn parse_year_month(value: &str) -> Option<(i32, u32)> {
    let (y, m) = value.trim().split_once('-')?;
    let year: i32 = y.parse().ok()?;
    let month: u32 = m.parse().ok()?;
    if !(1..=12).contains(&month) || !(1900..=9999).contains(&year) {
        return None;
    }
    Some((year, month))
}

/// year * 100 + month, used as a sortable month key
pub fn month_key(year: i32, month: u32) -> i64 {
    year as i64 * 100 + month as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_year_month() {
        assert_eq!(parse_year_month("2025-03"), Some((2025, 3)));
        assert_eq!(parse_year_month(" 2024-12 "), Some((2024, 12)));
        assert_eq!(parse_year_month("2025-13"), None);
        assert_eq!(parse_year_month("2025"), None);
        assert_eq!(parse_year_month("abcd-01"), None);
    }

    #[test]
    fn month_key_orders_chronologically() {
        assert!(month_key(2024, 12) < month_key(2025, 1));
        assert_eq!(month_key(2025, 3), 202503);
    }
}
