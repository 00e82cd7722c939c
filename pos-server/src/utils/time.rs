//! 时间工具函数 (业务时区转换)
//!
//! 业务日期 (YYYY-MM-DD) 与 Unix millis 之间的转换统一在这里完成。

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// 今天 (业务时区)
pub fn today(tz: Tz) -> NaiveDate {
    chrono::Utc::now().with_timezone(&tz).date_naive()
}

/// Unix millis → 业务日期
pub fn millis_to_date(millis: i64, tz: Tz) -> NaiveDate {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&tz).date_naive())
        .unwrap_or_else(|| today(tz))
}

/// Unix millis → ISO-8601 (业务时区, 秒精度)
pub fn millis_to_rfc3339(millis: i64, tz: Tz) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| {
            dt.with_timezone(&tz)
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, false)
        })
        .unwrap_or_default()
}

/// 日期开始 (00:00:00) → Unix millis (业务时区)
///
/// DST gap fallback: 本地时间不存在时 fallback 到 UTC。
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    naive
        .and_local_timezone(tz)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 日期结束 → 次日 00:00:00 的 Unix millis (业务时区)
///
/// 调用方使用 `< end` (不含) 语义。
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    day_start_millis(next_day, tz)
}

/// 本周一
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// 当月第一天
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// 当年第一天
pub fn year_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

/// 月份最后一天
pub fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|d| d.pred_opt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_starts_monday() {
        // 2024-05-16 is a Thursday
        let thu = NaiveDate::from_ymd_opt(2024, 5, 16).unwrap();
        assert_eq!(week_start(thu), NaiveDate::from_ymd_opt(2024, 5, 13).unwrap());
        let mon = NaiveDate::from_ymd_opt(2024, 5, 13).unwrap();
        assert_eq!(week_start(mon), mon);
        let sun = NaiveDate::from_ymd_opt(2024, 5, 19).unwrap();
        assert_eq!(week_start(sun), mon);
    }

    #[test]
    fn month_end_handles_leap_years() {
        assert_eq!(month_end(2024, 2), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(month_end(2023, 12), NaiveDate::from_ymd_opt(2023, 12, 31));
    }

    #[test]
    fn day_bounds_are_24h_in_riyadh() {
        let tz: Tz = "Asia/Riyadh".parse().unwrap();
        let d = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(day_end_millis(d, tz) - day_start_millis(d, tz), 86_400_000);
        assert_eq!(millis_to_date(day_start_millis(d, tz), tz), d);
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("yesterday").is_err());
        assert!(parse_date(" 2024-02-29 ").is_ok());
    }
}
