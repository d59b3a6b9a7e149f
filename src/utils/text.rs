use chrono::{DateTime, NaiveDateTime, Utc};

const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// RFC-1123 格式，例如 `Tue, 14 Oct 2025 10:00:00 GMT`
pub fn format_rfc1123(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// 解析 RFC 3339 時間字串，沒有時區的時間視為 UTC；缺少或格式錯誤時回傳 `now`
pub fn parse_or_now(value: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = value else {
        return now;
    };
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc);
    }
    match NaiveDateTime::parse_from_str(raw, NAIVE_TIMESTAMP_FORMAT) {
        Ok(naive) => naive.and_utc(),
        Err(e) => {
            tracing::debug!("Unparseable timestamp {:?} ({}), using current time", raw, e);
            now
        }
    }
}
