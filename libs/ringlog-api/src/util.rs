/// strftime layout of the timestamp records injected by the periodic task.
pub const TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %T %z";

/// `timestamp:<RFC 2822 time>` without terminator.
pub fn format_timestamp<Tz>(at: &chrono::DateTime<Tz>) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("timestamp:{}", at.format(TIMESTAMP_FORMAT))
}

/// Current Unix time in milliseconds.
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
