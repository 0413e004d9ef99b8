/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Render a mean with two decimals, the way rollups are reported ("3.50").
pub fn format_average(value: f64) -> String {
    format!("{:.2}", value)
}
