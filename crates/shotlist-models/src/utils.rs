//! Display formatting helpers.

/// Format seconds as `MM:SS`.
///
/// Minutes are not wrapped into hours, so `3725.0` renders as `62:05`.
/// Negative and non-finite inputs render as `00:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Format a byte count as megabytes with one decimal (e.g. `12.3 MB`).
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
}
