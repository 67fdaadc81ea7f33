//! Human-readable formatting of byte counts and transfer rates.

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Format a byte count with a 1024-based unit and two decimals.
///
/// # Examples
///
/// ```
/// use packdl::format::format_size;
///
/// assert_eq!(format_size(512), "512.00 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in UNITS {
        if value < 1024.0 {
            return format!("{:.2} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.2} TB", value)
}

/// Format a throughput in bytes per second.
///
/// # Examples
///
/// ```
/// use packdl::format::format_speed;
///
/// assert_eq!(format_speed(2048), "2.00 KB/s");
/// ```
pub fn format_speed(bytes_per_sec: u64) -> String {
    format!("{}/s", format_size(bytes_per_sec))
}
