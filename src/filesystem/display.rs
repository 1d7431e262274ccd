use std::time::SystemTime;

use chrono::{DateTime, Local};

/// Marker shown in the size column for directories
pub const DIRECTORY_SIZE_LABEL: &str = "0";

/// Size in megabytes with two decimals, e.g. `"1.50 MB"`
pub fn size_label(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Fixed-layout timestamp in local time, independent of the host locale
pub fn format_modtime(time: SystemTime) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%a %b %e %H:%M:%S %Y").to_string()
}

/// Binary-unit size used by the offline tree map, e.g. `"1.5KiB"`
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{:.1}{}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1}PiB", size)
}
