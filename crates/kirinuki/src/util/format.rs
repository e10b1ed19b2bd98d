/// Format seconds as `HH:MM:SS`. Fractions are truncated.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0. {
        seconds as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Format a transfer rate, e.g. `512.0 B/s`, `1.5 KB/s`, `3.2 MB/s`.
pub fn format_speed(bytes_per_second: f64) -> String {
    if bytes_per_second < 1024. {
        format!("{bytes_per_second:.1} B/s")
    } else if bytes_per_second < 1024. * 1024. {
        format!("{:.1} KB/s", bytes_per_second / 1024.)
    } else {
        format!("{:.1} MB/s", bytes_per_second / (1024. * 1024.))
    }
}

pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024. {
            return format!("{size:.2} {unit}");
        }
        size /= 1024.;
    }
    format!("{size:.2} TB")
}
