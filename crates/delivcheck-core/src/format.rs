const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
const STEP: u64 = 1024;

/// Marker appended to previews that were cut short.
pub const PREVIEW_ELLIPSIS: &str = "...";

/// Render a byte count using the largest unit whose value is at least one.
///
/// Values are rounded to two decimals with trailing zeros dropped, so
/// `1536` renders as `1.5 KB` and `1024` as `1 KB`. Sizes past the gigabyte
/// range stay expressed in GB.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut divisor = 1u64;
    while unit + 1 < UNITS.len() && bytes / divisor >= STEP {
        divisor *= STEP;
        unit += 1;
    }

    let value = bytes as f64 / divisor as f64;
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

/// Keep at most `max_chars` characters of `content`, marking truncation.
pub fn truncate_preview(content: &str, max_chars: usize) -> String {
    let mut chars = content.char_indices();
    match chars.nth(max_chars) {
        Some((cut, _)) => format!("{}{PREVIEW_ELLIPSIS}", &content[..cut]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_reference_sizes() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(1), "1 Bytes");
        assert_eq!(format_bytes(1023), "1023 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(512 * 1024), "512 KB");
        assert_eq!(format_bytes(1024 * 1024), "1 MB");
        assert_eq!(format_bytes(2 * 1024 * 1024), "2 MB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1 GB");
    }

    #[test]
    fn rounds_to_two_decimals() {
        // 1234567 / 1024^2 = 1.1773...
        assert_eq!(format_bytes(1_234_567), "1.18 MB");
    }

    #[test]
    fn caps_unit_at_gigabytes() {
        assert_eq!(format_bytes(2048 * 1024 * 1024 * 1024), "2048 GB");
    }

    #[test]
    fn truncates_long_previews_only() {
        assert_eq!(truncate_preview("short", 200), "short");
        let long = "a".repeat(250);
        let preview = truncate_preview(&long, 200);
        assert_eq!(preview.len(), 203);
        assert!(preview.ends_with("..."));
        assert_eq!(truncate_preview(&"b".repeat(200), 200), "b".repeat(200));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let content = "é".repeat(5);
        assert_eq!(truncate_preview(&content, 3), "ééé...");
    }
}
