use chrono::Utc;

/// Current time in unix seconds.
pub fn unix_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Returns the lowercased extension of the file name, i.e. everything after
/// the last dot. `None` if there is no dot or nothing follows it.
pub fn file_extension(filename: &str) -> Option<String> {
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext.to_lowercase()),
        _ => None,
    }
}

/// Strips anything following the first dot, so that `abc123.png` and
/// `abc123` refer to the same shortcode.
pub fn strip_extension(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased_suffix() {
        assert_eq!(file_extension("cat.JPG").as_deref(), Some("jpg"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension("trailing."), None);
    }

    #[test]
    fn strips_display_extension() {
        assert_eq!(strip_extension("abc123.png"), "abc123");
        assert_eq!(strip_extension("abc123"), "abc123");
        assert_eq!(strip_extension("abc123.png.jpg"), "abc123");
    }
}
