pub const HOME: &str = "/";

pub const UPLOAD: &str = "/upload";
pub const LIST: &str = "/list";
pub const DELETE: &str = "/delete";

/// Catch-all for shortcode lookups, with or without the display extension.
pub const IMAGE: &str = "/:shortcode";

/// Static routes taking precedence over [`IMAGE`]. A shortcode equal to one
/// of these could never be resolved.
pub const RESERVED: [&str; 3] = [UPLOAD, LIST, DELETE];

pub fn is_reserved(shortcode: &str) -> bool {
    RESERVED
        .iter()
        .any(|route| route.trim_start_matches('/') == shortcode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_routes_are_reserved() {
        assert!(is_reserved("upload"));
        assert!(is_reserved("list"));
        assert!(is_reserved("delete"));
        assert!(!is_reserved("abc123"));
        assert!(!is_reserved(""));
    }
}
