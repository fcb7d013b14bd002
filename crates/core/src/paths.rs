//! Return-path sanitization for login redirects.

/// Return `next` if it is a same-site absolute path, otherwise `fallback`.
///
/// A usable path is non-empty, starts with `/`, and does not start with
/// `//` (which browsers treat as a protocol-relative URL to another host).
///
/// ```
/// use hrtaj_core::safe_next_path;
///
/// assert_eq!(safe_next_path(Some("/crm?page=2"), "/dashboard"), "/crm?page=2");
/// assert_eq!(safe_next_path(Some("//evil.example"), "/dashboard"), "/dashboard");
/// assert_eq!(safe_next_path(None, "/team"), "/team");
/// ```
#[must_use]
pub fn safe_next_path(next: Option<&str>, fallback: &str) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_owned(),
        _ => fallback.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_external_and_relative_targets() {
        for bad in [
            "",
            "dashboard",
            "https://evil.example/",
            "//evil.example",
            "///triple",
            " /leading-space",
        ] {
            assert_eq!(safe_next_path(Some(bad), "/dashboard"), "/dashboard", "{bad:?}");
        }
    }

    #[test]
    fn test_keeps_query_and_fragment() {
        assert_eq!(
            safe_next_path(Some("/owner?tab=leads#top"), "/owner"),
            "/owner?tab=leads#top"
        );
    }

    #[test]
    fn test_root_is_allowed() {
        assert_eq!(safe_next_path(Some("/"), "/dashboard"), "/");
    }
}
