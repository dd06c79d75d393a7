//! Scrubbing helpers for values that end up in logs or object keys.

use std::path::Path;

/// Replaces URL userinfo and query strings, which may carry credentials.
///
/// - `https://user:pw@hooks.example.com/a?token=x` → `https://****@hooks.example.com/a?****`
/// - `https://hooks.example.com/a` → unchanged
pub fn redact_url(url: &str) -> String {
    let mut out = url.to_string();

    if let Some(scheme_end) = out.find("://") {
        let authority_start = scheme_end + 3;
        let authority_end = out[authority_start..]
            .find('/')
            .map(|i| authority_start + i)
            .unwrap_or(out.len());
        if let Some(at) = out[authority_start..authority_end].rfind('@') {
            out.replace_range(authority_start..authority_start + at, "****");
        }
    }

    if let Some(q) = out.find('?') {
        out.truncate(q);
        out.push_str("?****");
    }

    out
}

/// Shortens a response body for error messages, cutting at a char boundary.
pub fn truncate_body(body: &str, max_chars: usize) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// Reduces an uploaded file name to a safe single path segment.
///
/// Directory components are dropped and anything outside `[A-Za-z0-9._-]`
/// becomes `_`. Empty or dot-only results fall back to `image`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    // Windows-style separators survive `file_name` on unix.
    let base = base.rsplit('\\').next().unwrap_or(base);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_url_userinfo_and_query() {
        assert_eq!(
            redact_url("https://user:pw@hooks.example.com/a?token=x"),
            "https://****@hooks.example.com/a?****"
        );
    }

    #[test]
    fn test_redact_url_plain() {
        assert_eq!(
            redact_url("https://hooks.example.com/analyze"),
            "https://hooks.example.com/analyze"
        );
    }

    #[test]
    fn test_redact_url_at_in_path_untouched() {
        assert_eq!(
            redact_url("https://hooks.example.com/u/@me"),
            "https://hooks.example.com/u/@me"
        );
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("  short  ", 10), "short");
        assert_eq!(truncate_body("abcdefghij", 4), "abcd…");
        assert_eq!(truncate_body("ééééé", 2), "éé…");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("scan 01.dcm"), "scan_01.dcm");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\scans\\chest.png"), "chest.png");
        assert_eq!(sanitize_file_name(".."), "image");
        assert_eq!(sanitize_file_name("Bild_Ä.jpg"), "Bild__.jpg");
    }
}
