//! Parsing of free-text form fields.

/// Splits a comma separated keyword field, trimming and dropping blanks.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// One citation per line, trimmed, blank lines dropped.
pub fn parse_citations(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords() {
        assert_eq!(
            parse_keywords(" CT, chest ,, nodule ,"),
            vec!["CT", "chest", "nodule"]
        );
        assert!(parse_keywords("  ").is_empty());
    }

    #[test]
    fn test_parse_citations() {
        let raw = "Smith J. Radiology. 2020.\n\n  Doe A. Lancet. 2021.  \r\n";
        assert_eq!(
            parse_citations(raw),
            vec!["Smith J. Radiology. 2020.", "Doe A. Lancet. 2021."]
        );
    }
}
