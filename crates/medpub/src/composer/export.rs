//! Printable export of an article as a standalone HTML document.

pub const DEFAULT_EXPORT_TITLE: &str = "Medical Article";

const STYLE: &str = "body { font-family: Arial, sans-serif; margin: 40px; line-height: 1.6; }
h1 { color: #2c5aa0; }
h2 { color: #34495e; margin-top: 30px; }
h3 { color: #7f8c8d; }
@media print { body { margin: 20px; } }";

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn flush_paragraph(lines: &mut Vec<&str>, out: &mut String) {
    if lines.is_empty() {
        return;
    }
    let escaped: Vec<String> = lines.iter().map(|l| escape_html(l)).collect();
    out.push_str(&format!("<p>{}</p>\n", escaped.join("<br>\n")));
    lines.clear();
}

/// Converts article Markdown into HTML body content. Level-one headings are
/// dropped because the document carries its own title heading.
fn render_body(markdown: &str) -> String {
    let mut out = String::new();
    let mut paragraph = Vec::new();

    for line in markdown.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            flush_paragraph(&mut paragraph, &mut out);
        } else if line.starts_with("# ") {
            flush_paragraph(&mut paragraph, &mut out);
        } else if let Some(heading) = line.strip_prefix("## ") {
            flush_paragraph(&mut paragraph, &mut out);
            out.push_str(&format!("<h2>{}</h2>\n", escape_html(heading.trim())));
        } else if let Some(heading) = line.strip_prefix("### ") {
            flush_paragraph(&mut paragraph, &mut out);
            out.push_str(&format!("<h3>{}</h3>\n", escape_html(heading.trim())));
        } else {
            paragraph.push(line);
        }
    }
    flush_paragraph(&mut paragraph, &mut out);
    out
}

/// Renders a print-ready HTML page: the title as the `<title>` and top
/// heading, followed by the article content.
pub fn render_export_html(title: Option<&str>, article_text: &str) -> String {
    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_EXPORT_TITLE);
    let title = escape_html(title);

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>\n{STYLE}\n</style>\n</head>\n<body>\n<h1>{title}</h1>\n{body}</body>\n</html>\n",
        title = title,
        body = render_body(article_text),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_wraps_article_under_title() {
        let html = render_export_html(
            Some("Adrenal incidentaloma"),
            "# Adrenal incidentaloma\n\n## Methods\n\nCT with contrast.\nPortal venous phase.\n",
        );
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Adrenal incidentaloma</title>"));
        assert_eq!(html.matches("<h1>").count(), 1);
        assert!(html.contains("<h2>Methods</h2>"));
        assert!(html.contains("<p>CT with contrast.<br>\nPortal venous phase.</p>"));
    }

    #[test]
    fn test_export_without_title_uses_default() {
        let html = render_export_html(Some("  "), "Body");
        assert!(html.contains("<h1>Medical Article</h1>"));
        let html = render_export_html(None, "Body");
        assert!(html.contains("<title>Medical Article</title>"));
    }

    #[test]
    fn test_export_escapes_markup() {
        let html = render_export_html(Some("A <b>bold</b> title"), "x < y & \"z\"");
        assert!(html.contains("<h1>A &lt;b&gt;bold&lt;/b&gt; title</h1>"));
        assert!(html.contains("<p>x &lt; y &amp; &quot;z&quot;</p>"));
    }
}
