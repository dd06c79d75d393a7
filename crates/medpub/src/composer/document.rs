use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::templates::TemplateKey;
use crate::case::ParseEnumError;

/// A section of an academic article, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Abstract,
    Introduction,
    Methods,
    Results,
    Discussion,
    Conclusion,
    References,
}

impl SectionKind {
    pub const ALL: [SectionKind; 7] = [
        SectionKind::Abstract,
        SectionKind::Introduction,
        SectionKind::Methods,
        SectionKind::Results,
        SectionKind::Discussion,
        SectionKind::Conclusion,
        SectionKind::References,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Abstract => "abstract",
            SectionKind::Introduction => "introduction",
            SectionKind::Methods => "methods",
            SectionKind::Results => "results",
            SectionKind::Discussion => "discussion",
            SectionKind::Conclusion => "conclusion",
            SectionKind::References => "references",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            SectionKind::Abstract => "Abstract",
            SectionKind::Introduction => "Introduction",
            SectionKind::Methods => "Methods",
            SectionKind::Results => "Results",
            SectionKind::Discussion => "Discussion",
            SectionKind::Conclusion => "Conclusion",
            SectionKind::References => "References",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        SectionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == lower)
            .ok_or_else(|| ParseEnumError {
                kind: "article section",
                value: s.to_string(),
            })
    }
}

/// Article being composed. Every field may be empty; empty sections are
/// simply left out of the rendered markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleDocument {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub introduction: String,
    pub methods: String,
    pub results: String,
    pub discussion: String,
    pub conclusion: String,
    pub references: String,
}

impl ArticleDocument {
    pub fn section(&self, kind: SectionKind) -> &str {
        match kind {
            SectionKind::Abstract => &self.abstract_text,
            SectionKind::Introduction => &self.introduction,
            SectionKind::Methods => &self.methods,
            SectionKind::Results => &self.results,
            SectionKind::Discussion => &self.discussion,
            SectionKind::Conclusion => &self.conclusion,
            SectionKind::References => &self.references,
        }
    }

    pub fn set_section(&mut self, kind: SectionKind, text: impl Into<String>) {
        let slot = match kind {
            SectionKind::Abstract => &mut self.abstract_text,
            SectionKind::Introduction => &mut self.introduction,
            SectionKind::Methods => &mut self.methods,
            SectionKind::Results => &mut self.results,
            SectionKind::Discussion => &mut self.discussion,
            SectionKind::Conclusion => &mut self.conclusion,
            SectionKind::References => &mut self.references,
        };
        *slot = text.into();
    }

    /// Sections that currently hold text.
    pub fn filled_sections(&self) -> impl Iterator<Item = SectionKind> + '_ {
        SectionKind::ALL
            .into_iter()
            .filter(|kind| !self.section(*kind).trim().is_empty())
    }

    /// Generic article used when the article webhook returns no text.
    pub fn fallback(analysis_result: &str) -> Self {
        Self {
            title: "Medical Analysis Article".to_string(),
            abstract_text: "This article presents findings from AI-powered medical image analysis."
                .to_string(),
            introduction:
                "Comprehensive analysis of medical imaging data using advanced AI algorithms."
                    .to_string(),
            methods: "AI-powered analysis was performed on the submitted medical image."
                .to_string(),
            results: analysis_result.to_string(),
            discussion: "The findings suggest further clinical correlation may be warranted."
                .to_string(),
            conclusion: "AI analysis completed successfully with actionable insights."
                .to_string(),
            references: String::new(),
        }
    }
}

fn render(heading: Option<String>, doc: &ArticleDocument) -> String {
    let mut blocks: Vec<String> = Vec::new();
    if let Some(heading) = heading {
        blocks.push(format!("# {}", heading));
    }
    for kind in doc.filled_sections() {
        blocks.push(format!("## {}\n\n{}", kind.heading(), doc.section(kind).trim()));
    }
    if blocks.is_empty() {
        return String::new();
    }
    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}

/// Renders the document as Markdown: a `#` title heading when the title is
/// set, then one `##` block per non-empty section.
pub fn compose_markup(doc: &ArticleDocument) -> String {
    let title = doc.title.trim();
    let heading = (!title.is_empty()).then(|| title.to_string());
    render(heading, doc)
}

/// Like [`compose_markup`], with the template's label on the title heading
/// (`# Case Report: <title>`).
pub fn insert_into_template(doc: &ArticleDocument, key: TemplateKey) -> String {
    let label = key.template().title;
    let title = doc.title.trim();
    let heading = if title.is_empty() {
        label.to_string()
    } else {
        format!("{}: {}", label, title)
    };
    render(Some(heading), doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sections_are_omitted() {
        let doc = ArticleDocument {
            title: "T".to_string(),
            abstract_text: String::new(),
            methods: "M".to_string(),
            ..Default::default()
        };

        let markup = compose_markup(&doc);
        assert!(markup.starts_with("# T\n"));
        assert!(markup.contains("## Methods\n\nM"));
        assert!(!markup.contains("Abstract"));
        assert!(!markup.contains("## Results"));
    }

    #[test]
    fn test_sections_render_in_fixed_order() {
        let mut doc = ArticleDocument::default();
        doc.set_section(SectionKind::Conclusion, "C");
        doc.set_section(SectionKind::Introduction, "I");
        doc.set_section(SectionKind::References, "1. Ref");

        let markup = compose_markup(&doc);
        let intro = markup.find("## Introduction").unwrap();
        let conclusion = markup.find("## Conclusion").unwrap();
        let references = markup.find("## References").unwrap();
        assert!(intro < conclusion && conclusion < references);
        assert!(!markup.contains("# \n"));
    }

    #[test]
    fn test_whitespace_only_section_is_empty() {
        let mut doc = ArticleDocument::default();
        doc.set_section(SectionKind::Discussion, "  \n ");
        assert_eq!(doc.filled_sections().count(), 0);
        assert_eq!(compose_markup(&doc), "");
    }

    #[test]
    fn test_insert_into_template_labels_title() {
        let doc = ArticleDocument {
            title: "Incidental nodule".to_string(),
            results: "6 mm nodule".to_string(),
            ..Default::default()
        };
        let markup = insert_into_template(&doc, TemplateKey::CaseReport);
        assert!(markup.starts_with("# Case Report: Incidental nodule\n"));
        assert!(markup.contains("## Results\n\n6 mm nodule"));

        let untitled = insert_into_template(&ArticleDocument::default(), TemplateKey::TechnicalNote);
        assert_eq!(untitled, "# Technical Note\n");
    }

    #[test]
    fn test_fallback_carries_analysis_into_results() {
        let doc = ArticleDocument::fallback("no acute findings");
        let markup = compose_markup(&doc);
        assert!(markup.starts_with("# Medical Analysis Article"));
        assert!(markup.contains("## Results\n\nno acute findings"));
        assert!(!markup.contains("## References"));
    }

    #[test]
    fn test_document_json_uses_abstract_key() {
        let doc: ArticleDocument =
            serde_json::from_str(r#"{"title":"T","abstract":"A"}"#).unwrap();
        assert_eq!(doc.abstract_text, "A");
        assert_eq!(doc.methods, "");
    }

    #[test]
    fn test_section_kind_parse() {
        assert_eq!("Methods".parse::<SectionKind>().unwrap(), SectionKind::Methods);
        assert!("appendix".parse::<SectionKind>().is_err());
    }
}
