use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::case::ParseEnumError;

/// Writing tones offered for article generation.
pub const TONES: [&str; 4] = ["Academic", "Neutral", "Clinical", "Educational"];

pub const DEFAULT_TONE: &str = "Academic";

/// Identifier of an academic article template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKey {
    CaseReport,
    Retrospective,
    Prospective,
    SystematicReview,
    TechnicalNote,
}

impl TemplateKey {
    pub fn as_str(&self) -> &'static str {
        self.template().key_str
    }

    pub fn template(&self) -> &'static Template {
        TEMPLATES
            .iter()
            .find(|t| t.key == *self)
            .unwrap_or(&TEMPLATES[0])
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateKey {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TEMPLATES
            .iter()
            .find(|t| t.key_str == s)
            .map(|t| t.key)
            .ok_or_else(|| ParseEnumError {
                kind: "template",
                value: s.to_string(),
            })
    }
}

/// A template's catalogue entry.
#[derive(Debug, Serialize)]
pub struct Template {
    pub key: TemplateKey,
    #[serde(skip)]
    key_str: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    /// Top-level headings of the template, in order.
    pub outline: &'static [&'static str],
}

impl Template {
    /// Markdown skeleton with one empty block per outline heading.
    pub fn skeleton(&self) -> String {
        let mut out = format!("# {}: [Title]\n", self.title);
        for heading in self.outline {
            out.push_str("\n## ");
            out.push_str(heading);
            out.push('\n');
        }
        out
    }
}

pub static TEMPLATES: [Template; 5] = [
    Template {
        key: TemplateKey::CaseReport,
        key_str: "case-report",
        title: "Case Report",
        description: "Individual patient case with clinical findings and outcomes",
        outline: &[
            "Abstract",
            "Introduction",
            "Case Presentation",
            "Differential Diagnosis",
            "Treatment and Management",
            "Outcome and Follow-up",
            "Discussion",
            "Conclusion",
        ],
    },
    Template {
        key: TemplateKey::Retrospective,
        key_str: "retrospective",
        title: "Retrospective Study",
        description: "Analysis of historical patient data and outcomes",
        outline: &[
            "Abstract",
            "Introduction",
            "Methods",
            "Results",
            "Discussion",
            "Limitations",
            "Conclusion",
        ],
    },
    Template {
        key: TemplateKey::Prospective,
        key_str: "prospective",
        title: "Prospective Study",
        description: "Forward-looking study design with predefined endpoints",
        outline: &[
            "Abstract",
            "Background and Rationale",
            "Objectives",
            "Methods",
            "Expected Outcomes",
            "Timeline and Milestones",
            "Ethical Considerations",
            "Conclusion",
        ],
    },
    Template {
        key: TemplateKey::SystematicReview,
        key_str: "systematic-review",
        title: "Systematic Review",
        description: "Comprehensive review of existing literature on a topic",
        outline: &[
            "Abstract",
            "Introduction",
            "Methods",
            "Results",
            "Discussion",
            "Conclusion",
            "References",
        ],
    },
    Template {
        key: TemplateKey::TechnicalNote,
        key_str: "technical-note",
        title: "Technical Note",
        description: "Brief report on technical methods or innovations",
        outline: &[
            "Abstract",
            "Introduction",
            "Technical Description",
            "Clinical Application",
            "Results",
            "Discussion",
            "Conclusion",
            "References",
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_has_a_template() {
        for template in &TEMPLATES {
            assert_eq!(template.key.template().title, template.title);
            assert_eq!(template.key.as_str().parse::<TemplateKey>().unwrap(), template.key);
        }
    }

    #[test]
    fn test_serde_key_matches_catalogue() {
        for template in &TEMPLATES {
            let json = serde_json::to_string(&template.key).unwrap();
            assert_eq!(json, format!("\"{}\"", template.key.as_str()));
        }
    }

    #[test]
    fn test_skeleton_lists_outline() {
        let skeleton = TemplateKey::Retrospective.template().skeleton();
        assert!(skeleton.starts_with("# Retrospective Study: [Title]"));
        assert!(skeleton.contains("\n## Limitations\n"));
    }

    #[test]
    fn test_default_tone_is_offered() {
        assert!(TONES.contains(&DEFAULT_TONE));
    }
}
