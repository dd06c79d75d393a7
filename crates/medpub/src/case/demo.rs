//! Read-only sample cases users can copy into their own workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Modality;
use crate::composer::ArticleDocument;

/// A catalogue entry with pre-computed artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoCase {
    pub id: String,
    pub title: String,
    pub modality: Modality,
    pub body_region: String,
    #[serde(default)]
    pub image_paths: Vec<String>,
    #[serde(default)]
    pub analysis_result: Option<String>,
    #[serde(default)]
    pub report_text: Option<String>,
    #[serde(default)]
    pub article_sections: Option<ArticleDocument>,
    pub created_at: DateTime<Utc>,
}

impl DemoCase {
    pub fn has_report(&self) -> bool {
        self.report_text
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty())
    }
}
