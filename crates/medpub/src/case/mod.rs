//! The analysis case record and its input/patch types.

pub mod demo;
pub mod status;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::composer::{ArticleDocument, TemplateKey};
use crate::session::Session;

pub use demo::DemoCase;
pub use status::{CaseStatus, ParseEnumError};

/// Imaging modality of the uploaded study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modality {
    #[serde(rename = "MRI")]
    Mri,
    #[serde(rename = "CT")]
    Ct,
    #[serde(rename = "X-ray")]
    XRay,
    #[serde(rename = "Ultrasound")]
    Ultrasound,
    #[serde(rename = "Other")]
    Other,
}

impl Modality {
    pub const ALL: [Modality; 5] = [
        Modality::Mri,
        Modality::Ct,
        Modality::XRay,
        Modality::Ultrasound,
        Modality::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Mri => "MRI",
            Modality::Ct => "CT",
            Modality::XRay => "X-ray",
            Modality::Ultrasound => "Ultrasound",
            Modality::Other => "Other",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = ParseEnumError;

    /// Case-insensitive; accepts `xray` and `x-ray` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "");
        Modality::ALL
            .into_iter()
            .find(|m| m.as_str().to_ascii_lowercase().replace('-', "") == normalized)
            .ok_or_else(|| ParseEnumError {
                kind: "modality",
                value: s.to_string(),
            })
    }
}

/// A persisted image-to-publication workflow record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisCase {
    pub id: String,
    pub user_id: String,
    pub modality: Modality,
    pub body_region: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub image_paths: Vec<String>,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(default)]
    pub analysis_result: Option<String>,
    #[serde(default)]
    pub report_text: Option<String>,
    #[serde(default)]
    pub article_text: Option<String>,
    #[serde(default)]
    pub article_title: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub citations: Vec<String>,
    #[serde(default)]
    pub template_key: Option<TemplateKey>,
    #[serde(default)]
    pub article_sections: Option<ArticleDocument>,
    #[serde(default)]
    pub published_url: Option<String>,
    pub status: CaseStatus,
    /// Status held before the latest entry into `analyzing`.
    #[serde(skip)]
    pub status_before_analysis: Option<CaseStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl AnalysisCase {
    /// Builds a fresh `uploaded` case owned by the session's user.
    pub fn new(session: &Session, input: NewCase) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: session.user_id().to_string(),
            modality: input.modality,
            body_region: input.body_region,
            notes: input.notes,
            image_paths: input.image_paths,
            models: input.models,
            tasks: input.tasks,
            analysis_result: None,
            report_text: None,
            article_text: None,
            article_title: None,
            tone: None,
            keywords: Vec::new(),
            citations: Vec::new(),
            template_key: None,
            article_sections: None,
            published_url: None,
            status: CaseStatus::Uploaded,
            status_before_analysis: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_analysis(&self) -> bool {
        non_empty(&self.analysis_result)
    }

    pub fn has_report(&self) -> bool {
        non_empty(&self.report_text)
    }

    pub fn has_article(&self) -> bool {
        non_empty(&self.article_text)
    }
}

/// Input attributes for creating a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCase {
    pub modality: Modality,
    pub body_region: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub image_paths: Vec<String>,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<String>,
}

/// Partial update of a case. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CasePatch {
    pub notes: Option<String>,
    pub image_paths: Option<Vec<String>>,
    pub analysis_result: Option<String>,
    pub report_text: Option<String>,
    pub article_text: Option<String>,
    pub article_title: Option<String>,
    pub tone: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub citations: Option<Vec<String>>,
    pub template_key: Option<TemplateKey>,
    pub article_sections: Option<ArticleDocument>,
    pub published_url: Option<String>,
    pub status: Option<CaseStatus>,
}

impl CasePatch {
    pub fn status(status: CaseStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == CasePatch::default()
    }
}
