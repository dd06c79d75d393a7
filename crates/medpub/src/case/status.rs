//! Workflow status of an analysis case.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a stored or submitted enum value is not recognised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Stage of an analysis case.
///
/// The normal progression is
/// `uploaded → analyzing → analyzed → report_draft → article_draft → published`.
/// Re-analysis may re-enter `analyzing` from any stage; every other step only
/// moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Uploaded,
    Analyzing,
    Analyzed,
    ReportDraft,
    ArticleDraft,
    Published,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 6] = [
        CaseStatus::Uploaded,
        CaseStatus::Analyzing,
        CaseStatus::Analyzed,
        CaseStatus::ReportDraft,
        CaseStatus::ArticleDraft,
        CaseStatus::Published,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Uploaded => "uploaded",
            CaseStatus::Analyzing => "analyzing",
            CaseStatus::Analyzed => "analyzed",
            CaseStatus::ReportDraft => "report_draft",
            CaseStatus::ArticleDraft => "article_draft",
            CaseStatus::Published => "published",
        }
    }

    /// Human-readable label used in listings.
    pub fn label(&self) -> &'static str {
        match self {
            CaseStatus::Uploaded => "Uploaded",
            CaseStatus::Analyzing => "Analyzing",
            CaseStatus::Analyzed => "Analyzed",
            CaseStatus::ReportDraft => "Report Draft",
            CaseStatus::ArticleDraft => "Article Draft",
            CaseStatus::Published => "Published",
        }
    }

    /// Whether moving from `self` to `next` is an allowed transition.
    pub fn can_transition(&self, next: CaseStatus) -> bool {
        next == CaseStatus::Analyzing || next >= *self
    }

    /// Status after a step that targets `target` completes on a case
    /// currently in `self`.
    pub fn advance(self, target: CaseStatus) -> CaseStatus {
        if self.can_transition(target) {
            target
        } else {
            self
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaseStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "case status",
                value: s.to_string(),
            })
    }
}
