use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Deep analysis produced during Act 2.
///
/// Only the parts the rest of the system reasons about are typed. Everything
/// else the analysis service returned travels along verbatim so a newer UI can
/// still find it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Act2Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<Narrative>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline_analysis: Option<TimelineAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_questions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_analysis: Option<Value>,
}

impl Act2Snapshot {
    pub fn is_empty(&self) -> bool {
        self.narrative.is_none()
            && self.timeline_analysis.is_none()
            && self.evidence_questions.is_none()
            && self.claim_analysis.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Narrative {
    pub chapters: Vec<Chapter>,
}

/// A story chapter. `order` is 1-based and always set; the remaining keys
/// (`title`, `content`, ...) are kept exactly as generated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chapter {
    pub order: u32,
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineAnalysis {
    pub turning_points: Vec<TurningPoint>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurningPoint {
    pub date: String,
    pub description: String,
    pub impact: ImpactLevel,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    Major,
    #[default]
    Moderate,
    Minor,
}

impl ImpactLevel {
    pub const ALL: [ImpactLevel; 3] = [Self::Major, Self::Moderate, Self::Minor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Moderate => "moderate",
            Self::Minor => "minor",
        }
    }
}
