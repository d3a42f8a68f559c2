use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Case intake: what the AI extracted from the uploaded judgment.
///
/// Every field here has already passed through the normalizers, so readers can
/// rely on the canonical shapes (flat party lists, closed enums, confidence in
/// `[0, 1]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Act1Snapshot {
    pub basic_info: BasicInfo,
    pub facts: Facts,
    pub evidence: Evidence,
    pub reasoning: Reasoning,
    pub metadata: ExtractionMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_type: Option<String>,
    pub parties: Parties,
}

/// Parties to the case, always stored as flat name lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Parties {
    pub plaintiff: Vec<String>,
    pub defendant: Vec<String>,
    pub third_party: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Facts {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Vec<TimelineEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_facts: Option<Vec<String>>,
}

/// One dated event on the case timeline. Keys the extractor added beyond
/// `date` and `event` are kept as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TimelineEvent {
    pub date: String,
    pub event: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<EvidenceItem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceItem {
    #[serde(rename = "type")]
    pub kind: EvidenceType,
    /// Never empty; items without a description are dropped during building.
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<SubmittedBy>,
}

/// Canonical evidence categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    #[default]
    Documentary,
    Testimonial,
    Physical,
    Expert,
}

impl EvidenceType {
    pub const ALL: [EvidenceType; 4] = [
        Self::Documentary,
        Self::Testimonial,
        Self::Physical,
        Self::Expert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Documentary => "documentary",
            Self::Testimonial => "testimonial",
            Self::Physical => "physical",
            Self::Expert => "expert",
        }
    }
}

/// Who put a piece of evidence before the court.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SubmittedBy {
    #[serde(rename = "plaintiff")]
    Plaintiff,
    #[serde(rename = "defendant")]
    Defendant,
    #[serde(rename = "third-party")]
    ThirdParty,
    #[serde(rename = "court")]
    Court,
}

impl SubmittedBy {
    pub const ALL: [SubmittedBy; 4] = [
        Self::Plaintiff,
        Self::Defendant,
        Self::ThirdParty,
        Self::Court,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plaintiff => "plaintiff",
            Self::Defendant => "defendant",
            Self::ThirdParty => "third-party",
            Self::Court => "court",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reasoning {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_arguments: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judgment: Option<String>,
}

/// Provenance of the Act 1 extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionMetadata {
    pub extracted_at: DateTime<Utc>,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    /// Milliseconds spent on extraction.
    pub processing_time: u64,
    pub ai_model: String,
    pub extraction_method: ExtractionMethod,
}

impl Default for ExtractionMetadata {
    fn default() -> Self {
        Self {
            extracted_at: DateTime::<Utc>::UNIX_EPOCH,
            confidence: 0.0,
            processing_time: 0,
            ai_model: UNKNOWN_AI_MODEL.to_string(),
            extraction_method: ExtractionMethod::Ai,
        }
    }
}

/// Model name recorded when the upstream payload does not say which model ran.
pub const UNKNOWN_AI_MODEL: &str = "unknown";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    #[default]
    Ai,
    Rule,
    Hybrid,
    Manual,
}

impl ExtractionMethod {
    pub const ALL: [ExtractionMethod; 4] = [Self::Ai, Self::Rule, Self::Hybrid, Self::Manual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Rule => "rule",
            Self::Hybrid => "hybrid",
            Self::Manual => "manual",
        }
    }
}
