use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The application-state tree owned by the UI.
///
/// This is a superset of what gets persisted: it also holds ephemeral UI flags
/// and, after a restore, a read-only provenance block. Anything that came from
/// the AI extraction or analysis services is kept as raw JSON because its shape
/// is not under our control. The snapshot builder never mutates a state; it
/// only reads from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationState {
    /// Explicit session stage, when the UI tracks one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_state: Option<String>,
    /// Name of the stage currently on screen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_act: Option<String>,
    pub upload_data: UploadData,
    pub analysis_data: AnalysisData,
    pub story_chapters: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline_analysis: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_questions: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_analysis: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socratic_data: Option<SocraticData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_data: Option<SummaryData>,
    pub ui: UiFlags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

/// Act 1 intake as the upload page holds it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadData {
    /// Raw extraction result, usually `{ data: { basicInfo, facts, ... } }`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_elements: Option<Value>,
    /// Extraction confidence as reported upstream (a ratio or a percentage).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_method: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisData {
    /// Raw deep-analysis result (`narrative`, `timelineAnalysis`, `claimAnalysis`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SocraticData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Value>,
    pub completed_nodes: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SummaryData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppt_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppt_metadata: Option<Value>,
}

/// Ephemeral flags. Never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UiFlags {
    pub is_loading: bool,
    pub is_saving: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Where a restored state came from. Set only by the restorer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub session_id: Uuid,
    pub is_read_only: bool,
    pub source: String,
    pub schema_version: u32,
}
