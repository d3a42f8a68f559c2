use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Summary stage: the learning report and any generated slide deck.
///
/// `full_report` is the report exactly as generated. `learning_report` is a
/// small derived digest that older readers, which only understand the digest,
/// can still render.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Act4Snapshot {
    pub learning_report: LearningReportSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_report: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppt_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppt_metadata: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LearningReportSummary {
    pub summary: String,
    #[serde(default)]
    pub key_learnings: Vec<String>,
    #[serde(default)]
    pub skills_assessed: Vec<String>,
}
