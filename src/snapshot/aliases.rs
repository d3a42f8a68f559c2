//! Field-name history.
//!
//! Stored snapshots are never migrated, so the same logical field can appear
//! under several names depending on which build wrote it. Each list below
//! names every known location of one field, newest first. Adding a name here
//! is the only change needed to read rows that use it.
//!
//! Paths are dotted (`act1.basicInfo`). A path that resolves to `null` counts
//! as absent.

use serde_json::Value;

use crate::normalize::normalize_text;

// ============================================================
// Extraction payload (relative to the extraction root)
// ============================================================

pub const EXTRACTED_CASE_TITLE: &[&str] = &[
    "basicInfo.caseTitle",
    "basicInfo.title",
    "basicInfo.caseName",
    "caseTitle",
    "title",
];
pub const EXTRACTED_CASE_NUMBER: &[&str] = &[
    "basicInfo.caseNumber",
    "basicInfo.case_number",
    "basicInfo.caseNo",
    "caseNumber",
];
pub const EXTRACTED_COURT: &[&str] = &[
    "basicInfo.court",
    "basicInfo.courtName",
    "basicInfo.court_name",
    "court",
];
pub const EXTRACTED_JUDGE_DATE: &[&str] = &[
    "basicInfo.judgeDate",
    "basicInfo.judgmentDate",
    "basicInfo.date",
];
pub const EXTRACTED_CASE_TYPE: &[&str] = &["basicInfo.caseType", "basicInfo.type"];
pub const EXTRACTED_PARTIES: &[&str] = &["basicInfo.parties", "parties"];
pub const EXTRACTED_FACTS: &[&str] = &["facts", "threeElements.facts"];
pub const EXTRACTED_EVIDENCE: &[&str] = &["evidence", "threeElements.evidence"];
pub const EXTRACTED_REASONING: &[&str] = &["reasoning", "threeElements.reasoning"];
pub const EXTRACTED_CONFIDENCE: &[&str] = &["metadata.confidence", "confidence"];
pub const EXTRACTED_AI_MODEL: &[&str] = &["metadata.aiModel", "metadata.model", "aiModel"];
pub const EXTRACTED_METHOD: &[&str] = &[
    "metadata.extractionMethod",
    "metadata.method",
    "extractionMethod",
];
pub const EXTRACTED_PROCESSING_TIME: &[&str] = &["metadata.processingTime", "processingTime"];
pub const EXTRACTED_AT: &[&str] = &["metadata.extractedAt", "extractedAt"];

pub const PARTY_PLAINTIFF: &[&str] = &["plaintiff", "plaintiffs", "原告"];
pub const PARTY_DEFENDANT: &[&str] = &["defendant", "defendants", "被告"];
pub const PARTY_THIRD: &[&str] = &["thirdParty", "third_party", "thirdParties", "第三人"];

pub const FACTS_SUMMARY: &[&str] = &["summary", "main", "content"];
pub const FACTS_TIMELINE: &[&str] = &["timeline", "events"];
pub const FACTS_KEY_FACTS: &[&str] = &["keyFacts", "key_facts", "keyPoints"];
pub const EVIDENCE_SUMMARY: &[&str] = &["summary", "overview"];
pub const EVIDENCE_ITEMS: &[&str] = &["items", "list", "evidenceList"];
pub const EVIDENCE_ITEM_TYPE: &[&str] = &["type", "category", "kind"];
pub const EVIDENCE_ITEM_DESCRIPTION: &[&str] = &["description", "content", "name", "title"];
pub const EVIDENCE_ITEM_SUBMITTER: &[&str] = &["submittedBy", "submitted_by", "submitter", "provider"];
pub const REASONING_SUMMARY: &[&str] = &["summary", "analysis", "content"];
pub const REASONING_ARGUMENTS: &[&str] = &["keyArguments", "key_arguments", "arguments"];
pub const REASONING_JUDGMENT: &[&str] = &["judgment", "conclusion", "result"];

// ============================================================
// Deep-analysis payload (relative to the analysis result)
// ============================================================

pub const ANALYSIS_CHAPTERS: &[&str] = &["narrative.chapters", "chapters", "storyChapters"];
pub const ANALYSIS_TIMELINE: &[&str] = &["timelineAnalysis", "timeline_analysis", "timeline"];
pub const ANALYSIS_EVIDENCE_QUESTIONS: &[&str] = &["evidenceQuestions", "evidence_questions"];
pub const ANALYSIS_CLAIMS: &[&str] = &["claimAnalysis", "claim_analysis", "claims"];
pub const TURNING_POINTS: &[&str] = &["turningPoints", "turning_points", "keyTurningPoints"];

// ============================================================
// Learning report
// ============================================================

pub const REPORT_SUMMARY: &[&str] = &["summary", "overview", "caseOverview.summary", "conclusion"];
pub const REPORT_KEY_LEARNINGS: &[&str] = &[
    "keyLearnings",
    "learningPoints",
    "keyPoints",
    "caseOverview.keyLearnings",
];
pub const REPORT_SKILLS: &[&str] = &["skillsAssessed", "skills", "skillsPracticed"];

// ============================================================
// Stored snapshot (relative to the envelope root)
// ============================================================

pub const STORED_SCHEMA_VERSION: &[&str] = &["schemaVersion", "schema_version"];
pub const STORED_SESSION_STATE: &[&str] = &["sessionState", "session_state", "currentAct"];
pub const STORED_CASE_TITLE: &[&str] = &["caseTitle", "case_title", "title"];
pub const STORED_CASE_NUMBER: &[&str] = &["caseNumber", "case_number"];
pub const STORED_COURT_NAME: &[&str] = &["courtName", "court_name"];

pub const STORED_ACT1_BASIC_INFO: &[&str] = &["act1.basicInfo", "act1.basic_info", "act1_basic_info"];
pub const STORED_ACT1_FACTS: &[&str] = &["act1.facts", "act1_facts"];
pub const STORED_ACT1_EVIDENCE: &[&str] = &["act1.evidence", "act1_evidence"];
pub const STORED_ACT1_REASONING: &[&str] = &["act1.reasoning", "act1_reasoning"];
pub const STORED_ACT1_METADATA: &[&str] = &["act1.metadata", "act1_metadata"];

pub const STORED_ACT2_NARRATIVE: &[&str] = &[
    "act2.narrative",
    "act2_narrative",
    "act2.storyChapters",
    "act2.story_chapters",
];
pub const STORED_ACT2_TIMELINE: &[&str] = &[
    "act2.timelineAnalysis",
    "act2.timeline_analysis",
    "act2_timeline_analysis",
    "act2.timeline",
];
pub const STORED_ACT2_EVIDENCE_QUESTIONS: &[&str] = &[
    "act2.evidenceQuestions",
    "act2.evidence_questions",
    "act2_evidence_questions",
];
pub const STORED_ACT2_CLAIMS: &[&str] = &[
    "act2.claimAnalysis",
    "act2.claim_analysis",
    "act2_claim_analysis",
];

pub const STORED_ACT3_LEVEL: &[&str] = &[
    "act3.level",
    "act3.socratic.level",
    "act3_socratic.level",
    "act3.socraticLevel",
];
pub const STORED_ACT3_NODES: &[&str] = &[
    "act3.completedNodes",
    "act3.socratic.completedNodes",
    "act3_socratic.completedNodes",
    "act3.completed_nodes",
    "act3.socratic.completed_nodes",
];

pub const STORED_ACT4_FULL_REPORT: &[&str] = &["act4.fullReport", "act4.full_report"];
pub const STORED_ACT4_SUMMARY: &[&str] = &[
    "act4.learningReport",
    "act4.learning_report",
    "act4_learning_report",
    "act4.report",
];
pub const STORED_ACT4_PPT_URL: &[&str] = &["act4.pptUrl", "act4.ppt_url", "act4_ppt_url"];
pub const STORED_ACT4_PPT_METADATA: &[&str] = &[
    "act4.pptMetadata",
    "act4.ppt_metadata",
    "act4_ppt_metadata",
];

// ============================================================
// Lookup
// ============================================================

/// Resolve a dotted path. `null` is reported as absent.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let found = path
        .split('.')
        .try_fold(root, |node, key| node.as_object()?.get(key))?;
    (!found.is_null()).then_some(found)
}

/// The value at the first path in `paths` that is present.
pub fn first_present<'a>(root: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths.iter().find_map(|path| lookup(root, path))
}

/// The first non-empty text among `paths`.
pub fn first_text(root: &Value, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| lookup(root, path))
        .map(normalize_text)
        .find(|text| !text.is_empty())
}
