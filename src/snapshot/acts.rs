//! Per-Act assembly from untrusted JSON.
//!
//! Shared by the builder (reading UI state) and the restorer (reading stored
//! rows that may predate the current normalizers), so both directions produce
//! the same canonical shapes.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::aliases::{self, first_present, first_text};
use crate::error::BuildError;
use crate::models::*;
use crate::normalize::*;

/// Act 1 values the UI may hold outside the extraction payload. They win over
/// what the payload itself reports.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct IntakeHints<'a> {
    pub confidence: Option<&'a Value>,
    pub processing_time: Option<&'a Value>,
    pub ai_model: Option<&'a str>,
    pub extraction_method: Option<&'a str>,
}

/// If the extractor wrapped its result in `{ data: ... }`, unwrap it.
pub(crate) fn extraction_root(extracted: &Value) -> &Value {
    match extracted.get("data") {
        Some(data @ Value::Object(_)) => data,
        _ => extracted,
    }
}

pub(crate) fn act1_from_extraction(
    root: &Value,
    hints: IntakeHints<'_>,
    now: DateTime<Utc>,
) -> Act1Snapshot {
    Act1Snapshot {
        basic_info: basic_info(root),
        facts: facts(first_present(root, aliases::EXTRACTED_FACTS)),
        evidence: evidence(first_present(root, aliases::EXTRACTED_EVIDENCE)),
        reasoning: reasoning(first_present(root, aliases::EXTRACTED_REASONING)),
        metadata: metadata(root, hints, now),
    }
}

fn basic_info(root: &Value) -> BasicInfo {
    let parties = first_present(root, aliases::EXTRACTED_PARTIES);
    let party = |paths: &[&str]| {
        parties
            .and_then(|p| first_present(p, paths))
            .map(normalize_party_list)
            .unwrap_or_default()
    };

    BasicInfo {
        case_number: first_text(root, aliases::EXTRACTED_CASE_NUMBER),
        court: first_text(root, aliases::EXTRACTED_COURT),
        judge_date: first_text(root, aliases::EXTRACTED_JUDGE_DATE),
        case_type: first_text(root, aliases::EXTRACTED_CASE_TYPE),
        parties: Parties {
            plaintiff: party(aliases::PARTY_PLAINTIFF),
            defendant: party(aliases::PARTY_DEFENDANT),
            third_party: party(aliases::PARTY_THIRD),
        },
    }
}

fn facts(value: Option<&Value>) -> Facts {
    match value {
        Some(obj @ Value::Object(_)) => {
            let timeline = first_present(obj, aliases::FACTS_TIMELINE)
                .map(normalize_timeline)
                .filter(|t| !t.is_empty());
            let key_facts = first_present(obj, aliases::FACTS_KEY_FACTS)
                .map(normalize_string_list)
                .filter(|k| !k.is_empty());
            Facts {
                summary: first_text(obj, aliases::FACTS_SUMMARY).unwrap_or_default(),
                timeline,
                key_facts,
            }
        }
        Some(other) => Facts {
            summary: normalize_text(other),
            ..Facts::default()
        },
        None => Facts::default(),
    }
}

fn evidence(value: Option<&Value>) -> Evidence {
    match value {
        Some(Value::Array(items)) => Evidence {
            summary: String::new(),
            items: evidence_items(items),
        },
        Some(obj @ Value::Object(_)) => Evidence {
            summary: first_text(obj, aliases::EVIDENCE_SUMMARY).unwrap_or_default(),
            items: match first_present(obj, aliases::EVIDENCE_ITEMS) {
                Some(Value::Array(items)) => evidence_items(items),
                _ => None,
            },
        },
        Some(other) => Evidence {
            summary: normalize_text(other),
            items: None,
        },
        None => Evidence::default(),
    }
}

fn evidence_items(items: &[Value]) -> Option<Vec<EvidenceItem>> {
    let items: Vec<EvidenceItem> = items
        .iter()
        .filter_map(|item| {
            let (kind, description, submitted_by) = match item {
                Value::Object(_) => (
                    first_text(item, aliases::EVIDENCE_ITEM_TYPE).unwrap_or_default(),
                    first_text(item, aliases::EVIDENCE_ITEM_DESCRIPTION).unwrap_or_default(),
                    first_text(item, aliases::EVIDENCE_ITEM_SUBMITTER),
                ),
                other => (String::new(), normalize_text(other), None),
            };
            if description.is_empty() {
                tracing::debug!("Dropping evidence item without a description");
                return None;
            }
            Some(EvidenceItem {
                kind: normalize_evidence_type(&kind),
                description,
                submitted_by: submitted_by.as_deref().and_then(normalize_submitted_by),
            })
        })
        .collect();
    (!items.is_empty()).then_some(items)
}

fn reasoning(value: Option<&Value>) -> Reasoning {
    match value {
        Some(obj @ Value::Object(_)) => Reasoning {
            summary: first_text(obj, aliases::REASONING_SUMMARY).unwrap_or_default(),
            key_arguments: first_present(obj, aliases::REASONING_ARGUMENTS)
                .map(normalize_string_list)
                .filter(|a| !a.is_empty()),
            judgment: first_text(obj, aliases::REASONING_JUDGMENT),
        },
        Some(other) => Reasoning {
            summary: normalize_text(other),
            ..Reasoning::default()
        },
        None => Reasoning::default(),
    }
}

fn metadata(root: &Value, hints: IntakeHints<'_>, now: DateTime<Utc>) -> ExtractionMetadata {
    let confidence = hints
        .confidence
        .filter(|v| !v.is_null())
        .or_else(|| first_present(root, aliases::EXTRACTED_CONFIDENCE))
        .map(normalize_confidence_value)
        .unwrap_or(0.0);
    let processing_time = hints
        .processing_time
        .filter(|v| !v.is_null())
        .or_else(|| first_present(root, aliases::EXTRACTED_PROCESSING_TIME))
        .map(normalize_processing_time)
        .unwrap_or(0);
    let ai_model = hints
        .ai_model
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .or_else(|| first_text(root, aliases::EXTRACTED_AI_MODEL))
        .unwrap_or_else(|| UNKNOWN_AI_MODEL.to_string());
    let extraction_method = hints
        .extraction_method
        .map(str::to_string)
        .or_else(|| first_text(root, aliases::EXTRACTED_METHOD))
        .map(|label| normalize_extraction_method(&label))
        .unwrap_or_default();
    let extracted_at = first_text(root, aliases::EXTRACTED_AT)
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now);

    ExtractionMetadata {
        extracted_at,
        confidence,
        processing_time,
        ai_model,
        extraction_method,
    }
}

/// Where the parts of Act 2 come from. `None` means the part is absent.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct AnalysisSources<'a> {
    pub chapters: Option<&'a Value>,
    pub timeline: Option<&'a Value>,
    pub evidence_questions: Option<&'a Value>,
    pub claims: Option<&'a Value>,
}

pub(crate) fn act2_from_sources(
    sources: AnalysisSources<'_>,
) -> Result<Option<Act2Snapshot>, BuildError> {
    let narrative = match sources.chapters {
        None => None,
        Some(Value::Array(items)) => Some(normalize_chapters(items)),
        Some(obj @ Value::Object(_)) => match obj.get("chapters") {
            Some(Value::Array(items)) => Some(normalize_chapters(items)),
            Some(other) => {
                return Err(BuildError::malformed("act2.narrative.chapters", "array", other))
            }
            None => None,
        },
        Some(other) => return Err(BuildError::malformed("act2.narrative", "array", other)),
    }
    .filter(|chapters| !chapters.is_empty())
    .map(|chapters| Narrative { chapters });

    let timeline_analysis = sources.timeline.map(timeline_analysis).transpose()?;

    let act2 = Act2Snapshot {
        narrative,
        timeline_analysis,
        evidence_questions: sources.evidence_questions.cloned(),
        claim_analysis: sources.claims.cloned(),
    };
    Ok((!act2.is_empty()).then_some(act2))
}

fn timeline_analysis(value: &Value) -> Result<TimelineAnalysis, BuildError> {
    match value {
        Value::Object(map) => {
            let mut extra = map.clone();
            let points = aliases::TURNING_POINTS
                .iter()
                .find_map(|key| extra.remove(*key).filter(|v| !v.is_null()));
            for key in aliases::TURNING_POINTS {
                extra.remove(*key);
            }
            Ok(TimelineAnalysis {
                turning_points: points
                    .as_ref()
                    .map(normalize_turning_points)
                    .unwrap_or_default(),
                extra,
            })
        }
        Value::Array(_) => Ok(TimelineAnalysis {
            turning_points: normalize_turning_points(value),
            extra: Map::new(),
        }),
        other => Err(BuildError::malformed(
            "act2.timelineAnalysis",
            "object",
            other,
        )),
    }
}

pub(crate) fn act3_from_parts(level: Option<&Value>, nodes: Vec<String>) -> Act3Snapshot {
    let level = level.map(normalize_level).unwrap_or(Act3Snapshot::MIN_LEVEL);
    Act3Snapshot::new(level, nodes)
}

pub(crate) fn act4_from_parts(
    report: Option<&Value>,
    ppt_url: Option<String>,
    ppt_metadata: Option<&Value>,
) -> Result<Option<Act4Snapshot>, BuildError> {
    if report.is_none() && ppt_url.is_none() && ppt_metadata.is_none() {
        return Ok(None);
    }
    let learning_report = report.map(summarize_report).transpose()?.unwrap_or_default();
    Ok(Some(Act4Snapshot {
        learning_report,
        full_report: report.cloned(),
        ppt_url,
        ppt_metadata: ppt_metadata.cloned(),
    }))
}

/// Derive the lightweight digest older readers understand from a full report.
pub(crate) fn summarize_report(report: &Value) -> Result<LearningReportSummary, BuildError> {
    match report {
        Value::Object(_) => Ok(LearningReportSummary {
            summary: first_text(report, aliases::REPORT_SUMMARY).unwrap_or_default(),
            key_learnings: first_present(report, aliases::REPORT_KEY_LEARNINGS)
                .map(normalize_string_list)
                .unwrap_or_default(),
            skills_assessed: first_present(report, aliases::REPORT_SKILLS)
                .map(normalize_string_list)
                .unwrap_or_default(),
        }),
        Value::String(text) => Ok(LearningReportSummary {
            summary: text.trim().to_string(),
            ..LearningReportSummary::default()
        }),
        other => Err(BuildError::malformed("act4.learningReport", "object", other)),
    }
}
