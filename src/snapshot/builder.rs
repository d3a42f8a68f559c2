use chrono::{DateTime, Utc};
use serde_json::Value;

use super::acts::{self, AnalysisSources, IntakeHints};
use super::aliases::{self, first_present, first_text};
use super::{validate_envelope, ConversionOptions};
use crate::error::{BuildError, SnapshotError};
use crate::models::*;

/// Title used when neither the extraction nor the UI names the case.
pub const UNTITLED_CASE: &str = "Untitled case";

static NO_EXTRACTION: Value = Value::Null;

/// Build a persisted envelope from the UI state.
///
/// `asset_url` is the location of an externally generated asset (the slide
/// deck) and takes precedence over any URL held in the state.
///
/// The state is only read. Each Act is built independently; a failure inside
/// one Act drops that Act and leaves the others intact. Unless validation is
/// skipped, the envelope is validated: in strict mode a failing envelope is an
/// error, otherwise the problems are logged and the envelope is still
/// returned.
pub fn to_database(
    state: &ApplicationState,
    asset_url: Option<&str>,
    options: &ConversionOptions,
) -> Result<SnapshotEnvelope, SnapshotError> {
    to_database_at(state, asset_url, options, Utc::now())
}

/// [`to_database`] with an explicit clock.
pub fn to_database_at(
    state: &ApplicationState,
    asset_url: Option<&str>,
    options: &ConversionOptions,
    now: DateTime<Utc>,
) -> Result<SnapshotEnvelope, SnapshotError> {
    let extraction = state
        .upload_data
        .extracted_elements
        .as_ref()
        .map(acts::extraction_root);

    let act1 = match build_act1(state, now) {
        Ok(act1) => act1,
        Err(e) => {
            tracing::warn!("Act 1 could not be built, storing an empty intake: {}", e);
            acts::act1_from_extraction(&NO_EXTRACTION, intake_hints(state), now)
        }
    };
    let act2 = isolate("Act 2", build_act2(state));
    let act3 = build_act3(state);
    let act4 = isolate("Act 4", build_act4(state, asset_url));

    let mut envelope = SnapshotEnvelope {
        version: SNAPSHOT_VERSION.to_string(),
        schema_version: CURRENT_SCHEMA_VERSION,
        session_state: SessionState::Act1,
        case_title: case_title(state, extraction),
        case_number: extraction.and_then(|root| first_text(root, aliases::EXTRACTED_CASE_NUMBER)),
        court_name: extraction.and_then(|root| first_text(root, aliases::EXTRACTED_COURT)),
        act1,
        act2,
        act3,
        act4,
        created_at: now,
        updated_at: now,
        last_saved_at: now,
        save_type: options.save_type,
    };
    envelope.session_state = session_state(state, &envelope);

    if options.skip_validation {
        tracing::debug!("Snapshot validation skipped by caller");
        return Ok(envelope);
    }

    let report = validate_envelope(&envelope);
    if !report.success {
        if options.strict {
            return Err(SnapshotError::Validation(report));
        }
        report.log_warnings("Saving snapshot despite validation issue");
    }
    Ok(envelope)
}

/// Turn an Act builder failure into an absent Act.
fn isolate<T>(act: &str, built: Result<Option<T>, BuildError>) -> Option<T> {
    built.unwrap_or_else(|e| {
        tracing::warn!("{} omitted from snapshot: {}", act, e);
        None
    })
}

fn intake_hints(state: &ApplicationState) -> IntakeHints<'_> {
    let upload = &state.upload_data;
    IntakeHints {
        confidence: upload.confidence.as_ref(),
        processing_time: upload.processing_time.as_ref(),
        ai_model: upload.ai_model.as_deref(),
        extraction_method: upload.extraction_method.as_deref(),
    }
}

fn build_act1(state: &ApplicationState, now: DateTime<Utc>) -> Result<Act1Snapshot, BuildError> {
    let root = match state.upload_data.extracted_elements.as_ref() {
        None => &NO_EXTRACTION,
        Some(extracted @ Value::Object(_)) => acts::extraction_root(extracted),
        Some(other) => {
            return Err(BuildError::malformed(
                "uploadData.extractedElements",
                "object",
                other,
            ))
        }
    };
    Ok(acts::act1_from_extraction(root, intake_hints(state), now))
}

fn build_act2(state: &ApplicationState) -> Result<Option<Act2Snapshot>, BuildError> {
    let result = match state.analysis_data.result.as_ref() {
        None => None,
        Some(result @ Value::Object(_)) => Some(result),
        Some(other) => {
            return Err(BuildError::malformed("analysisData.result", "object", other));
        }
    };
    let from_result = |paths: &[&str]| result.and_then(|r| first_present(r, paths));

    // The UI's own copies win over the raw analysis result.
    let chapters = if state.story_chapters.is_empty() {
        from_result(aliases::ANALYSIS_CHAPTERS).map(|v| v.to_owned())
    } else {
        Some(Value::Array(state.story_chapters.clone()))
    };
    let sources = AnalysisSources {
        chapters: chapters.as_ref(),
        timeline: non_null(&state.timeline_analysis)
            .or_else(|| from_result(aliases::ANALYSIS_TIMELINE)),
        evidence_questions: non_null(&state.evidence_questions)
            .or_else(|| from_result(aliases::ANALYSIS_EVIDENCE_QUESTIONS)),
        claims: non_null(&state.claim_analysis).or_else(|| from_result(aliases::ANALYSIS_CLAIMS)),
    };
    acts::act2_from_sources(sources)
}

fn build_act3(state: &ApplicationState) -> Option<Act3Snapshot> {
    let socratic = state.socratic_data.as_ref()?;
    let level = non_null(&socratic.level);
    if level.is_none() && socratic.completed_nodes.is_empty() {
        return None;
    }
    Some(acts::act3_from_parts(
        level,
        socratic.completed_nodes.iter().cloned().collect(),
    ))
}

fn build_act4(
    state: &ApplicationState,
    asset_url: Option<&str>,
) -> Result<Option<Act4Snapshot>, BuildError> {
    let summary = state.summary_data.as_ref();
    let ppt_url = asset_url
        .or_else(|| summary.and_then(|s| s.ppt_url.as_deref()))
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string);
    acts::act4_from_parts(
        summary.and_then(|s| non_null(&s.report)),
        ppt_url,
        summary.and_then(|s| non_null(&s.ppt_metadata)),
    )
}

fn non_null(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|v| !v.is_null())
}

/// First non-empty title among the extraction payload, the upload page and
/// the uploaded file name.
fn case_title(state: &ApplicationState, extraction: Option<&Value>) -> String {
    let upload = &state.upload_data;
    extraction
        .and_then(|root| first_text(root, aliases::EXTRACTED_CASE_TITLE))
        .or_else(|| non_blank(upload.case_title.as_deref()))
        .or_else(|| {
            non_blank(upload.file_name.as_deref()).map(|name| match name.rsplit_once('.') {
                Some((stem, _)) if !stem.is_empty() => stem.to_string(),
                _ => name,
            })
        })
        .unwrap_or_else(|| UNTITLED_CASE.to_string())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Explicit state, then the stage on screen, then the furthest populated Act.
fn session_state(state: &ApplicationState, envelope: &SnapshotEnvelope) -> SessionState {
    state
        .session_state
        .as_deref()
        .and_then(|s| SessionState::from_str(s).or_else(|| SessionState::from_ui_stage(s)))
        .or_else(|| {
            state
                .current_act
                .as_deref()
                .and_then(SessionState::from_ui_stage)
        })
        .unwrap_or_else(|| envelope.furthest_populated_act())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn intake_state() -> ApplicationState {
        serde_json::from_value(json!({
            "uploadData": {
                "extractedElements": {
                    "data": {
                        "basicInfo": {
                            "caseNumber": "(2023) 01 Civil 123",
                            "court": "District Court",
                            "parties": {"plaintiff": "Alice", "defendant": [{"name": "Bob"}]}
                        },
                        "facts": {"summary": "A loan was not repaid."}
                    }
                },
                "confidence": 85,
                "fileName": "judgment.pdf"
            }
        }))
        .expect("state")
    }

    #[test]
    fn derives_case_metadata_from_extraction() {
        let envelope = to_database(&intake_state(), None, &ConversionOptions::default())
            .expect("envelope");
        assert_eq!(envelope.case_title, "judgment");
        assert_eq!(envelope.case_number.as_deref(), Some("(2023) 01 Civil 123"));
        assert_eq!(envelope.court_name.as_deref(), Some("District Court"));
        assert_eq!(envelope.act1.metadata.confidence, 0.85);
        assert_eq!(envelope.act1.basic_info.parties.defendant, vec!["Bob"]);
    }

    #[test]
    fn session_state_prefers_explicit_then_ui_stage() {
        let mut state = intake_state();
        state.current_act = Some("classroom".into());
        let envelope = to_database(&state, None, &ConversionOptions::default()).expect("ok");
        assert_eq!(envelope.session_state, SessionState::Act3);

        state.session_state = Some("act2".into());
        let envelope = to_database(&state, None, &ConversionOptions::default()).expect("ok");
        assert_eq!(envelope.session_state, SessionState::Act2);
    }

    #[test]
    fn session_state_falls_back_to_furthest_act() {
        let mut state = intake_state();
        state.claim_analysis = Some(json!({"claims": []}));
        let envelope = to_database(&state, None, &ConversionOptions::default()).expect("ok");
        assert_eq!(envelope.session_state, SessionState::Act2);
    }

    #[test]
    fn asset_url_overrides_state_url() {
        let mut state = intake_state();
        state.summary_data = Some(SummaryData {
            ppt_url: Some("https://old/deck.pptx".into()),
            ..SummaryData::default()
        });
        let envelope = to_database(
            &state,
            Some("https://cdn/deck.pptx"),
            &ConversionOptions::default(),
        )
        .expect("ok");
        assert_eq!(
            envelope.act4.expect("act4").ppt_url.as_deref(),
            Some("https://cdn/deck.pptx")
        );
    }

    #[test]
    fn malformed_extraction_keeps_envelope() {
        let mut state = intake_state();
        state.upload_data.extracted_elements = Some(json!("not an object"));
        state.upload_data.file_name = None;
        let envelope = to_database(&state, None, &ConversionOptions::default()).expect("ok");
        assert_eq!(envelope.case_title, UNTITLED_CASE);
        assert!(envelope.act1.basic_info.parties.plaintiff.is_empty());
        assert_eq!(envelope.act1.metadata.confidence, 0.85);
    }
}
