use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::acts::{self, AnalysisSources, IntakeHints};
use super::aliases::{self, first_present, first_text};
use super::{sync_to_all_stores, ConversionOptions, DependentSinks};
use crate::error::{BuildError, SnapshotError};
use crate::models::*;
use crate::normalize::{as_number, normalize_string_list};

/// Value of `Provenance::source` on every restored state.
pub const RESTORED_SOURCE: &str = "database";

/// Rebuild the UI state from a stored session.
///
/// The stored snapshot may have been written by any schema version up to
/// [`MAX_SUPPORTED_SCHEMA_VERSION`]; a newer one is the only failure. Fields
/// are located through the alias lists in [`aliases`], so rows written before
/// a rename still restore. Any Act that cannot be read is left empty.
///
/// When `options.sync_stores` is set and `sinks` is given, the Act 2 results
/// are pushed into the dependent containers on a spawned task. This function
/// does not wait for it.
pub fn to_store(
    session: &DatabaseSession,
    options: &ConversionOptions,
    sinks: Option<Arc<dyn DependentSinks>>,
) -> Result<ApplicationState, SnapshotError> {
    let snapshot = &session.snapshot;
    let schema_version = check_version(session)?;

    let act1 = restore_act1(snapshot);
    let act2 = restore_act2(snapshot).unwrap_or_else(|e| {
        tracing::warn!("Session {} Act 2 unreadable, restoring without it: {}", session.id, e);
        None
    });
    let act3 = restore_act3(snapshot);
    let act4 = restore_act4(snapshot);

    let session_state = first_text(snapshot, aliases::STORED_SESSION_STATE)
        .and_then(|s| SessionState::from_str(&s).or_else(|| SessionState::from_ui_stage(&s)))
        .unwrap_or(if act4.is_some() {
            SessionState::Act4
        } else if act3.is_some() {
            SessionState::Act3
        } else if act2.is_some() {
            SessionState::Act2
        } else {
            SessionState::Act1
        });

    let mut state = ApplicationState {
        session_state: Some(session_state.as_str().to_string()),
        current_act: Some(session_state.as_str().to_string()),
        upload_data: upload_data(snapshot, &act1),
        provenance: Some(Provenance {
            session_id: session.id,
            is_read_only: options.read_only,
            source: RESTORED_SOURCE.to_string(),
            schema_version,
        }),
        ..ApplicationState::default()
    };

    if let Some(act2) = &act2 {
        apply_act2(&mut state, act2);
    }
    state.socratic_data = act3.map(|act3| SocraticData {
        level: Some(json!(act3.level)),
        completed_nodes: act3.completed_nodes.into_iter().collect(),
    });
    state.summary_data = act4;

    tracing::info!(
        "Restored session {} (schema v{}, {})",
        session.id,
        schema_version,
        session_state.as_str()
    );

    if options.sync_stores {
        if let Some(sinks) = sinks {
            spawn_sync(session, &state, sinks);
        }
    }

    Ok(state)
}

/// Schema version of a stored snapshot. Rows that never recorded one are
/// [`LEGACY_SCHEMA_VERSION`]; fractional versions round up.
pub fn stored_schema_version(snapshot: &Value) -> u32 {
    first_present(snapshot, aliases::STORED_SCHEMA_VERSION)
        .and_then(as_number)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.ceil().min(u32::MAX as f64) as u32)
        .unwrap_or(LEGACY_SCHEMA_VERSION)
}

fn check_version(session: &DatabaseSession) -> Result<u32, SnapshotError> {
    let found = stored_schema_version(&session.snapshot);
    if found > MAX_SUPPORTED_SCHEMA_VERSION {
        tracing::error!(
            "Session {} uses schema v{}, newest readable is v{}",
            session.id,
            found,
            MAX_SUPPORTED_SCHEMA_VERSION
        );
        return Err(SnapshotError::UnsupportedVersion {
            found,
            supported: MAX_SUPPORTED_SCHEMA_VERSION,
        });
    }
    if found < CURRENT_SCHEMA_VERSION {
        tracing::warn!(
            "Session {} was written with schema v{}, reading through aliases",
            session.id,
            found
        );
    }
    Ok(found)
}

// ============================================================
// Per-Act restoration
// ============================================================

fn restore_act1(snapshot: &Value) -> Act1Snapshot {
    // Lay the stored parts out the way the extractor does, then run the
    // regular intake path so old rows get today's normalization.
    let mut root = Map::new();
    let parts = [
        ("basicInfo", aliases::STORED_ACT1_BASIC_INFO),
        ("facts", aliases::STORED_ACT1_FACTS),
        ("evidence", aliases::STORED_ACT1_EVIDENCE),
        ("reasoning", aliases::STORED_ACT1_REASONING),
        ("metadata", aliases::STORED_ACT1_METADATA),
    ];
    for (key, paths) in parts {
        if let Some(value) = first_present(snapshot, paths) {
            root.insert(key.to_string(), value.clone());
        }
    }
    fill_case_identity(&mut root, snapshot);
    acts::act1_from_extraction(&Value::Object(root), IntakeHints::default(), Utc::now())
}

/// Older rows kept the case number and court only at the envelope level.
/// They land at the extraction root, where `basicInfo` still wins over them.
fn fill_case_identity(root: &mut Map<String, Value>, snapshot: &Value) {
    let envelope_fields = [
        ("caseNumber", aliases::STORED_CASE_NUMBER),
        ("court", aliases::STORED_COURT_NAME),
    ];
    for (key, paths) in envelope_fields {
        if let Some(value) = first_text(snapshot, paths) {
            root.insert(key.to_string(), Value::String(value));
        }
    }
}

fn restore_act2(snapshot: &Value) -> Result<Option<Act2Snapshot>, BuildError> {
    acts::act2_from_sources(AnalysisSources {
        chapters: first_present(snapshot, aliases::STORED_ACT2_NARRATIVE),
        timeline: first_present(snapshot, aliases::STORED_ACT2_TIMELINE),
        evidence_questions: first_present(snapshot, aliases::STORED_ACT2_EVIDENCE_QUESTIONS),
        claims: first_present(snapshot, aliases::STORED_ACT2_CLAIMS),
    })
}

fn restore_act3(snapshot: &Value) -> Option<Act3Snapshot> {
    let level = first_present(snapshot, aliases::STORED_ACT3_LEVEL);
    let nodes = first_present(snapshot, aliases::STORED_ACT3_NODES)
        .map(normalize_string_list)
        .unwrap_or_default();
    if level.is_none() && nodes.is_empty() {
        return None;
    }
    Some(acts::act3_from_parts(level, nodes))
}

/// Act 4 goes straight back into the UI's summary shape. The lossless report
/// is preferred; rows that predate it only have the digest.
fn restore_act4(snapshot: &Value) -> Option<SummaryData> {
    let report = first_present(snapshot, aliases::STORED_ACT4_FULL_REPORT)
        .or_else(|| first_present(snapshot, aliases::STORED_ACT4_SUMMARY))
        .cloned();
    let ppt_url = first_text(snapshot, aliases::STORED_ACT4_PPT_URL);
    let ppt_metadata = first_present(snapshot, aliases::STORED_ACT4_PPT_METADATA).cloned();
    if report.is_none() && ppt_url.is_none() && ppt_metadata.is_none() {
        return None;
    }
    Some(SummaryData {
        report,
        ppt_url,
        ppt_metadata,
    })
}

// ============================================================
// State assembly
// ============================================================

fn upload_data(snapshot: &Value, act1: &Act1Snapshot) -> UploadData {
    let metadata = &act1.metadata;
    UploadData {
        extracted_elements: encode("act1", act1).map(|data| json!({ "data": data })),
        confidence: Some(json!(metadata.confidence)),
        file_name: None,
        case_title: first_text(snapshot, aliases::STORED_CASE_TITLE),
        processing_time: Some(json!(metadata.processing_time)),
        ai_model: Some(metadata.ai_model.clone()),
        extraction_method: Some(metadata.extraction_method.as_str().to_string()),
    }
}

fn apply_act2(state: &mut ApplicationState, act2: &Act2Snapshot) {
    state.story_chapters = act2
        .narrative
        .iter()
        .flat_map(|n| &n.chapters)
        .filter_map(|chapter| encode("act2.narrative.chapters", chapter))
        .collect();
    state.timeline_analysis = act2
        .timeline_analysis
        .as_ref()
        .and_then(|t| encode("act2.timelineAnalysis", t));
    state.evidence_questions = act2.evidence_questions.clone();
    state.claim_analysis = act2.claim_analysis.clone();
    state.analysis_data.result = encode("act2", act2);
}

fn encode<T: Serialize>(field: &'static str, value: &T) -> Option<Value> {
    serde_json::to_value(value)
        .map_err(|source| BuildError::Encode { field, source })
        .inspect_err(|e| tracing::warn!("Dropping restored value: {}", e))
        .ok()
}

fn spawn_sync(session: &DatabaseSession, state: &ApplicationState, sinks: Arc<dyn DependentSinks>) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let session = session.clone();
            let state = state.clone();
            handle.spawn(async move {
                let report = sync_to_all_stores(&session, &state, sinks).await;
                report.log_summary(session.id);
            });
        }
        Err(_) => {
            tracing::warn!(
                "No async runtime available, dependent stores not synchronized for session {}",
                session.id
            );
        }
    }
}
