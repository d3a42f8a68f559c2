//! Label normalizers: free-form upstream labels onto closed enums.

use serde_json::Value;

use super::as_number;
use crate::models::{EvidenceType, ExtractionMethod, ImpactLevel, SubmittedBy};

/// Substring table for evidence labels. Checked top to bottom, so more specific
/// categories come first ("expert witness" is expert evidence, not testimony).
const EVIDENCE_TYPE_TABLE: &[(&str, EvidenceType)] = &[
    ("expert", EvidenceType::Expert),
    ("appraisal", EvidenceType::Expert),
    ("forensic", EvidenceType::Expert),
    ("鉴定", EvidenceType::Expert),
    ("勘验", EvidenceType::Expert),
    ("testimon", EvidenceType::Testimonial),
    ("witness", EvidenceType::Testimonial),
    ("statement", EvidenceType::Testimonial),
    ("证人", EvidenceType::Testimonial),
    ("证言", EvidenceType::Testimonial),
    ("陈述", EvidenceType::Testimonial),
    ("physical", EvidenceType::Physical),
    ("material", EvidenceType::Physical),
    ("object", EvidenceType::Physical),
    ("物证", EvidenceType::Physical),
    ("实物", EvidenceType::Physical),
    ("document", EvidenceType::Documentary),
    ("contract", EvidenceType::Documentary),
    ("written", EvidenceType::Documentary),
    ("electronic", EvidenceType::Documentary),
    ("书证", EvidenceType::Documentary),
    ("合同", EvidenceType::Documentary),
    ("电子数据", EvidenceType::Documentary),
];

/// Map an evidence label to an [`EvidenceType`]. Unmapped labels default to
/// [`EvidenceType::Documentary`].
pub fn normalize_evidence_type(label: &str) -> EvidenceType {
    let label = label.trim().to_lowercase();
    if let Some(kind) = EvidenceType::ALL.iter().find(|k| k.as_str() == label) {
        return *kind;
    }
    match EVIDENCE_TYPE_TABLE
        .iter()
        .find(|(needle, _)| label.contains(needle))
    {
        Some((_, kind)) => *kind,
        None => {
            tracing::debug!("Unmapped evidence type {:?}, using documentary", label);
            EvidenceType::Documentary
        }
    }
}

/// Map an extraction-method label onto [`ExtractionMethod`] by substring.
/// `ai` only counts as a whole word.
/// Unmapped labels default to [`ExtractionMethod::Ai`].
pub fn normalize_extraction_method(label: &str) -> ExtractionMethod {
    let label = label.trim().to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| label.contains(n));
    let says_ai = label.split(|c: char| !c.is_alphanumeric()).any(|word| word == "ai");

    if has(&["hybrid", "mixed", "combined", "混合"]) || (says_ai && has(&["rule"])) {
        ExtractionMethod::Hybrid
    } else if has(&["manual", "human", "人工", "手动"]) {
        ExtractionMethod::Manual
    } else if has(&["rule", "regex", "pattern", "规则"]) {
        ExtractionMethod::Rule
    } else {
        if !says_ai && !has(&["llm", "gpt", "model", "deepseek", "智能"]) {
            tracing::debug!("Unmapped extraction method {:?}, using ai", label);
        }
        ExtractionMethod::Ai
    }
}

const MAJOR_THRESHOLD: f64 = 0.66;
const MINOR_THRESHOLD: f64 = 0.33;

/// Map an impact signal onto [`ImpactLevel`].
///
/// Numbers (and numeric strings) use thresholds: `>= 0.66` is major, `<= 0.33`
/// is minor, anything between is moderate. Values in `(1, 100]` are read as
/// percentages. Text is matched by substring. Defaults to
/// [`ImpactLevel::Moderate`].
pub fn normalize_impact_level(value: &Value) -> ImpactLevel {
    if let Some(score) = as_number(value) {
        return impact_from_score(score);
    }
    match value {
        Value::String(label) => impact_from_label(label),
        _ => {
            if !value.is_null() {
                tracing::debug!("Unreadable impact {}, using moderate", value);
            }
            ImpactLevel::Moderate
        }
    }
}

fn impact_from_score(score: f64) -> ImpactLevel {
    if !score.is_finite() {
        return ImpactLevel::Moderate;
    }
    let score = if score > 1.0 && score <= 100.0 {
        score / 100.0
    } else {
        score
    };
    if score >= MAJOR_THRESHOLD {
        ImpactLevel::Major
    } else if score <= MINOR_THRESHOLD {
        ImpactLevel::Minor
    } else {
        ImpactLevel::Moderate
    }
}

fn impact_from_label(label: &str) -> ImpactLevel {
    let label = label.trim().to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| label.contains(n));

    if has(&["minor", "low", "slight", "insignificant", "small", "轻微", "次要", "低"]) {
        ImpactLevel::Minor
    } else if has(&["major", "high", "critical", "significant", "decisive", "key", "重大", "关键", "决定", "高"]) {
        ImpactLevel::Major
    } else {
        if !has(&["moderate", "medium", "中"]) {
            tracing::debug!("Unmapped impact label {:?}, using moderate", label);
        }
        ImpactLevel::Moderate
    }
}

/// Map who submitted a piece of evidence. Exact matches only; anything else is
/// `None` so an optional field never carries a made-up value.
pub fn normalize_submitted_by(label: &str) -> Option<SubmittedBy> {
    let label = label.trim().to_lowercase();
    let submitted_by = match label.as_str() {
        "plaintiff" | "claimant" | "appellant" | "原告" | "上诉人" | "申请人" => {
            SubmittedBy::Plaintiff
        }
        "defendant" | "respondent" | "appellee" | "被告" | "被上诉人" | "被申请人" => {
            SubmittedBy::Defendant
        }
        "third-party" | "third_party" | "thirdparty" | "third party" | "第三人" => {
            SubmittedBy::ThirdParty
        }
        "court" | "judge" | "法院" | "法庭" => SubmittedBy::Court,
        _ => {
            if !label.is_empty() {
                tracing::debug!("Unmapped submitter {:?}, leaving unset", label);
            }
            return None;
        }
    };
    Some(submitted_by)
}
