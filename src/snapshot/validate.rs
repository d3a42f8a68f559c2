//! Structural validation of snapshot envelopes.
//!
//! Validation runs on the JSON form so the same checks apply to freshly built
//! envelopes and to raw rows read back from storage. It never fails and never
//! mutates its input; every problem found is reported with the dotted path of
//! the offending field.

use std::collections::HashSet;
use std::fmt;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::json_kind;
use crate::models::{
    EvidenceType, ExtractionMethod, ImpactLevel, SessionState, SnapshotEnvelope, SubmittedBy,
};

/// One schema violation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path of the offending field, e.g. `act1.evidence.items[2].type`.
    pub path: String,
    pub message: String,
}

/// Outcome of validating one envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub success: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn from_issues(errors: Vec<ValidationIssue>) -> Self {
        Self {
            success: errors.is_empty(),
            errors,
        }
    }

    /// Whether any issue was reported at exactly `path`.
    pub fn has_issue_at(&self, path: &str) -> bool {
        self.errors.iter().any(|issue| issue.path == path)
    }

    /// Emit one warning per issue.
    pub fn log_warnings(&self, context: &str) {
        for issue in &self.errors {
            tracing::warn!("{}: {} {}", context, issue.path, issue.message);
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            return write!(f, "valid");
        }
        write!(f, "{} issue(s)", self.errors.len())?;
        for issue in &self.errors {
            write!(f, "; {}: {}", issue.path, issue.message)?;
        }
        Ok(())
    }
}

/// Validate an arbitrary JSON value against the envelope schema.
pub fn validate(envelope: &Value) -> ValidationReport {
    let mut checker = Checker::default();
    checker.envelope(envelope);
    ValidationReport::from_issues(checker.issues)
}

/// Validate a typed envelope. Types already rule out most structural
/// problems; this catches range and consistency violations plus anything in
/// the verbatim sub-objects.
pub fn validate_envelope(envelope: &SnapshotEnvelope) -> ValidationReport {
    match serde_json::to_value(envelope) {
        Ok(value) => validate(&value),
        Err(e) => ValidationReport::from_issues(vec![ValidationIssue {
            path: "$".to_string(),
            message: format!("envelope cannot be encoded: {}", e),
        }]),
    }
}

fn child(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn index(path: &str, i: usize) -> String {
    format!("{}[{}]", path, i)
}

#[derive(Default)]
struct Checker {
    issues: Vec<ValidationIssue>,
}

impl Checker {
    fn report(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
        });
    }

    fn type_mismatch(&mut self, path: String, expected: &str, found: &Value) {
        self.report(path, format!("expected {}, found {}", expected, json_kind(found)));
    }

    // ------------------------------------------------------------
    // Primitive checks. Each returns the value when it has the right type.
    // ------------------------------------------------------------

    fn object<'a>(
        &mut self,
        parent: &'a Map<String, Value>,
        path: &str,
        key: &str,
        required: bool,
    ) -> Option<&'a Map<String, Value>> {
        let path = child(path, key);
        match parent.get(key) {
            Some(Value::Object(map)) => Some(map),
            None | Some(Value::Null) => {
                if required {
                    self.report(path, "is required");
                }
                None
            }
            Some(other) => {
                self.type_mismatch(path, "object", other);
                None
            }
        }
    }

    fn array<'a>(
        &mut self,
        parent: &'a Map<String, Value>,
        path: &str,
        key: &str,
        required: bool,
    ) -> Option<&'a Vec<Value>> {
        let path = child(path, key);
        match parent.get(key) {
            Some(Value::Array(items)) => Some(items),
            None | Some(Value::Null) => {
                if required {
                    self.report(path, "is required");
                }
                None
            }
            Some(other) => {
                self.type_mismatch(path, "array", other);
                None
            }
        }
    }

    fn string<'a>(
        &mut self,
        parent: &'a Map<String, Value>,
        path: &str,
        key: &str,
        required: bool,
    ) -> Option<&'a str> {
        let path = child(path, key);
        match parent.get(key) {
            Some(Value::String(s)) => Some(s),
            None | Some(Value::Null) => {
                if required {
                    self.report(path, "is required");
                }
                None
            }
            Some(other) => {
                self.type_mismatch(path, "string", other);
                None
            }
        }
    }

    fn non_empty_string(&mut self, parent: &Map<String, Value>, path: &str, key: &str) {
        if let Some(s) = self.string(parent, path, key, true) {
            if s.trim().is_empty() {
                self.report(child(path, key), "must not be empty");
            }
        }
    }

    fn integer(
        &mut self,
        parent: &Map<String, Value>,
        path: &str,
        key: &str,
        min: u64,
        max: u64,
    ) -> Option<u64> {
        let path = child(path, key);
        match parent.get(key) {
            Some(Value::Number(n)) => match n.as_u64() {
                Some(v) if (min..=max).contains(&v) => Some(v),
                Some(v) => {
                    self.report(path, format!("must be between {} and {}, found {}", min, max, v));
                    None
                }
                None => {
                    self.report(path, "must be a non-negative integer");
                    None
                }
            },
            None | Some(Value::Null) => {
                self.report(path, "is required");
                None
            }
            Some(other) => {
                self.type_mismatch(path, "integer", other);
                None
            }
        }
    }

    fn enumerated(
        &mut self,
        parent: &Map<String, Value>,
        path: &str,
        key: &str,
        allowed: &[&str],
        required: bool,
    ) {
        if let Some(s) = self.string(parent, path, key, required) {
            if !allowed.contains(&s) {
                self.report(
                    child(path, key),
                    format!("must be one of [{}], found {:?}", allowed.join(", "), s),
                );
            }
        }
    }

    fn timestamp(&mut self, parent: &Map<String, Value>, path: &str, key: &str) {
        if let Some(s) = self.string(parent, path, key, true) {
            if DateTime::parse_from_rfc3339(s).is_err() {
                self.report(child(path, key), "must be an RFC 3339 timestamp");
            }
        }
    }

    fn string_list(
        &mut self,
        parent: &Map<String, Value>,
        path: &str,
        key: &str,
        required: bool,
    ) -> Option<Vec<String>> {
        let items = self.array(parent, path, key, required)?;
        let list_path = child(path, key);
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match item {
                Value::String(s) => out.push(s.clone()),
                other => self.type_mismatch(index(&list_path, i), "string", other),
            }
        }
        Some(out)
    }

    /// Iterate the objects of an array, reporting entries that are not objects.
    fn objects_in<'a>(&mut self, items: &'a [Value], path: &str) -> Vec<(String, &'a Map<String, Value>)> {
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let item_path = index(path, i);
            match item {
                Value::Object(map) => out.push((item_path, map)),
                other => self.type_mismatch(item_path, "object", other),
            }
        }
        out
    }

    // ------------------------------------------------------------
    // Envelope structure
    // ------------------------------------------------------------

    fn envelope(&mut self, value: &Value) {
        let Value::Object(root) = value else {
            self.type_mismatch("$".to_string(), "object", value);
            return;
        };

        self.string(root, "", "version", true);
        self.integer(root, "", "schemaVersion", 1, u64::from(u32::MAX));
        let states: Vec<&str> = SessionState::ALL.iter().map(|s| s.as_str()).collect();
        self.enumerated(root, "", "sessionState", &states, true);
        self.non_empty_string(root, "", "caseTitle");
        self.string(root, "", "caseNumber", false);
        self.string(root, "", "courtName", false);
        self.timestamp(root, "", "createdAt");
        self.timestamp(root, "", "updatedAt");
        self.timestamp(root, "", "lastSavedAt");
        self.enumerated(root, "", "saveType", &["manual", "auto"], true);

        if let Some(act1) = self.object(root, "", "act1", true) {
            self.act1(act1, "act1");
        }
        if let Some(act2) = self.object(root, "", "act2", false) {
            self.act2(act2, "act2");
        }
        if let Some(act3) = self.object(root, "", "act3", false) {
            self.act3(act3, "act3");
        }
        if let Some(act4) = self.object(root, "", "act4", false) {
            self.act4(act4, "act4");
        }
    }

    fn act1(&mut self, act1: &Map<String, Value>, path: &str) {
        if let Some(info) = self.object(act1, path, "basicInfo", true) {
            let info_path = child(path, "basicInfo");
            for key in ["caseNumber", "court", "judgeDate", "caseType"] {
                self.string(info, &info_path, key, false);
            }
            if let Some(parties) = self.object(info, &info_path, "parties", true) {
                let parties_path = child(&info_path, "parties");
                for key in ["plaintiff", "defendant", "thirdParty"] {
                    self.string_list(parties, &parties_path, key, true);
                }
            }
        }

        if let Some(facts) = self.object(act1, path, "facts", true) {
            let facts_path = child(path, "facts");
            self.string(facts, &facts_path, "summary", true);
            if let Some(timeline) = self.array(facts, &facts_path, "timeline", false) {
                let timeline_path = child(&facts_path, "timeline");
                for (entry_path, entry) in self.objects_in(timeline, &timeline_path) {
                    self.string(entry, &entry_path, "date", true);
                    self.string(entry, &entry_path, "event", true);
                }
            }
            self.string_list(facts, &facts_path, "keyFacts", false);
        }

        if let Some(evidence) = self.object(act1, path, "evidence", true) {
            let evidence_path = child(path, "evidence");
            self.string(evidence, &evidence_path, "summary", true);
            if let Some(items) = self.array(evidence, &evidence_path, "items", false) {
                let types: Vec<&str> = EvidenceType::ALL.iter().map(|t| t.as_str()).collect();
                let submitters: Vec<&str> = SubmittedBy::ALL.iter().map(|s| s.as_str()).collect();
                let items_path = child(&evidence_path, "items");
                for (item_path, item) in self.objects_in(items, &items_path) {
                    self.enumerated(item, &item_path, "type", &types, true);
                    self.non_empty_string(item, &item_path, "description");
                    self.enumerated(item, &item_path, "submittedBy", &submitters, false);
                }
            }
        }

        if let Some(reasoning) = self.object(act1, path, "reasoning", true) {
            let reasoning_path = child(path, "reasoning");
            self.string(reasoning, &reasoning_path, "summary", true);
            self.string_list(reasoning, &reasoning_path, "keyArguments", false);
            self.string(reasoning, &reasoning_path, "judgment", false);
        }

        if let Some(meta) = self.object(act1, path, "metadata", true) {
            let meta_path = child(path, "metadata");
            self.timestamp(meta, &meta_path, "extractedAt");
            match meta.get("confidence") {
                Some(Value::Number(n)) => {
                    let c = n.as_f64().unwrap_or(f64::NAN);
                    if !(0.0..=1.0).contains(&c) {
                        self.report(child(&meta_path, "confidence"), "must be between 0 and 1");
                    }
                }
                None | Some(Value::Null) => {
                    self.report(child(&meta_path, "confidence"), "is required")
                }
                Some(other) => {
                    self.type_mismatch(child(&meta_path, "confidence"), "number", other)
                }
            }
            self.integer(meta, &meta_path, "processingTime", 0, u64::MAX);
            self.string(meta, &meta_path, "aiModel", true);
            let methods: Vec<&str> = ExtractionMethod::ALL.iter().map(|m| m.as_str()).collect();
            self.enumerated(meta, &meta_path, "extractionMethod", &methods, true);
        }
    }

    fn act2(&mut self, act2: &Map<String, Value>, path: &str) {
        if let Some(narrative) = self.object(act2, path, "narrative", false) {
            let narrative_path = child(path, "narrative");
            if let Some(chapters) = self.array(narrative, &narrative_path, "chapters", true) {
                let chapters_path = child(&narrative_path, "chapters");
                for (chapter_path, chapter) in self.objects_in(chapters, &chapters_path) {
                    self.integer(chapter, &chapter_path, "order", 1, u64::from(u32::MAX));
                    self.string(chapter, &chapter_path, "title", false);
                    self.string(chapter, &chapter_path, "content", false);
                }
            }
        }

        if let Some(timeline) = self.object(act2, path, "timelineAnalysis", false) {
            let timeline_path = child(path, "timelineAnalysis");
            if let Some(points) = self.array(timeline, &timeline_path, "turningPoints", true) {
                let impacts: Vec<&str> = ImpactLevel::ALL.iter().map(|i| i.as_str()).collect();
                let points_path = child(&timeline_path, "turningPoints");
                for (point_path, point) in self.objects_in(points, &points_path) {
                    self.string(point, &point_path, "date", true);
                    self.string(point, &point_path, "description", true);
                    self.enumerated(point, &point_path, "impact", &impacts, true);
                }
            }
        }
    }

    fn act3(&mut self, act3: &Map<String, Value>, path: &str) {
        self.integer(act3, path, "level", 1, 3);
        let nodes = self.string_list(act3, path, "completedNodes", true);
        let rounds = self.integer(act3, path, "totalRounds", 0, u64::from(u32::MAX));

        if let Some(nodes) = nodes {
            let mut seen = HashSet::new();
            if let Some(dup) = nodes.iter().find(|n| !seen.insert(n.as_str())) {
                self.report(
                    child(path, "completedNodes"),
                    format!("contains duplicate node {:?}", dup),
                );
            }
            if let Some(rounds) = rounds {
                if rounds != nodes.len() as u64 {
                    self.report(
                        child(path, "totalRounds"),
                        format!("must equal the number of completed nodes ({})", nodes.len()),
                    );
                }
            }
        }
    }

    fn act4(&mut self, act4: &Map<String, Value>, path: &str) {
        if let Some(report) = self.object(act4, path, "learningReport", true) {
            let report_path = child(path, "learningReport");
            self.string(report, &report_path, "summary", true);
            self.string_list(report, &report_path, "keyLearnings", false);
            self.string_list(report, &report_path, "skillsAssessed", false);
        }
        self.string(act4, path, "pptUrl", false);
        self.object(act4, path, "pptMetadata", false);
    }
}
