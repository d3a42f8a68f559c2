use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::models::{ApplicationState, DatabaseSession};

/// State containers that hold their own copy of Act 2 results.
///
/// `scope` identifies the session the data belongs to. Implementations are
/// called from spawned tasks and may fail independently of each other.
#[async_trait]
pub trait DependentSinks: Send + Sync {
    async fn set_timeline_analysis(&self, scope: &str, data: Value) -> anyhow::Result<()>;

    async fn set_claim_analysis(&self, scope: &str, data: Value) -> anyhow::Result<()>;

    async fn set_evidence_questions(&self, scope: &str, data: Value) -> anyhow::Result<()>;
}

/// Which dependent container a sync task writes to.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SyncTarget {
    TimelineAnalysis,
    ClaimAnalysis,
    EvidenceQuestions,
}

impl SyncTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TimelineAnalysis => "timeline_analysis",
            Self::ClaimAnalysis => "claim_analysis",
            Self::EvidenceQuestions => "evidence_questions",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SyncFailure {
    pub target: SyncTarget,
    pub message: String,
}

/// Outcome of one synchronization run. Failures are collected, never raised.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SyncReport {
    pub synced: Vec<SyncTarget>,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn log_summary(&self, session_id: Uuid) {
        if self.is_clean() {
            tracing::debug!(
                "Synchronized {} dependent store(s) for session {}",
                self.synced.len(),
                session_id
            );
        } else {
            tracing::warn!(
                "Session {}: {} store(s) synchronized, {} failed",
                session_id,
                self.synced.len(),
                self.failures.len()
            );
        }
    }
}

/// Push the restored Act 2 results into every dependent container.
///
/// Each container is written by its own spawned task, so one failing or
/// panicking sink does not stop the others. Containers whose data is absent
/// from `restored` are left untouched.
pub async fn sync_to_all_stores(
    session: &DatabaseSession,
    restored: &ApplicationState,
    sinks: Arc<dyn DependentSinks>,
) -> SyncReport {
    let scope = session.id.to_string();
    let jobs = [
        (SyncTarget::TimelineAnalysis, &restored.timeline_analysis),
        (SyncTarget::ClaimAnalysis, &restored.claim_analysis),
        (SyncTarget::EvidenceQuestions, &restored.evidence_questions),
    ];

    let mut handles = Vec::new();
    for (target, data) in jobs {
        let Some(data) = data.clone().filter(|v| !v.is_null()) else {
            continue;
        };
        let sinks = Arc::clone(&sinks);
        let scope = scope.clone();
        let handle = tokio::spawn(async move {
            match target {
                SyncTarget::TimelineAnalysis => sinks.set_timeline_analysis(&scope, data).await,
                SyncTarget::ClaimAnalysis => sinks.set_claim_analysis(&scope, data).await,
                SyncTarget::EvidenceQuestions => sinks.set_evidence_questions(&scope, data).await,
            }
        });
        handles.push((target, handle));
    }

    let mut report = SyncReport::default();
    for (target, handle) in handles {
        let message = match handle.await {
            Ok(Ok(())) => {
                report.synced.push(target);
                continue;
            }
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("sync task aborted: {}", e),
        };
        tracing::warn!(
            "Failed to sync {} for session {}: {}",
            target.as_str(),
            session.id,
            message
        );
        report.failures.push(SyncFailure { target, message });
    }
    report
}

/// Process-local dependent containers, keyed by scope.
#[derive(Debug, Default)]
pub struct InMemorySinks {
    entries: Mutex<HashMap<(SyncTarget, String), Value>>,
}

impl InMemorySinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: SyncTarget, scope: &str) -> Option<Value> {
        self.entries
            .lock()
            .expect("sink lock poisoned")
            .get(&(target, scope.to_string()))
            .cloned()
    }

    pub fn timeline_analysis(&self, scope: &str) -> Option<Value> {
        self.get(SyncTarget::TimelineAnalysis, scope)
    }

    pub fn claim_analysis(&self, scope: &str) -> Option<Value> {
        self.get(SyncTarget::ClaimAnalysis, scope)
    }

    pub fn evidence_questions(&self, scope: &str) -> Option<Value> {
        self.get(SyncTarget::EvidenceQuestions, scope)
    }

    fn put(&self, target: SyncTarget, scope: &str, data: Value) {
        self.entries
            .lock()
            .expect("sink lock poisoned")
            .insert((target, scope.to_string()), data);
    }
}

#[async_trait]
impl DependentSinks for InMemorySinks {
    async fn set_timeline_analysis(&self, scope: &str, data: Value) -> anyhow::Result<()> {
        self.put(SyncTarget::TimelineAnalysis, scope, data);
        Ok(())
    }

    async fn set_claim_analysis(&self, scope: &str, data: Value) -> anyhow::Result<()> {
        self.put(SyncTarget::ClaimAnalysis, scope, data);
        Ok(())
    }

    async fn set_evidence_questions(&self, scope: &str, data: Value) -> anyhow::Result<()> {
        self.put(SyncTarget::EvidenceQuestions, scope, data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn skips_absent_containers() {
        let session = DatabaseSession::new(Uuid::new_v4(), json!({}));
        let restored = ApplicationState {
            claim_analysis: Some(json!({"claims": ["repayment"]})),
            ..ApplicationState::default()
        };
        let sinks = Arc::new(InMemorySinks::new());

        let report = sync_to_all_stores(&session, &restored, sinks.clone()).await;

        assert_eq!(report.synced, vec![SyncTarget::ClaimAnalysis]);
        assert!(report.is_clean());
        let scope = session.id.to_string();
        assert_eq!(
            sinks.claim_analysis(&scope),
            Some(json!({"claims": ["repayment"]}))
        );
        assert_eq!(sinks.timeline_analysis(&scope), None);
    }
}
