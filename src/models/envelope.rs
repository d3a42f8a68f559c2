use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Act1Snapshot, Act2Snapshot, Act3Snapshot, Act4Snapshot};

/// Semantic version of the envelope layout written by this build.
pub const SNAPSHOT_VERSION: &str = "1.2.0";

/// Schema version stamped on every envelope written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Newest schema version this build can read. Rows written by a newer build
/// are rejected rather than half-understood.
pub const MAX_SUPPORTED_SCHEMA_VERSION: u32 = 2;

/// Schema version assumed for rows that predate version tracking.
pub const LEGACY_SCHEMA_VERSION: u32 = 1;

/// Versioned container for everything persisted about a teaching session.
///
/// Created on the first successful write for a session and replaced on every
/// later manual or automatic save. `act1` is always present; the remaining Acts
/// stay `None` until the session reaches them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEnvelope {
    pub version: String,
    pub schema_version: u32,
    pub session_state: SessionState,
    pub case_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court_name: Option<String>,
    pub act1: Act1Snapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub act2: Option<Act2Snapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub act3: Option<Act3Snapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub act4: Option<Act4Snapshot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_saved_at: DateTime<Utc>,
    pub save_type: SaveType,
}

impl SnapshotEnvelope {
    /// The most advanced Act that carries data.
    pub fn furthest_populated_act(&self) -> SessionState {
        if self.act4.is_some() {
            SessionState::Act4
        } else if self.act3.is_some() {
            SessionState::Act3
        } else if self.act2.is_some() {
            SessionState::Act2
        } else {
            SessionState::Act1
        }
    }
}

/// Which stage of the teaching session the user has reached.
///
/// - `Act1`: Case intake
/// - `Act2`: Deep analysis
/// - `Act3`: Socratic dialogue
/// - `Act4`: Summary and learning report
/// - `Completed`: Session finished
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Act1,
    Act2,
    Act3,
    Act4,
    Completed,
}

impl SessionState {
    pub const ALL: [SessionState; 5] = [
        Self::Act1,
        Self::Act2,
        Self::Act3,
        Self::Act4,
        Self::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Act1 => "act1",
            Self::Act2 => "act2",
            Self::Act3 => "act3",
            Self::Act4 => "act4",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "act1" => Some(Self::Act1),
            "act2" => Some(Self::Act2),
            "act3" => Some(Self::Act3),
            "act4" => Some(Self::Act4),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Map a UI stage name onto a session state.
    ///
    /// The UI has used several names for its stages over time; all of them are
    /// accepted here.
    pub fn from_ui_stage(stage: &str) -> Option<Self> {
        match stage.trim().to_lowercase().as_str() {
            "act1" | "upload" | "intake" | "case-intake" => Some(Self::Act1),
            "act2" | "analysis" | "deep-analysis" | "deepanalysis" => Some(Self::Act2),
            "act3" | "socratic" | "classroom" | "dialogue" => Some(Self::Act3),
            "act4" | "summary" | "report" => Some(Self::Act4),
            "completed" | "complete" | "done" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// How a snapshot save was triggered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SaveType {
    Manual,
    #[default]
    Auto,
}

impl SaveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Auto => "auto",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(Self::Manual),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }
}
