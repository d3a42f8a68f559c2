use serde::{Deserialize, Serialize};

/// Progress through the Socratic dialogue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Act3Snapshot {
    /// Difficulty level, 1 through 3.
    pub level: u8,
    /// Dialogue nodes the student has finished, sorted and without duplicates.
    pub completed_nodes: Vec<String>,
    /// Always `completed_nodes.len()`.
    pub total_rounds: u32,
}

impl Act3Snapshot {
    pub const MIN_LEVEL: u8 = 1;
    pub const MAX_LEVEL: u8 = 3;

    pub fn new(level: u8, completed_nodes: impl IntoIterator<Item = String>) -> Self {
        let mut completed_nodes: Vec<String> = completed_nodes.into_iter().collect();
        completed_nodes.sort();
        completed_nodes.dedup();
        Self {
            level: level.clamp(Self::MIN_LEVEL, Self::MAX_LEVEL),
            total_rounds: completed_nodes.len() as u32,
            completed_nodes,
        }
    }
}
