//! Conversion between the UI-owned [`ApplicationState`] and the persisted
//! [`SnapshotEnvelope`].
//!
//! - [`to_database`] builds an envelope from a state (synchronous, pure).
//! - [`to_store`] rebuilds a state from a stored envelope of any supported
//!   schema version, optionally kicking off [`sync_to_all_stores`] in the
//!   background.
//! - [`validate`] checks any JSON value against the envelope schema and
//!   reports every violation with its dotted path.
//!
//! The engine keeps no state between calls and performs no I/O.
//!
//! [`ApplicationState`]: crate::models::ApplicationState
//! [`SnapshotEnvelope`]: crate::models::SnapshotEnvelope

pub mod aliases;
mod acts;
mod builder;
mod restorer;
mod sync;
mod validate;

pub use builder::*;
pub use restorer::*;
pub use sync::*;
pub use validate::*;

use serde::{Deserialize, Serialize};

use crate::models::SaveType;

/// Options shared by both conversion directions.
///
/// The default validates every envelope and, on failure, logs the problems
/// and still returns the envelope: a flawed but recoverable record is better
/// than lost progress. Strict checking and skipping validation are both
/// explicit opt-ins via [`ConversionOptions::strict`] and
/// [`ConversionOptions::unvalidated`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOptions {
    /// Fail the write when the built envelope does not validate.
    pub strict: bool,
    /// Do not validate the built envelope at all.
    pub skip_validation: bool,
    pub save_type: SaveType,
    /// After restoring, push Act 2 results into the dependent state containers.
    pub sync_stores: bool,
    /// Mark the restored state as read-only in its provenance block.
    pub read_only: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            strict: false,
            skip_validation: false,
            save_type: SaveType::Auto,
            sync_stores: true,
            read_only: false,
        }
    }
}

impl ConversionOptions {
    /// Reject envelopes that fail validation.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Skip validation entirely. Every use is logged when the envelope is built.
    pub fn unvalidated() -> Self {
        Self {
            skip_validation: true,
            ..Self::default()
        }
    }

    pub fn with_save_type(mut self, save_type: SaveType) -> Self {
        self.save_type = save_type;
        self
    }

    pub fn with_sync_stores(mut self, sync_stores: bool) -> Self {
        self.sync_stores = sync_stores;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}
