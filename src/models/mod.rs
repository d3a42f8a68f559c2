//! Domain models for Casebook.
//!
//! # Core Concepts
//!
//! ## Persisted Snapshot
//!
//! - [`SnapshotEnvelope`]: Versioned container for one teaching session. Holds the
//!   session metadata and one snapshot per Act. Acts are populated additively:
//!   once an Act has been written it is never removed by a later save.
//! - [`Act1Snapshot`]: Case intake (parties, facts, evidence, reasoning).
//! - [`Act2Snapshot`]: Deep analysis (narrative chapters, timeline analysis, claims).
//! - [`Act3Snapshot`]: Socratic dialogue progress.
//! - [`Act4Snapshot`]: Learning report and generated slides.
//!
//! ## UI State
//!
//! - [`ApplicationState`]: The mutable tree owned by the UI. Untrusted AI output
//!   lives here as raw JSON and only becomes typed once it passes through the
//!   normalizers on its way into a snapshot.
//! - [`DatabaseSession`]: A stored envelope as read back from storage, possibly
//!   written by an older schema version.

mod act1;
mod act2;
mod act3;
mod act4;
mod envelope;
mod session;
mod state;

pub use act1::*;
pub use act2::*;
pub use act3::*;
pub use act4::*;
pub use envelope::*;
pub use session::*;
pub use state::*;
