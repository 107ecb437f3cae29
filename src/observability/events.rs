//! Observable codec lifecycle events
//!
//! Only checkpoint-level operations are observable. Encoding or decoding a
//! single value never logs.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Checkpoint envelope written
    CheckpointWritten,
    /// Checkpoint envelope decoded into values
    CheckpointRestored,
    /// Persisted descriptor compared with the running codec
    CompatibilityResolved,
    /// State read with a previous codec and rewritten with the current one
    MigrationApplied,
    /// Persisted descriptor cannot be read by the running codec
    IncompatibleFormat,
    /// Envelope failed integrity checks
    CheckpointCorrupted,
}

impl Event {
    /// Returns the event name as it appears in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::CheckpointWritten => "CHECKPOINT_WRITTEN",
            Event::CheckpointRestored => "CHECKPOINT_RESTORED",
            Event::CompatibilityResolved => "COMPATIBILITY_RESOLVED",
            Event::MigrationApplied => "MIGRATION_APPLIED",
            Event::IncompatibleFormat => "INCOMPATIBLE_FORMAT",
            Event::CheckpointCorrupted => "CHECKPOINT_CORRUPTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::IncompatibleFormat | Event::CheckpointCorrupted => Severity::Fatal,
            Event::MigrationApplied => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
