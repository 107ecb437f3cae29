//! Observability for checkpoint operations
//!
//! Structured JSON logging of checkpoint lifecycle events.
//!
//! # Principles
//!
//! 1. Observability is read-only and never fails the operation it describes
//! 2. No async or background threads
//! 3. Deterministic output
//! 4. Per-value codec calls are never logged
//!
//! # Usage
//!
//! ```ignore
//! use schema_codec::observability::{Event, Logger};
//!
//! Logger::event(Event::CheckpointWritten, &[("values", "42")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

#[cfg(test)]
pub use logger::capture::{capture_events, CapturedLine};
