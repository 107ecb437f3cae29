//! Structured JSON logger
//!
//! - One JSON object per line
//! - `event` first, then `severity`, then fields sorted by key
//! - INFO / WARN go to stdout, ERROR / FATAL to stderr
//! - Synchronous, no buffering

use std::fmt;
use std::io::{self, Write};

use super::events::Event;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Normal operations
    Info = 1,
    /// State was readable only through an older codec
    Warn = 2,
    /// Operation refused, process may continue
    Error = 3,
    /// Persisted state is unusable
    Fatal = 4,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    /// ERROR and FATAL lines go to stderr
    pub fn uses_stderr(&self) -> bool {
        *self >= Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub struct Logger;

impl Logger {
    /// Log an event at its own severity
    pub fn event(event: Event, fields: &[(&str, &str)]) {
        Self::log(event.severity(), event.as_str(), fields);
    }

    /// Log a named event at an explicit severity
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if Self::captured(severity, event, fields) {
            return;
        }

        // Logging never fails the operation being logged.
        let _ = if severity.uses_stderr() {
            Self::log_to_writer(severity, event, fields, &mut io::stderr().lock())
        } else {
            Self::log_to_writer(severity, event, fields, &mut io::stdout().lock())
        };
    }

    #[cfg(test)]
    fn captured(severity: Severity, event: &str, fields: &[(&str, &str)]) -> bool {
        capture::record(severity, event, fields)
    }

    #[cfg(not(test))]
    fn captured(_severity: Severity, _event: &str, _fields: &[(&str, &str)]) -> bool {
        false
    }

    /// Write one rendered line to `writer` and flush it
    pub fn log_to_writer<W: Write + ?Sized>(
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) -> io::Result<()> {
        let line = Self::render(severity, event, fields);
        writer.write_all(line.as_bytes())?;
        writer.flush()
    }

    /// Render one log line, including the trailing newline
    pub fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut line = String::with_capacity(128);
        line.push_str("{\"event\":");
        push_json_string(&mut line, event);
        line.push_str(",\"severity\":");
        push_json_string(&mut line, severity.as_str());

        let mut sorted: Vec<&(&str, &str)> = fields.iter().collect();
        sorted.sort_by_key(|(key, _)| *key);
        for (key, value) in sorted {
            line.push(',');
            push_json_string(&mut line, key);
            line.push(':');
            push_json_string(&mut line, value);
        }

        line.push_str("}\n");
        line
    }

    /// Capture log output for testing
    #[cfg(test)]
    pub fn capture_log(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut buffer = Vec::new();
        Logger::log_to_writer(severity, event, fields, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }
}


fn push_json_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}
