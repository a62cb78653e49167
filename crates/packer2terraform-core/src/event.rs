//! Typed events classified from machine-readable log rows
//!
//! Packer's machine-readable format is
//! `timestamp,target,type,data...`. The first data field is the event's
//! subject (an index or count for artifact and error records), and
//! artifact records carry an attribute name/value pair after it.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::obs;
use crate::reader::Row;

/// Kind of a machine-readable log event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Number of artifacts the build produced
    ArtifactCount,
    /// One attribute of one artifact
    Artifact,
    /// Number of builds that errored
    ErrorCount,
    /// Error message for a failed build
    Error,
    /// Human-readable progress output
    Ui,
    /// Anything else Packer emits (`version`, `build`, ...)
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::ArtifactCount => "artifact-count",
            EventKind::Artifact => "artifact",
            EventKind::ErrorCount => "error-count",
            EventKind::Error => "error",
            EventKind::Ui => "ui",
            EventKind::Other(kind) => kind,
        }
    }
}

impl From<&str> for EventKind {
    fn from(kind: &str) -> Self {
        match kind {
            "artifact-count" => EventKind::ArtifactCount,
            "artifact" => EventKind::Artifact,
            "error-count" => EventKind::ErrorCount,
            "error" => EventKind::Error,
            "ui" => EventKind::Ui,
            other => EventKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified log row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub timestamp: String,
    /// Builder name (empty for global events)
    pub target: String,
    pub kind: EventKind,
    pub subject: String,
    /// `subject` parsed as an integer; 0 when empty or non-numeric
    pub subject_as_int: i64,
    pub attribute_name: String,
    pub attribute_value: String,
}

impl Event {
    /// Wall-clock time of the event, when the timestamp is Unix seconds.
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.timestamp.parse::<i64>().ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}

/// Lenient integer parse: anything unparseable becomes 0.
///
/// Several event kinds carry free text in the subject position, so a
/// failed parse is expected and never an error.
pub fn parse_subject(subject: &str) -> i64 {
    subject.parse().unwrap_or(0)
}

/// Classify a row into an event.
///
/// Rows with fewer than two fields are not events and yield `None`.
pub fn classify(row: &Row) -> Option<Event> {
    if row.len() < 2 {
        return None;
    }

    let subject = row.field(3).to_string();
    Some(Event {
        timestamp: row.field(0).to_string(),
        target: row.field(1).to_string(),
        kind: EventKind::from(row.field(2)),
        subject_as_int: parse_subject(&subject),
        subject,
        attribute_name: row.field(4).to_string(),
        attribute_value: row.field(5).to_string(),
    })
}

/// Classify all rows, dropping the ones that are not events.
pub fn classify_rows(rows: &[Row]) -> Vec<Event> {
    rows.iter()
        .enumerate()
        .filter_map(|(line, row)| match classify(row) {
            Some(event) => {
                if event.kind == EventKind::Ui {
                    obs::emit_ui_message(&event.subject, &event.attribute_name);
                }
                Some(event)
            }
            None => {
                obs::emit_row_skipped(line, row.len());
                None
            }
        })
        .collect()
}
