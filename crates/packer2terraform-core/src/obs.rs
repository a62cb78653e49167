//! Structured observability hooks for the conversion pipeline.
//!
//! This module provides:
//! - A conversion-scoped tracing span via the `ConvertSpan` RAII guard
//! - Emission functions for pipeline events: rows read, rows skipped,
//!   Packer UI output, rejected artifact indices, an unused template file,
//!   reduction summary, failure
//!
//! Filter with `RUST_LOG`, e.g. `RUST_LOG=packer2terraform_core=debug`.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info, trace, warn};

use crate::error::ConvertError;

/// RAII guard that enters a conversion-scoped tracing span.
///
/// # Example
///
/// ```ignore
/// let _span = ConvertSpan::enter("build.csv");
/// // every event emitted now carries source = "build.csv"
/// ```
pub struct ConvertSpan {
    _span: tracing::span::EnteredSpan,
}

impl ConvertSpan {
    /// Create and enter a span tagged with the input source label.
    pub fn enter(source: &str) -> Self {
        let span = tracing::info_span!("packer2terraform.convert", source = %source);
        Self {
            _span: span.entered(),
        }
    }
}

/// Counters reported once a reduction pass completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReductionSummary {
    /// Highest artifact index seen + 1
    pub slots: i64,
    pub declared_artifacts: i64,
    pub declared_errors: i64,
    pub error_messages: usize,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
}

/// Emit event: the input stream was split into rows.
pub fn emit_rows_read(rows: usize, events: usize) {
    debug!(event = "convert.rows_read", rows = rows, events = events);
}

/// Emit event: a row was too short to classify.
pub fn emit_row_skipped(row: usize, fields: usize) {
    trace!(event = "convert.row_skipped", row = row, fields = fields);
}

/// Emit event: a Packer `ui` line (say/message/error) passed through.
pub fn emit_ui_message(level: &str, text: &str) {
    debug!(event = "convert.ui", level = %level, text = %text);
}

/// Emit event: an `artifact` event carried a negative index (warning level).
pub fn emit_artifact_index_rejected(target: &str, index: i64) {
    warn!(event = "convert.artifact_index_rejected", target = %target, index = index);
}

/// Emit event: a template file was given but JSON output does not use it.
pub fn emit_template_ignored(path: &Path) {
    warn!(event = "convert.template_ignored", template = %path.display(), format = "json");
}

/// Emit event: reduction pass finished.
pub fn emit_reduced(summary: &ReductionSummary) {
    let duration_secs = match (summary.first_seen, summary.last_seen) {
        (Some(first), Some(last)) => Some((last - first).num_seconds()),
        _ => None,
    };
    info!(
        event = "convert.reduced",
        slots = summary.slots,
        declared_artifacts = summary.declared_artifacts,
        declared_errors = summary.declared_errors,
        error_messages = summary.error_messages,
        first_seen = ?summary.first_seen,
        duration_secs = ?duration_secs,
    );
}

/// Emit event: conversion failed (warning level).
pub fn emit_failed(error: &ConvertError) {
    warn!(
        event = "convert.failed",
        stage = ?error.stage(),
        error = %error,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_span_create() {
        // Just ensure ConvertSpan::enter doesn't panic
        let _span = ConvertSpan::enter("stdin");
    }
}
