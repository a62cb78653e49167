//! Artifact reduction
//!
//! Folds the ordered event stream into the list of artifacts the build
//! produced, cross-checking it against the counts Packer declares:
//! - `artifact-count` declares how many artifacts to expect
//! - `artifact` events fill in one attribute of the artifact at their index
//! - `error-count` / `error` report failed builds
//!
//! Failure checks run after the full pass, in a fixed order: count
//! mismatch, then build errors, then an empty result.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::artifact::Artifact;
use crate::error::ConvertError;
use crate::event::{Event, EventKind};
use crate::obs;
use crate::Result;

/// Accumulator threaded through one reduction.
#[derive(Debug, Default)]
struct Reduction {
    declared_artifact_count: i64,
    declared_error_count: i64,
    error_messages: Vec<String>,
    artifacts: BTreeMap<usize, Artifact>,
    first_seen: Option<DateTime<Utc>>,
    last_seen: Option<DateTime<Utc>>,
}

impl Reduction {
    fn apply(mut self, event: &Event) -> Self {
        if let Some(at) = event.occurred_at() {
            self.first_seen.get_or_insert(at);
            self.last_seen = Some(at);
        }

        match event.kind {
            EventKind::ArtifactCount => self.declared_artifact_count = event.subject_as_int,
            EventKind::Artifact => self.apply_artifact(event),
            EventKind::ErrorCount if event.subject_as_int > 0 => {
                self.declared_error_count = event.subject_as_int;
            }
            EventKind::Error => self.error_messages.push(event.subject.clone()),
            _ => {}
        }
        self
    }

    fn apply_artifact(&mut self, event: &Event) {
        let Ok(index) = usize::try_from(event.subject_as_int) else {
            obs::emit_artifact_index_rejected(&event.target, event.subject_as_int);
            return;
        };

        self.artifacts
            .entry(index)
            .or_insert_with(|| Artifact::new(event.target.as_str()))
            .apply(&event.attribute_name, &event.attribute_value);
    }

    /// Number of slots a dense sequence would need to hold every index seen.
    ///
    /// Saturates at `i64::MAX` for an index at the top of the range.
    fn slot_count(&self) -> i64 {
        self.artifacts.keys().next_back().map_or(0, |&highest| {
            i64::try_from(highest)
                .ok()
                .and_then(|highest| highest.checked_add(1))
                .unwrap_or(i64::MAX)
        })
    }

    fn finish(self) -> Result<Vec<Artifact>> {
        let slots = self.slot_count();

        obs::emit_reduced(&obs::ReductionSummary {
            slots,
            declared_artifacts: self.declared_artifact_count,
            declared_errors: self.declared_error_count,
            error_messages: self.error_messages.len(),
            first_seen: self.first_seen,
            last_seen: self.last_seen,
        });

        if self.declared_artifact_count < slots {
            return Err(ConvertError::MissingArtifacts {
                count: self.declared_artifact_count.saturating_sub(slots),
            });
        }

        if self.declared_error_count > 0 && !self.error_messages.is_empty() {
            return Err(ConvertError::BuildErrors {
                messages: self.error_messages,
            });
        }

        let artifacts: Vec<Artifact> = self
            .artifacts
            .into_values()
            .filter(Artifact::has_id)
            .collect();

        if artifacts.is_empty() {
            return Err(ConvertError::NoArtifactsFound);
        }

        Ok(artifacts)
    }
}

/// Reduce an ordered event sequence into the build's artifacts.
///
/// Artifacts come back in ascending index order; entries that never
/// received an `id` are dropped.
///
/// # Errors
///
/// - `ConvertError::MissingArtifacts` when the last `artifact-count` is
///   below the number of artifact slots seen.
/// - `ConvertError::BuildErrors` when a positive `error-count` was seen
///   together with at least one `error` event.
/// - `ConvertError::NoArtifactsFound` when no artifact has an id.
pub fn reduce<'a, I>(events: I) -> Result<Vec<Artifact>>
where
    I: IntoIterator<Item = &'a Event>,
{
    let result = events
        .into_iter()
        .fold(Reduction::default(), Reduction::apply)
        .finish();

    if let Err(err) = &result {
        obs::emit_failed(err);
    }
    result
}
