//! packer2terraform: Packer machine-readable output to Terraform variables
//!
//! Interprets the CSV event log written by `packer -machine-readable build`
//! and renders the artifacts it describes through a template.
//!
//! ## Pipeline
//!
//! - [`reader`]: raw bytes into ragged CSV rows
//! - [`event`]: rows into typed events
//! - [`reducer`]: events into validated artifacts
//! - [`template`]: artifacts into text
//!
//! ```ignore
//! let doc = packer2terraform_core::convert(std::io::stdin(), DEFAULT_TEMPLATE)?;
//! ```

pub mod artifact;
pub mod config;
pub mod error;
pub mod event;
pub mod obs;
pub mod pipeline;
pub mod reader;
pub mod reducer;
pub mod telemetry;
pub mod template;

pub use artifact::{Artifact, ArtifactAttribute};
pub use config::{ConvertConfig, InputSource, OutputFormat, TemplateSource};
pub use error::{ConvertError, FailureStage, Result, TemplateError};
pub use event::{classify, classify_rows, Event, EventKind};
pub use obs::{
    emit_artifact_index_rejected, emit_failed, emit_reduced, emit_row_skipped, emit_rows_read,
    emit_template_ignored, emit_ui_message, ConvertSpan, ReductionSummary,
};
pub use pipeline::{convert, extract_artifacts, filter_builder, render, run};
pub use reader::{read_rows, Row};
pub use reducer::reduce;
pub use telemetry::init_tracing;
pub use template::{Template, DEFAULT_TEMPLATE};

/// packer2terraform version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
