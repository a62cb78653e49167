//! Error types for packer2terraform

use std::path::PathBuf;

use thiserror::Error;

/// Stage of the conversion pipeline a failure belongs to.
///
/// The CLI maps each stage to its own process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStage {
    /// Opening or reading the input source
    Input,
    /// Splitting the byte stream into CSV rows
    Parse,
    /// Folding events into artifacts
    Reduce,
    /// Loading or executing the output template
    Render,
}

impl FailureStage {
    /// Process exit code for this stage.
    pub fn exit_code(self) -> u8 {
        match self {
            FailureStage::Input => 1,
            FailureStage::Parse => 2,
            FailureStage::Reduce => 3,
            FailureStage::Render => 6,
        }
    }
}

/// Errors that can occur while converting a Packer log
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Input file could not be opened
    #[error("{}: {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Byte stream is not readable as CSV
    #[error("malformed stream{}: {reason}", .line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    MalformedStream { line: Option<u64>, reason: String },

    /// Declared artifact count is below the number of observed slots.
    ///
    /// `count` is `declared - observed` and therefore negative.
    #[error("Missing {count} artifacts.")]
    MissingArtifacts { count: i64 },

    /// The build reported errors
    #[error("{}", .messages.join("\n"))]
    BuildErrors { messages: Vec<String> },

    /// No artifact carried an id
    #[error("No Artifacts found.")]
    NoArtifactsFound,

    /// Template file could not be read
    #[error("{}: {source}", .path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template parse or execution error
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// JSON output error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConvertError {
    /// Pipeline stage that produced this error.
    pub fn stage(&self) -> FailureStage {
        match self {
            ConvertError::Input { .. } => FailureStage::Input,
            ConvertError::MalformedStream { .. } => FailureStage::Parse,
            ConvertError::MissingArtifacts { .. }
            | ConvertError::BuildErrors { .. }
            | ConvertError::NoArtifactsFound => FailureStage::Reduce,
            ConvertError::TemplateRead { .. }
            | ConvertError::Template(_)
            | ConvertError::Serialization(_) => FailureStage::Render,
        }
    }
}

impl From<csv::Error> for ConvertError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line());
        let reason = match err.kind() {
            csv::ErrorKind::Io(io) => io.to_string(),
            csv::ErrorKind::Utf8 { err, .. } => format!("invalid UTF-8 in field {}", err.field()),
            _ => err.to_string(),
        };
        ConvertError::MalformedStream { line, reason }
    }
}

/// Errors produced while parsing or executing a template
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unclosed action starting at byte {offset}")]
    UnclosedAction { offset: usize },

    #[error("unclosed comment starting at byte {offset}")]
    UnclosedComment { offset: usize },

    #[error("unknown action: {{{{{0}}}}}")]
    UnknownAction(String),

    #[error("malformed index call: {0}")]
    BadIndex(String),

    #[error("unexpected {{{{{0}}}}}")]
    Unexpected(String),

    #[error("unterminated {{{{{0}}}}} block")]
    Unterminated(String),

    #[error("can't evaluate field {field} in {scope}")]
    UnknownField { field: String, scope: &'static str },

    #[error("error calling index: index out of range: {index} (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("can't range over {0}")]
    NotIterable(&'static str),

    #[error("can't print {0}")]
    NotPrintable(&'static str),
}

/// Result type for packer2terraform operations
pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifacts_keeps_signed_count() {
        let err = ConvertError::MissingArtifacts { count: -1 };
        assert_eq!(err.to_string(), "Missing -1 artifacts.");
    }

    #[test]
    fn test_build_errors_join_with_newline() {
        let err = ConvertError::BuildErrors {
            messages: vec!["first".to_string(), "second".to_string()],
        };
        assert_eq!(err.to_string(), "first\nsecond");
    }

    #[test]
    fn test_stage_exit_codes_are_distinct() {
        let codes = [
            FailureStage::Input.exit_code(),
            FailureStage::Parse.exit_code(),
            FailureStage::Reduce.exit_code(),
            FailureStage::Render.exit_code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            assert_ne!(*a, 0);
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_malformed_stream_display_includes_line() {
        let err = ConvertError::MalformedStream {
            line: Some(4),
            reason: "invalid UTF-8 in field 2".to_string(),
        };
        assert_eq!(err.to_string(), "malformed stream at line 4: invalid UTF-8 in field 2");
        assert_eq!(err.stage(), FailureStage::Parse);
    }

    #[test]
    fn test_template_error_is_render_stage() {
        let err: ConvertError = TemplateError::Unterminated("range".to_string()).into();
        assert_eq!(err.stage(), FailureStage::Render);
        assert_eq!(err.to_string(), "unterminated {{range}} block");
    }
}
