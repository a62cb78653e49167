//! Observability tests for conversion tracing.
//!
//! These tests verify that structured tracing events are emitted for the
//! pipeline's lifecycle: rows read, reduction summary, failures.

use packer2terraform_core::{
    emit_artifact_index_rejected, emit_failed, emit_reduced, emit_rows_read, emit_ui_message,
    extract_artifacts, run, ConvertConfig, ConvertError, ConvertSpan, OutputFormat,
    ReductionSummary,
};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_emit_rows_read() {
    emit_rows_read(12, 10);
    assert!(logs_contain("convert.rows_read"));
}

#[traced_test]
#[test]
fn test_emit_ui_message() {
    emit_ui_message("say", "==> amazon-ebs: Deleting temporary keypair...");
    assert!(logs_contain("convert.ui"));
    assert!(logs_contain("Deleting temporary keypair"));
}

#[traced_test]
#[test]
fn test_emit_reduced_with_time_window() {
    let summary = ReductionSummary {
        slots: 2,
        declared_artifacts: 2,
        first_seen: chrono::DateTime::from_timestamp(1432168580, 0),
        last_seen: chrono::DateTime::from_timestamp(1432168589, 0),
        ..Default::default()
    };
    emit_reduced(&summary);
    assert!(logs_contain("convert.reduced"));
    assert!(logs_contain("duration_secs=Some(9)"));
}

#[traced_test]
#[test]
fn test_emit_failed_logs_stage() {
    emit_failed(&ConvertError::NoArtifactsFound);
    assert!(logs_contain("convert.failed"));
    assert!(logs_contain("Reduce"));
}

#[traced_test]
#[test]
fn test_negative_index_is_logged() {
    emit_artifact_index_rejected("amazon-ebs", -1);
    assert!(logs_contain("convert.artifact_index_rejected"));
}

#[traced_test]
#[test]
fn test_failed_reduction_is_logged() {
    let _span = ConvertSpan::enter("inline");
    let result = extract_artifacts("1,,error-count,1\n1,a,error,boom\n".as_bytes());
    assert!(result.is_err());
    assert!(logs_contain("convert.failed"));
    assert!(logs_contain("boom"));
}

#[traced_test]
#[test]
fn test_json_output_warns_about_unused_template() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("build.csv");
    std::fs::write(&log, "1,a,artifact-count,1\n1,a,artifact,0,id,us-west-1:ami-1\n").unwrap();
    let template = dir.path().join("images.tmpl");
    std::fs::write(&template, "{{range .Artifacts}}{{.Id}}{{end}}").unwrap();

    let config = ConvertConfig::default()
        .with_input_file(&log)
        .with_template_file(&template)
        .with_format(OutputFormat::Json);

    let doc = run(&config).unwrap();
    assert!(doc.contains("us-west-1:ami-1"));
    assert!(logs_contain("convert.template_ignored"));
    assert!(logs_contain("images.tmpl"));
}

#[traced_test]
#[test]
fn test_json_output_with_builtin_template_is_quiet() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("build.csv");
    std::fs::write(&log, "1,a,artifact-count,1\n1,a,artifact,0,id,us-west-1:ami-1\n").unwrap();

    let config = ConvertConfig::default()
        .with_input_file(&log)
        .with_format(OutputFormat::Json);

    run(&config).unwrap();
    assert!(!logs_contain("convert.template_ignored"));
}
