//! End-to-end conversion: bytes → rows → events → artifacts → text

use std::io::Read;

use tracing::debug;

use crate::artifact::Artifact;
use crate::config::{ConvertConfig, OutputFormat, TemplateSource};
use crate::error::{ConvertError, FailureStage};
use crate::event::classify_rows;
use crate::obs::{self, ConvertSpan};
use crate::reader::read_rows;
use crate::reducer::reduce;
use crate::template::Template;
use crate::Result;

/// Read a machine-readable log and reduce it to the build's artifacts.
pub fn extract_artifacts<R: Read>(input: R) -> Result<Vec<Artifact>> {
    let rows = read_rows(input)?;
    let events = classify_rows(&rows);
    obs::emit_rows_read(rows.len(), events.len());
    reduce(&events)
}

/// Render artifacts through template source text.
pub fn render(artifacts: &[Artifact], template: &str) -> Result<String> {
    let template = Template::parse(template)?;
    Ok(template.render(artifacts)?)
}

/// Convert a machine-readable log to text in one call.
pub fn convert<R: Read>(input: R, template: &str) -> Result<String> {
    let artifacts = extract_artifacts(input)?;
    render(&artifacts, template)
}

/// Keep only artifacts produced by `builder`.
///
/// # Errors
///
/// `ConvertError::NoArtifactsFound` when nothing matches.
pub fn filter_builder(artifacts: Vec<Artifact>, builder: &str) -> Result<Vec<Artifact>> {
    let before = artifacts.len();
    let kept: Vec<Artifact> = artifacts
        .into_iter()
        .filter(|a| a.builder_target == builder)
        .collect();
    debug!(builder = %builder, before = before, kept = kept.len(), "Filtered artifacts by builder");

    if kept.is_empty() {
        return Err(ConvertError::NoArtifactsFound);
    }
    Ok(kept)
}

/// Run a full conversion as described by `config`.
pub fn run(config: &ConvertConfig) -> Result<String> {
    let _span = ConvertSpan::enter(&config.input.label());

    let result = run_stages(config);
    // reduction failures are reported by the reducer itself
    if let Err(err) = &result {
        if err.stage() != FailureStage::Reduce {
            obs::emit_failed(err);
        }
    }
    result
}

fn run_stages(config: &ConvertConfig) -> Result<String> {
    let mut artifacts = extract_artifacts(config.input.open()?)?;
    if let Some(builder) = &config.builder {
        artifacts = filter_builder(artifacts, builder)?;
    }
    debug!(format = %config.format, artifacts = artifacts.len(), "Writing output");

    match config.format {
        OutputFormat::Template => {
            let template = config.template.load()?;
            render(&artifacts, &template)
        }
        OutputFormat::Json => {
            if let TemplateSource::File(path) = &config.template {
                obs::emit_template_ignored(path);
            }
            Ok(serde_json::to_string_pretty(&artifacts)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::DEFAULT_TEMPLATE;

    const SUCCESS_LOG: &str = "\
1432168589,amazon-ebs,artifact-count,1
1432168589,amazon-ebs,artifact,0,builder-id,mitchellh.amazonebs
1432168589,amazon-ebs,artifact,0,id,us-west-1:ami-df79909b
1432168589,amazon-ebs,artifact,0,files-count,0
1432168589,amazon-ebs,artifact,0,end
";

    #[test]
    fn test_convert_default_template() {
        let doc = convert(SUCCESS_LOG.as_bytes(), DEFAULT_TEMPLATE).unwrap();
        assert!(doc.contains("        us-west-1 = \"ami-df79909b\""));
    }

    #[test]
    fn test_render_propagates_template_error() {
        let artifacts = extract_artifacts(SUCCESS_LOG.as_bytes()).unwrap();
        let err = render(&artifacts, "{{range .Artifacts}}").unwrap_err();
        assert!(matches!(err, ConvertError::Template(_)));
    }

    #[test]
    fn test_filter_builder() {
        let mut ebs = Artifact::new("amazon-ebs");
        ebs.apply("id", "us-west-1:ami-1");
        let mut docker = Artifact::new("docker");
        docker.apply("id", "sha256:abc");

        let kept = filter_builder(vec![ebs.clone(), docker], "amazon-ebs").unwrap();
        assert_eq!(kept, vec![ebs.clone()]);

        assert!(matches!(
            filter_builder(vec![ebs], "qemu"),
            Err(ConvertError::NoArtifactsFound)
        ));
    }
}
