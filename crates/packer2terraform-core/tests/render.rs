//! Rendering artifacts through the built-in and custom templates.

use packer2terraform_core::{
    convert, extract_artifacts, render, ConvertError, FailureStage, TemplateError,
    DEFAULT_TEMPLATE,
};

const MULTI_SUCCESS_LOG: &str = "\
1432168589,amazon-ebs,artifact-count,2
1432168589,amazon-ebs,artifact,0,builder-id,mitchellh.amazonebs
1432168589,amazon-ebs,artifact,0,id,us-west-1:ami-df79909b
1432168589,amazon-ebs,artifact,0,files-count,0
1432168589,amazon-ebs,artifact,0,end
1432168589,amazon-ebs,artifact,1,builder-id,mitchellh.amazonebs
1432168589,amazon-ebs,artifact,1,id,us-west-2:ami-df79909c
1432168589,amazon-ebs,artifact,1,files-count,0
1432168589,amazon-ebs,artifact,1,end
";

const EXPECTED_TFVARS: &str = r#"variable "images" {
    default = {

        us-west-1 = "ami-df79909b"
        us-west-2 = "ami-df79909c"
    }
}"#;

#[test]
fn default_template_matches_terraform_variable_block() {
    let doc = convert(MULTI_SUCCESS_LOG.as_bytes(), DEFAULT_TEMPLATE).unwrap();
    assert_eq!(doc, EXPECTED_TFVARS);
}

#[test]
fn custom_template_projects_artifact_fields() {
    let artifacts = extract_artifacts(MULTI_SUCCESS_LOG.as_bytes()).unwrap();
    let template = "{{range .Artifacts}}{{.BuilderType}} {{.BuilderId}} {{index .IdSplit 1}}\n{{end}}";

    let doc = render(&artifacts, template).unwrap();
    assert_eq!(
        doc,
        "amazon-ebs mitchellh.amazonebs ami-df79909b\namazon-ebs mitchellh.amazonebs ami-df79909c\n"
    );
}

#[test]
fn malformed_template_is_a_render_failure() {
    let artifacts = extract_artifacts(MULTI_SUCCESS_LOG.as_bytes()).unwrap();

    let err = render(&artifacts, "{{range .Artifacts}}{{.Id}}").unwrap_err();
    assert_eq!(err.stage(), FailureStage::Render);
    assert!(matches!(
        err,
        ConvertError::Template(TemplateError::Unterminated(_))
    ));
}

#[test]
fn execution_error_produces_no_partial_output() {
    let log = MULTI_SUCCESS_LOG.replace("us-west-2:ami-df79909c", "no-region");
    let err = convert(log.as_bytes(), DEFAULT_TEMPLATE).unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Template(TemplateError::IndexOutOfRange { index: 1, len: 1 })
    ));
}
