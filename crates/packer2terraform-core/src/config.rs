//! Conversion configuration
//!
//! Where the log comes from, which template renders it, and which output
//! format is produced. The CLI fills this from flags and `PACKER2TERRAFORM_*`
//! environment variables.

use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

use crate::error::ConvertError;
use crate::template::DEFAULT_TEMPLATE;
use crate::Result;

/// Source of the machine-readable log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InputSource {
    /// Read from standard input
    #[default]
    Stdin,
    /// Read from a CSV file
    File(PathBuf),
}

impl InputSource {
    /// Open the source for reading.
    pub fn open(&self) -> Result<Box<dyn Read>> {
        match self {
            InputSource::Stdin => Ok(Box::new(BufReader::new(io::stdin()))),
            InputSource::File(path) => {
                let file = File::open(path).map_err(|source| ConvertError::Input {
                    path: path.clone(),
                    source,
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }

    /// Short label used in logs.
    pub fn label(&self) -> String {
        match self {
            InputSource::Stdin => "stdin".to_string(),
            InputSource::File(path) => path.display().to_string(),
        }
    }
}

/// Source of the output template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateSource {
    /// The built-in Terraform `images` template
    #[default]
    Builtin,
    /// A template file
    File(PathBuf),
}

impl TemplateSource {
    /// Load the template text.
    pub fn load(&self) -> Result<Cow<'static, str>> {
        match self {
            TemplateSource::Builtin => Ok(Cow::Borrowed(DEFAULT_TEMPLATE)),
            TemplateSource::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| ConvertError::TemplateRead {
                    path: path.clone(),
                    source,
                }),
        }
    }
}

/// How artifacts are written out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum OutputFormat {
    /// Render through the template
    #[default]
    Template,
    /// Pretty-printed JSON array of artifacts
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Template => write!(f, "template"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Everything one conversion run needs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertConfig {
    pub input: InputSource,
    pub template: TemplateSource,
    pub format: OutputFormat,
    /// Only keep artifacts produced by this builder target
    pub builder: Option<String>,
}

impl ConvertConfig {
    /// Read the log from a file instead of stdin.
    pub fn with_input_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = InputSource::File(path.into());
        self
    }

    /// Render with a template file instead of the built-in template.
    pub fn with_template_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.template = TemplateSource::File(path.into());
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_builder(mut self, builder: impl Into<String>) -> Self {
        self.builder = Some(builder.into());
        self
    }
}
