//! Build artifacts reassembled from `artifact` events

use serde::{Deserialize, Serialize};

/// Attribute carried by an `artifact` event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactAttribute {
    /// `id`: provider-specific identifier, e.g. `us-west-1:ami-df79909b`
    Id,
    /// `files-count`
    FilesCount,
    /// `builder-id`
    BuilderId,
    /// `string`: human-readable description
    Message,
    /// Anything else (`end`, `nil`, `file`, ...)
    Ignored,
}

impl From<&str> for ArtifactAttribute {
    fn from(name: &str) -> Self {
        match name {
            "id" => ArtifactAttribute::Id,
            "files-count" => ArtifactAttribute::FilesCount,
            "builder-id" => ArtifactAttribute::BuilderId,
            "string" => ArtifactAttribute::Message,
            _ => ArtifactAttribute::Ignored,
        }
    }
}

/// One build output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Target (builder name) of the first event that referenced this artifact
    pub builder_target: String,
    pub builder_id: String,
    pub id: String,
    /// `id` split on `:`
    pub id_parts: Vec<String>,
    pub message: String,
    pub files_count: String,
}

impl Artifact {
    pub fn new(builder_target: impl Into<String>) -> Self {
        Artifact {
            builder_target: builder_target.into(),
            ..Default::default()
        }
    }

    /// Apply one attribute. Returns `false` when the attribute is ignored.
    pub fn apply(&mut self, name: &str, value: &str) -> bool {
        match ArtifactAttribute::from(name) {
            ArtifactAttribute::Id => {
                self.id = value.to_string();
                self.id_parts = value.split(':').map(str::to_string).collect();
            }
            ArtifactAttribute::FilesCount => self.files_count = value.to_string(),
            ArtifactAttribute::BuilderId => self.builder_id = value.to_string(),
            ArtifactAttribute::Message => self.message = value.to_string(),
            ArtifactAttribute::Ignored => return false,
        }
        true
    }

    /// Whether the artifact ever received a non-empty id.
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_sets_parts() {
        let mut artifact = Artifact::new("amazon-ebs");
        assert!(artifact.apply("id", "us-west-1:ami-df79909b"));

        assert_eq!(artifact.id, "us-west-1:ami-df79909b");
        assert_eq!(artifact.id_parts, vec!["us-west-1", "ami-df79909b"]);
        assert!(artifact.has_id());
    }

    #[test]
    fn test_id_without_colon_has_single_part() {
        let mut artifact = Artifact::new("docker");
        artifact.apply("id", "sha256");
        assert_eq!(artifact.id_parts, vec!["sha256"]);
    }

    #[test]
    fn test_dispatch_sets_each_field() {
        let mut artifact = Artifact::new("amazon-ebs");
        artifact.apply("builder-id", "mitchellh.amazonebs");
        artifact.apply("string", "AMIs were created");
        artifact.apply("files-count", "0");

        assert_eq!(artifact.builder_target, "amazon-ebs");
        assert_eq!(artifact.builder_id, "mitchellh.amazonebs");
        assert_eq!(artifact.message, "AMIs were created");
        assert_eq!(artifact.files_count, "0");
        assert!(!artifact.has_id());
    }

    #[test]
    fn test_unknown_attributes_are_ignored() {
        let mut artifact = Artifact::new("null");
        assert!(!artifact.apply("end", ""));
        assert!(!artifact.apply("nil", "x"));
        assert_eq!(artifact, Artifact::new("null"));
    }
}
