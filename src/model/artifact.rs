// src/model/artifact.rs

//! Resolved dependency artifacts and their type handlers

use super::project::{FieldMap, Project};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Dependency scope of a resolved artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Compile,
    Provided,
    Runtime,
    Test,
    System,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Provided => "provided",
            Self::Runtime => "runtime",
            Self::Test => "test",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compile" => Ok(Self::Compile),
            "provided" => Ok(Self::Provided),
            "runtime" => Ok(Self::Runtime),
            "test" => Ok(Self::Test),
            "system" => Ok(Self::System),
            other => Err(format!("unknown scope: {}", other)),
        }
    }
}

/// Packaging knowledge for an artifact type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHandler {
    /// File extension of the artifact file
    pub extension: String,
    /// Classifier implied by the type (`test-jar` -> `tests`)
    pub classifier: Option<&'static str>,
    pub language: &'static str,
    pub packaging: String,
}

impl ArtifactHandler {
    /// Handler for a dependency type
    pub fn for_type(artifact_type: &str) -> Self {
        let (extension, classifier, language) = match artifact_type {
            "jar" | "maven-plugin" | "ejb" | "bundle" => ("jar", None, "java"),
            "test-jar" => ("jar", Some("tests"), "java"),
            "ejb-client" => ("jar", Some("client"), "java"),
            "java-source" => ("jar", Some("sources"), "java"),
            "javadoc" => ("jar", Some("javadoc"), "java"),
            "war" => ("war", None, "java"),
            "ear" => ("ear", None, "java"),
            "rar" => ("rar", None, "java"),
            "pom" => ("pom", None, "none"),
            other => (other, None, "none"),
        };
        Self {
            extension: extension.to_string(),
            classifier,
            language,
            packaging: artifact_type.to_string(),
        }
    }

    /// Handler fields exposed to templates
    pub fn fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("extension", self.extension.clone());
        fields.insert("language", self.language.to_string());
        fields.insert("packaging", self.packaging.clone());
        if let Some(classifier) = self.classifier {
            fields.insert("classifier", classifier.to_string());
        }
        fields
    }
}

/// A resolved artifact supplied by the host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Artifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(rename = "type", default = "default_type")]
    pub artifact_type: String,
    #[serde(default)]
    pub classifier: Option<String>,
    #[serde(default)]
    pub scope: Scope,
    /// Resolved on-disk location
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Extension override; otherwise derived from the type handler
    #[serde(default)]
    pub extension: Option<String>,
    /// Project model of the artifact, when the host resolved one
    #[serde(default)]
    pub project: Option<Box<Project>>,
}

fn default_type() -> String {
    "jar".to_string()
}

impl Artifact {
    /// Create a jar artifact in compile scope
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            artifact_type: default_type(),
            classifier: None,
            scope: Scope::Compile,
            file: None,
            extension: None,
            project: None,
        }
    }

    pub fn with_type(mut self, artifact_type: &str) -> Self {
        self.artifact_type = artifact_type.to_string();
        self
    }

    pub fn with_classifier(mut self, classifier: &str) -> Self {
        self.classifier = Some(classifier.to_string());
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_project(mut self, project: Project) -> Self {
        self.project = Some(Box::new(project));
        self
    }

    /// Type handler, honoring an explicit extension override
    pub fn handler(&self) -> ArtifactHandler {
        let mut handler = ArtifactHandler::for_type(&self.artifact_type);
        if let Some(extension) = &self.extension {
            handler.extension = extension.clone();
        }
        handler
    }

    /// Declared file extension
    pub fn extension(&self) -> String {
        self.handler().extension
    }

    /// Explicit classifier, or the one implied by the type handler
    pub fn effective_classifier(&self) -> Option<String> {
        match self.classifier.as_deref() {
            Some(c) if !c.is_empty() => Some(c.to_string()),
            _ => self.handler().classifier.map(str::to_string),
        }
    }

    /// `groupId:artifactId:type[:classifier]`
    pub fn conflict_id(&self) -> String {
        match self.classifier.as_deref() {
            Some(c) if !c.is_empty() => format!(
                "{}:{}:{}:{}",
                self.group_id, self.artifact_id, self.artifact_type, c
            ),
            _ => format!("{}:{}:{}", self.group_id, self.artifact_id, self.artifact_type),
        }
    }

    /// `groupId:artifactId:type[:classifier]:version`
    pub fn id(&self) -> String {
        format!("{}:{}", self.conflict_id(), self.version)
    }

    pub fn group_id_path(&self) -> String {
        self.group_id.replace('.', "/")
    }

    /// Descriptive fields exposed to templates
    pub fn fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("groupId", self.group_id.clone());
        fields.insert("artifactId", self.artifact_id.clone());
        fields.insert("version", self.version.clone());
        fields.insert("baseVersion", self.version.clone());
        fields.insert("type", self.artifact_type.clone());
        fields.insert("scope", self.scope.to_string());
        fields.insert("id", self.id());
        fields.insert("dependencyConflictId", self.conflict_id());
        if let Some(classifier) = self.classifier.as_deref().filter(|c| !c.is_empty()) {
            fields.insert("classifier", classifier.to_string());
        }
        if let Some(file) = &self.file {
            fields.insert("file", file.to_string_lossy().to_string());
        }
        fields
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id(), self.scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_extensions() {
        assert_eq!(ArtifactHandler::for_type("jar").extension, "jar");
        assert_eq!(ArtifactHandler::for_type("test-jar").extension, "jar");
        assert_eq!(ArtifactHandler::for_type("war").extension, "war");
        assert_eq!(ArtifactHandler::for_type("tar.gz").extension, "tar.gz");
    }

    #[test]
    fn test_effective_classifier() {
        let plain = Artifact::new("g", "a", "1");
        assert_eq!(plain.effective_classifier(), None);

        let tests = Artifact::new("g", "a", "1").with_type("test-jar");
        assert_eq!(tests.effective_classifier().as_deref(), Some("tests"));

        let explicit = Artifact::new("g", "a", "1").with_classifier("linux");
        assert_eq!(explicit.effective_classifier().as_deref(), Some("linux"));
    }

    #[test]
    fn test_extension_override() {
        let mut artifact = Artifact::new("g", "a", "1").with_type("distribution");
        assert_eq!(artifact.extension(), "distribution");
        artifact.extension = Some("zip".to_string());
        assert_eq!(artifact.extension(), "zip");
    }

    #[test]
    fn test_ids() {
        let artifact = Artifact::new("org.example", "core", "2.0").with_classifier("sources");
        assert_eq!(artifact.conflict_id(), "org.example:core:jar:sources");
        assert_eq!(artifact.id(), "org.example:core:jar:sources:2.0");
        assert_eq!(artifact.group_id_path(), "org/example");
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!("runtime".parse::<Scope>().unwrap(), Scope::Runtime);
        assert!("import".parse::<Scope>().is_err());
    }
}
