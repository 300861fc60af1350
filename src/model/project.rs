// src/model/project.rs

//! Project model supplied by the host build

use super::artifact::Artifact;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Fixed accessor map over an object's descriptive fields
///
/// Keys use the host build's property spelling (`groupId`,
/// `build.finalName`, ...). Built once per object and consulted by
/// interpolation and content filtering instead of any runtime reflection.
pub type FieldMap = BTreeMap<&'static str, String>;

/// Build paths of a project, relative paths resolve against the base directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BuildPaths {
    /// Build directory (`target`)
    pub directory: PathBuf,
    /// Compiled classes directory
    pub output_directory: PathBuf,
    /// Compiled test classes directory
    pub test_output_directory: PathBuf,
    /// Explicit final name; defaults to `artifactId-version`
    pub final_name: Option<String>,
}

impl Default for BuildPaths {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("target"),
            output_directory: PathBuf::from("target/classes"),
            test_output_directory: PathBuf::from("target/test-classes"),
            final_name: None,
        }
    }
}

/// A project model as loaded by the host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Project {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub packaging: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    /// Directory containing the project descriptor
    pub basedir: PathBuf,
    pub build: BuildPaths,
    /// Reporting output directory (`target/site`)
    pub reporting_directory: PathBuf,
    /// User-declared project properties
    pub properties: BTreeMap<String, String>,
    /// The project's own main artifact, if attached
    pub artifact: Option<Artifact>,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            group_id: String::new(),
            artifact_id: String::new(),
            version: String::new(),
            packaging: "jar".to_string(),
            name: None,
            description: None,
            url: None,
            basedir: PathBuf::from("."),
            build: BuildPaths::default(),
            reporting_directory: PathBuf::from("target/site"),
            properties: BTreeMap::new(),
            artifact: None,
        }
    }
}

impl Project {
    /// Create a project with the given coordinates
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            ..Self::default()
        }
    }

    /// Set the base directory
    pub fn with_basedir(mut self, basedir: impl Into<PathBuf>) -> Self {
        self.basedir = basedir.into();
        self
    }

    /// Add a project property
    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    /// `groupId:artifactId:packaging:version`
    pub fn id(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.group_id, self.artifact_id, self.packaging, self.version
        )
    }

    /// Final name used for output archives
    pub fn final_name(&self) -> String {
        self.build
            .final_name
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.artifact_id, self.version))
    }

    /// Group id with dots replaced by slashes
    pub fn group_id_path(&self) -> String {
        self.group_id.replace('.', "/")
    }

    /// Resolve a possibly relative path against the base directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.basedir.join(path)
        }
    }

    pub fn build_directory(&self) -> PathBuf {
        self.resolve(&self.build.directory)
    }

    pub fn output_directory(&self) -> PathBuf {
        self.resolve(&self.build.output_directory)
    }

    pub fn test_output_directory(&self) -> PathBuf {
        self.resolve(&self.build.test_output_directory)
    }

    pub fn reporting_directory(&self) -> PathBuf {
        self.resolve(&self.reporting_directory)
    }

    /// Descriptive fields exposed to templates and filtered content
    pub fn fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("groupId", self.group_id.clone());
        fields.insert("artifactId", self.artifact_id.clone());
        fields.insert("version", self.version.clone());
        fields.insert("packaging", self.packaging.clone());
        fields.insert("id", self.id());
        fields.insert("basedir", self.basedir.to_string_lossy().to_string());
        fields.insert(
            "build.directory",
            self.build_directory().to_string_lossy().to_string(),
        );
        fields.insert(
            "build.outputDirectory",
            self.output_directory().to_string_lossy().to_string(),
        );
        fields.insert(
            "build.testOutputDirectory",
            self.test_output_directory().to_string_lossy().to_string(),
        );
        fields.insert("build.finalName", self.final_name());
        fields.insert(
            "reporting.outputDirectory",
            self.reporting_directory().to_string_lossy().to_string(),
        );
        if let Some(name) = &self.name {
            fields.insert("name", name.clone());
        }
        if let Some(description) = &self.description {
            fields.insert("description", description.clone());
        }
        if let Some(url) = &self.url {
            fields.insert("url", url.clone());
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_name_defaults_to_coordinates() {
        let project = Project::new("org.example", "app", "1.0");
        assert_eq!(project.final_name(), "app-1.0");

        let mut named = project.clone();
        named.build.final_name = Some("custom".to_string());
        assert_eq!(named.final_name(), "custom");
    }

    #[test]
    fn test_fields_resolve_build_paths() {
        let project = Project::new("org.example", "app", "1.0").with_basedir("/work/app");
        let fields = project.fields();

        assert_eq!(fields["groupId"], "org.example");
        assert_eq!(fields["id"], "org.example:app:jar:1.0");
        assert_eq!(fields["build.directory"], "/work/app/target");
        assert_eq!(fields["build.outputDirectory"], "/work/app/target/classes");
        assert!(!fields.contains_key("name"));
    }

    #[test]
    fn test_group_id_path() {
        let project = Project::new("org.example.tools", "app", "1.0");
        assert_eq!(project.group_id_path(), "org/example/tools");
    }
}
