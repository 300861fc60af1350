// src/model/assembly.rs

//! Assembly descriptors and the rule sets they contain
//!
//! Values here are immutable once built: component expansion consumes an
//! assembly and returns a new one rather than mutating in place.

use crate::selection::ScopeFilter;
use serde::{Deserialize, Serialize};

/// Default file name mapping for dependency sets
pub const DEFAULT_FILE_NAME_MAPPING: &str =
    "${artifact.artifactId}-${artifact.version}${dashClassifier?}.${artifact.extension}";

/// Default directory mode
pub const DEFAULT_DIRECTORY_MODE: &str = "0755";

/// Default file mode
pub const DEFAULT_FILE_MODE: &str = "0644";

fn default_true() -> bool {
    true
}

fn default_directory_mode() -> String {
    DEFAULT_DIRECTORY_MODE.to_string()
}

fn default_file_mode() -> String {
    DEFAULT_FILE_MODE.to_string()
}

fn default_file_name_mapping() -> String {
    DEFAULT_FILE_NAME_MAPPING.to_string()
}

/// Top-level assembly descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Assembly {
    pub id: String,
    #[serde(default)]
    pub formats: Vec<String>,
    #[serde(default = "default_true")]
    pub include_base_directory: bool,
    #[serde(default)]
    pub include_site_directory: bool,
    #[serde(default)]
    pub dependency_sets: Vec<DependencySet>,
    #[serde(default)]
    pub file_sets: Vec<FileSet>,
    #[serde(default)]
    pub files: Vec<FileItem>,
    /// Module references, relative to the main project base directory
    #[serde(default)]
    pub modules: Vec<String>,
    /// Component descriptor paths, relative to the main project base directory
    #[serde(default)]
    pub component_descriptors: Vec<String>,
}

impl Assembly {
    /// Create an empty assembly producing the given formats
    pub fn new(id: &str, formats: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            formats: formats.iter().map(|f| f.to_string()).collect(),
            include_base_directory: true,
            include_site_directory: false,
            dependency_sets: Vec::new(),
            file_sets: Vec::new(),
            files: Vec::new(),
            modules: Vec::new(),
            component_descriptors: Vec::new(),
        }
    }

    pub fn with_base_directory(mut self, include: bool) -> Self {
        self.include_base_directory = include;
        self
    }

    pub fn with_dependency_set(mut self, set: DependencySet) -> Self {
        self.dependency_sets.push(set);
        self
    }

    pub fn with_file_set(mut self, set: FileSet) -> Self {
        self.file_sets.push(set);
        self
    }

    pub fn with_file(mut self, item: FileItem) -> Self {
        self.files.push(item);
        self
    }

    pub fn with_module(mut self, module: &str) -> Self {
        self.modules.push(module.to_string());
        self
    }

    /// Append component fragments in declaration order
    ///
    /// Component entries land after the inline entries of each list and are
    /// indistinguishable from them afterwards.
    pub fn expand_components(mut self, components: impl IntoIterator<Item = ComponentDescriptor>) -> Self {
        for component in components {
            self.dependency_sets.extend(component.dependency_sets);
            self.file_sets.extend(component.file_sets);
            self.files.extend(component.files);
        }
        self.component_descriptors.clear();
        self
    }
}

/// Reusable fragment of rules, merged into any assembly
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ComponentDescriptor {
    pub dependency_sets: Vec<DependencySet>,
    pub file_sets: Vec<FileSet>,
    pub files: Vec<FileItem>,
}

/// Rule selecting a subset of the resolved dependencies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DependencySet {
    #[serde(default)]
    pub output_directory: Option<String>,
    #[serde(default = "default_file_name_mapping")]
    pub output_file_name_mapping: String,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default)]
    pub unpack: bool,
    #[serde(default)]
    pub scope: ScopeFilter,
    #[serde(default = "default_directory_mode")]
    pub directory_mode: String,
    #[serde(default = "default_file_mode")]
    pub file_mode: String,
}

impl Default for DependencySet {
    fn default() -> Self {
        Self {
            output_directory: None,
            output_file_name_mapping: default_file_name_mapping(),
            includes: Vec::new(),
            excludes: Vec::new(),
            unpack: false,
            scope: ScopeFilter::default(),
            directory_mode: default_directory_mode(),
            file_mode: default_file_mode(),
        }
    }
}

impl DependencySet {
    pub fn new(output_directory: &str) -> Self {
        Self {
            output_directory: Some(output_directory.to_string()),
            ..Self::default()
        }
    }
}

/// Rule selecting a directory subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileSet {
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub output_directory: Option<String>,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default)]
    pub line_ending: Option<String>,
    #[serde(default = "default_directory_mode")]
    pub directory_mode: String,
    #[serde(default = "default_file_mode")]
    pub file_mode: String,
}

impl Default for FileSet {
    fn default() -> Self {
        Self {
            directory: None,
            output_directory: None,
            includes: Vec::new(),
            excludes: Vec::new(),
            line_ending: None,
            directory_mode: default_directory_mode(),
            file_mode: default_file_mode(),
        }
    }
}

impl FileSet {
    pub fn new(directory: &str, output_directory: &str) -> Self {
        Self {
            directory: Some(directory.to_string()),
            output_directory: Some(output_directory.to_string()),
            ..Self::default()
        }
    }
}

/// A single explicitly named file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileItem {
    pub source: String,
    #[serde(default)]
    pub output_directory: Option<String>,
    #[serde(default)]
    pub dest_name: Option<String>,
    #[serde(default)]
    pub filtered: bool,
    #[serde(default)]
    pub line_ending: Option<String>,
    #[serde(default = "default_file_mode")]
    pub file_mode: String,
}

impl FileItem {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            output_directory: None,
            dest_name: None,
            filtered: false,
            line_ending: None,
            file_mode: default_file_mode(),
        }
    }

    pub fn with_output_directory(mut self, output: &str) -> Self {
        self.output_directory = Some(output.to_string());
        self
    }

    pub fn with_dest_name(mut self, name: &str) -> Self {
        self.dest_name = Some(name.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_components_appends_in_order() {
        let assembly = Assembly::new("bin", &["zip"])
            .with_file_set(FileSet::new("inline", "inline"));

        let first = ComponentDescriptor {
            file_sets: vec![FileSet::new("first", "first")],
            files: vec![FileItem::new("README")],
            ..Default::default()
        };
        let second = ComponentDescriptor {
            file_sets: vec![FileSet::new("second", "second")],
            dependency_sets: vec![DependencySet::new("lib")],
            ..Default::default()
        };

        let expanded = assembly.expand_components(vec![first, second]);
        let dirs: Vec<_> = expanded
            .file_sets
            .iter()
            .map(|s| s.directory.clone().unwrap())
            .collect();
        assert_eq!(dirs, vec!["inline", "first", "second"]);
        assert_eq!(expanded.files.len(), 1);
        assert_eq!(expanded.dependency_sets.len(), 1);
    }

    #[test]
    fn test_deserialize_defaults() {
        let assembly: Assembly = toml::from_str(
            r#"
            id = "dist"
            formats = ["zip"]

            [[dependency-sets]]
            output-directory = "lib"

            [[file-sets]]
            directory = "src/main/config"
            "#,
        )
        .unwrap();

        assert!(assembly.include_base_directory);
        let deps = &assembly.dependency_sets[0];
        assert_eq!(deps.output_file_name_mapping, DEFAULT_FILE_NAME_MAPPING);
        assert_eq!(deps.scope, ScopeFilter::Runtime);
        assert_eq!(deps.file_mode, "0644");
        assert_eq!(assembly.file_sets[0].directory_mode, "0755");
    }
}
