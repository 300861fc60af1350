// src/config.rs

//! Assembler configuration and build requests
//!
//! A build request bundles everything the host would normally hand over:
//! the configuration, the project model, the resolved artifacts, reactor
//! projects for module references, and the descriptors to process. The
//! CLI reads requests from TOML; library callers build the values directly.

use crate::archiver::{ArchiverSettings, LongFileMode, ManifestSettings};
use crate::error::{Error, Result};
use crate::model::{Artifact, Assembly, Project};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Assembler configuration (`[config]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AssemblerConfig {
    /// Overrides the project's final name
    pub final_name: Option<String>,
    /// Where archives are written
    pub output_directory: PathBuf,
    /// Scratch space for unpacked dependencies
    pub work_directory: PathBuf,
    /// Scratch space for transformed files
    pub temp_root: PathBuf,
    /// Append `-<assembly id>` to archive names
    pub append_assembly_id: bool,
    /// Classifier used when the assembly id is not appended
    pub classifier: Option<String>,
    pub tar_long_file_mode: LongFileMode,
    /// Root that file set directories are resolved under
    pub archive_base_directory: Option<PathBuf>,
    /// Property files for content filtering, in precedence order
    pub filters: Vec<PathBuf>,
    /// Add the generated site to every assembly
    pub include_site: bool,
    pub site_directory: PathBuf,
    pub execution_properties: BTreeMap<String, String>,
    pub command_line_properties: BTreeMap<String, String>,
    /// Manifest settings for jar-style archives
    pub archive: ManifestSettings,
    /// Environment snapshot used for `${env.*}`-style lookups
    #[serde(skip)]
    pub environment: BTreeMap<String, String>,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            final_name: None,
            output_directory: PathBuf::from("target"),
            work_directory: PathBuf::from("target/assembly/work"),
            temp_root: PathBuf::from("target/archive-tmp"),
            append_assembly_id: true,
            classifier: None,
            tar_long_file_mode: LongFileMode::default(),
            archive_base_directory: None,
            filters: Vec::new(),
            include_site: false,
            site_directory: PathBuf::from("target/site"),
            execution_properties: BTreeMap::new(),
            command_line_properties: BTreeMap::new(),
            archive: ManifestSettings::default(),
            environment: BTreeMap::new(),
        }
    }
}

impl AssemblerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the process environment
    pub fn capture_environment(mut self) -> Self {
        self.environment = std::env::vars().collect();
        self
    }

    pub fn with_output_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_directory = path.into();
        self
    }

    pub fn with_work_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.work_directory = path.into();
        self
    }

    pub fn with_temp_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_root = path.into();
        self
    }

    pub fn with_final_name(mut self, name: &str) -> Self {
        self.final_name = Some(name.to_string());
        self
    }

    pub fn with_append_assembly_id(mut self, append: bool) -> Self {
        self.append_assembly_id = append;
        self
    }

    pub fn with_classifier(mut self, classifier: &str) -> Self {
        self.classifier = Some(classifier.to_string());
        self
    }

    pub fn with_filter(mut self, path: impl Into<PathBuf>) -> Self {
        self.filters.push(path.into());
        self
    }

    /// Final name for archives of `project`
    pub fn final_name_for(&self, project: &Project) -> String {
        self.final_name
            .clone()
            .unwrap_or_else(|| project.final_name())
    }

    /// Archiver settings derived from this configuration
    pub fn archiver_settings(&self, project: &Project) -> ArchiverSettings {
        let mut manifest = self.archive.clone();
        manifest.manifest_file = manifest.manifest_file.map(|p| project.resolve(&p));
        ArchiverSettings {
            long_file_mode: self.tar_long_file_mode,
            manifest,
            ..ArchiverSettings::default()
        }
    }
}

/// Everything needed for one assembler run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BuildRequest {
    pub config: AssemblerConfig,
    pub project: Project,
    /// Resolved dependencies of the project
    pub artifacts: Vec<Artifact>,
    /// Reactor projects available to module references
    pub reactor: Vec<Project>,
    /// Descriptor files, relative to the project base directory
    pub descriptors: Vec<PathBuf>,
    /// Built-in descriptor names (`bin`, `src`, ...)
    pub descriptor_refs: Vec<String>,
    /// Inline assemblies
    pub assemblies: Vec<Assembly>,
}

impl BuildRequest {
    /// Load a request from a TOML file
    ///
    /// A relative project base directory is taken relative to the request
    /// file, and relative artifact files relative to the project base.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| Error::io("read request", path, e))?;
        let mut request: BuildRequest =
            toml::from_str(&content).map_err(|source| Error::DescriptorParse {
                path: path.to_path_buf(),
                source,
            })?;

        let request_dir = path.parent().unwrap_or(Path::new("."));
        if request.project.basedir.is_relative() {
            request.project.basedir = request_dir.join(&request.project.basedir);
        }
        for module in &mut request.reactor {
            if module.basedir.is_relative() {
                module.basedir = request.project.basedir.join(&module.basedir);
            }
        }
        let basedir = request.project.basedir.clone();
        for artifact in &mut request.artifacts {
            if let Some(file) = &artifact.file
                && file.is_relative()
            {
                artifact.file = Some(basedir.join(file));
            }
        }

        request.config.environment = std::env::vars().collect();
        Ok(request)
    }
}
