// src/interpolation/context.rs

//! Canonical interpolation stacks
//!
//! Output-archive names and paths are computed from one of two layer
//! orders:
//!
//! - file name mappings: module artifact, module project, artifact,
//!   artifact project, main project, classifier rules, execution
//!   properties, command-line properties, main-project properties,
//!   environment, then the reserved `extension` fallback
//! - output directories: final name aliases, module project, artifact
//!   project, execution properties, main project and its properties,
//!   command-line properties, environment

use super::{Interpolator, sources, validate_template};
use crate::error::Result;
use crate::model::{Artifact, Project};
use crate::paths;
use std::collections::BTreeMap;

static EMPTY: BTreeMap<String, String> = BTreeMap::new();

/// Values shared by every template evaluated during one assembly run
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    final_name: &'a str,
    project: &'a Project,
    execution_properties: &'a BTreeMap<String, String>,
    command_line_properties: &'a BTreeMap<String, String>,
    environment: &'a BTreeMap<String, String>,
}

impl<'a> TemplateContext<'a> {
    /// Create a context with empty property tables
    pub fn new(final_name: &'a str, project: &'a Project) -> Self {
        Self {
            final_name,
            project,
            execution_properties: &EMPTY,
            command_line_properties: &EMPTY,
            environment: &EMPTY,
        }
    }

    pub fn with_execution_properties(mut self, properties: &'a BTreeMap<String, String>) -> Self {
        self.execution_properties = properties;
        self
    }

    pub fn with_command_line_properties(
        mut self,
        properties: &'a BTreeMap<String, String>,
    ) -> Self {
        self.command_line_properties = properties;
        self
    }

    pub fn with_environment(mut self, environment: &'a BTreeMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    pub fn final_name(&self) -> &'a str {
        self.final_name
    }

    pub fn project(&self) -> &'a Project {
        self.project
    }

    /// Layer stack for dependency file name mappings
    pub fn file_name_interpolator(
        &self,
        artifact: &'a Artifact,
        module: Option<&'a Project>,
    ) -> Interpolator<'a> {
        let module_artifact = module.and_then(|m| m.artifact.as_ref());

        sources::module_artifact(module_artifact)
            .chain(sources::module_project(module))
            .chain(sources::artifact(artifact))
            .chain(sources::artifact_project(artifact.project.as_deref()))
            .chain(sources::main_project(self.project))
            .chain(sources::classifier_rules(artifact))
            .chain(sources::properties("execution", self.execution_properties))
            .chain(sources::properties("command-line", self.command_line_properties))
            .chain(sources::main_project_properties(self.project))
            .chain(sources::environment(self.environment))
            .chain(sources::extension_fallback(artifact))
    }

    /// Layer stack for output directory templates
    pub fn output_interpolator(
        &self,
        module: Option<&'a Project>,
        artifact_project: Option<&'a Project>,
    ) -> Interpolator<'a> {
        sources::final_name(Some(self.final_name))
            .chain(sources::module_project(module))
            .chain(sources::artifact_project(artifact_project))
            .chain(sources::properties("execution", self.execution_properties))
            .chain(sources::main_project(self.project))
            .chain(sources::main_project_properties(self.project))
            .chain(sources::properties("command-line", self.command_line_properties))
            .chain(sources::environment(self.environment))
    }

    /// Evaluate a file name mapping for an artifact
    pub fn evaluate_file_name(
        &self,
        template: &str,
        artifact: &'a Artifact,
        module: Option<&'a Project>,
    ) -> Result<String> {
        validate_template(template)?;
        let value = self
            .file_name_interpolator(artifact, module)
            .interpolate(template);
        Ok(paths::fix_relative_refs(&paths::collapse_separators(&value)))
    }

    /// Evaluate an output directory template into an archive path prefix
    ///
    /// A missing template is treated as empty. The result is either empty or
    /// ends with exactly one separator.
    pub fn output_directory(
        &self,
        template: Option<&str>,
        include_base_directory: bool,
        module: Option<&'a Project>,
        artifact_project: Option<&'a Project>,
    ) -> Result<String> {
        let template = template.unwrap_or_default();
        validate_template(template)?;
        let value = self
            .output_interpolator(module, artifact_project)
            .interpolate(template);
        paths::platform_warnings(&value);
        Ok(paths::resolve_output_directory(
            &value,
            self.final_name,
            include_base_directory,
        ))
    }
}
