// src/transform/filtering.rs

//! `${token}` substitution in file content
//!
//! Tokens are resolved in two passes. The first pass uses a merged property
//! table: host properties, overridden by project properties, overridden by
//! each filter file in declaration order. The second pass exposes the
//! project's descriptive fields under `project.` and `pom.`; when the
//! filtered file is a `.properties` file, backslashes in those values are
//! escaped. Unknown tokens are left as they are.

use super::{properties, split_text_lines};
use crate::error::{Error, Result};
use crate::interpolation::Interpolator;
use crate::model::{FieldMap, Project};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[cfg(windows)]
const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
const LINE_SEPARATOR: &str = "\n";

/// Token substitution rules for one assembly run
#[derive(Debug, Clone)]
pub struct ContentFilter {
    properties: BTreeMap<String, String>,
    project_fields: FieldMap,
}

impl ContentFilter {
    /// Build the merged property table
    ///
    /// A filter file that does not exist or cannot be parsed is an error
    /// naming that file.
    pub fn new(
        project: &Project,
        host_properties: &BTreeMap<String, String>,
        filter_files: &[PathBuf],
    ) -> Result<Self> {
        info!("Initializing assembly filters...");

        let mut merged = host_properties.clone();
        merged.extend(
            project
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        for file in filter_files {
            let path = project.resolve(file);
            debug!("Loading filter properties from {}", path.display());
            merged.extend(properties::load(&path)?);
        }

        Ok(Self {
            properties: merged,
            project_fields: project.fields(),
        })
    }

    /// The merged property table
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Substitute tokens in `text`
    pub fn filter_text(&self, text: &str, escape_backslashes: bool) -> String {
        let first = Interpolator::new()
            .with_source("filter-properties", |key| self.properties.get(key).cloned());
        let second = Interpolator::new().with_source("project-fields", |key| {
            let field = key
                .strip_prefix("project.")
                .or_else(|| key.strip_prefix("pom."))?;
            let value = self.project_fields.get(field)?;
            Some(if escape_backslashes {
                value.replace('\\', "\\\\")
            } else {
                value.clone()
            })
        });

        second.interpolate(&first.interpolate(text))
    }

    /// Filter `source` into `dest`
    ///
    /// Lines of the output end with the platform line separator. The
    /// source file is never modified.
    pub fn filter_file(&self, source: &Path, dest: &Path) -> Result<()> {
        if !source.is_file() {
            return Err(Error::MissingSource(source.to_path_buf()));
        }
        let text = fs::read_to_string(source).map_err(|e| Error::io("read", source, e))?;
        let escape = source
            .file_name()
            .is_some_and(|name| name.to_string_lossy().ends_with(".properties"));

        let filtered = self.filter_text(&text, escape);
        let mut out = String::with_capacity(filtered.len());
        for line in split_text_lines(&filtered) {
            out.push_str(line);
            out.push_str(LINE_SEPARATOR);
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io("create directory", parent, e))?;
        }
        fs::write(dest, out).map_err(|e| Error::io("write", dest, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_property_precedence() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.properties");
        let second = dir.path().join("second.properties");
        fs::write(&first, "env=first\nonly.first=yes\n").unwrap();
        fs::write(&second, "env=second\n").unwrap();

        let project = Project::new("g", "app", "1.0")
            .with_property("env", "project")
            .with_property("owner", "project");
        let host = map(&[("env", "host"), ("owner", "host"), ("host.only", "h")]);

        let filter = ContentFilter::new(&project, &host, &[first, second]).unwrap();
        let out = filter.filter_text("${env} ${owner} ${host.only} ${only.first} ${nope}", false);
        assert_eq!(out, "second project h yes ${nope}");
    }

    #[test]
    fn test_project_fields_second_pass() {
        let project = Project::new("org.example", "app", "2.5").with_basedir("C:\\work");
        let filter = ContentFilter::new(&project, &BTreeMap::new(), &[]).unwrap();

        assert_eq!(
            filter.filter_text("${project.artifactId}-${pom.version}", false),
            "app-2.5"
        );
        assert_eq!(filter.filter_text("${project.basedir}", true), "C:\\\\work");
        assert_eq!(filter.filter_text("${project.basedir}", false), "C:\\work");
        assert_eq!(filter.filter_text("${artifactId}", false), "${artifactId}");
    }

    #[test]
    fn test_property_value_may_reference_project_field() {
        let project = Project::new("g", "app", "3.0").with_property("banner", "v${project.version}");
        let filter = ContentFilter::new(&project, &BTreeMap::new(), &[]).unwrap();

        assert_eq!(filter.filter_text("${banner}", false), "v3.0");
    }

    #[test]
    fn test_missing_filter_file() {
        let dir = TempDir::new().unwrap();
        let project = Project::new("g", "app", "1");
        let err = ContentFilter::new(&project, &BTreeMap::new(), &[dir.path().join("absent.properties")])
            .unwrap_err();
        assert!(matches!(err, Error::MissingSource(p) if p.ends_with("absent.properties")));
    }

    #[test]
    fn test_filter_file_leaves_source_untouched() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("app.conf");
        let dest = dir.path().join("out/app.conf");
        fs::write(&source, "name=${project.artifactId}\nversion=${project.version}").unwrap();

        let project = Project::new("g", "app", "1.0");
        let filter = ContentFilter::new(&project, &BTreeMap::new(), &[]).unwrap();
        filter.filter_file(&source, &dest).unwrap();
        filter.filter_file(&source, &dest).unwrap();

        let expected = format!("name=app{sep}version=1.0{sep}", sep = LINE_SEPARATOR);
        assert_eq!(fs::read_to_string(&dest).unwrap(), expected);
        assert_eq!(
            fs::read_to_string(&source).unwrap(),
            "name=${project.artifactId}\nversion=${project.version}"
        );
    }
}
