// src/descriptor.rs

//! Assembly descriptor loading
//!
//! Assemblies come from three places, in this order: inline in the build
//! request, TOML descriptor files, and built-in descriptor references. Each
//! assembly has its component descriptors expanded and, when requested, the
//! project site appended before the set is checked for duplicate ids.

use crate::config::{AssemblerConfig, BuildRequest};
use crate::error::{Error, Result};
use crate::model::{Assembly, ComponentDescriptor, DependencySet, FileSet, Project};
use crate::selection::ScopeFilter;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Names accepted as descriptor references
pub const BUILTIN_DESCRIPTORS: &[&str] = &["bin", "jar-with-dependencies", "src", "project"];

/// Archive path the site is placed under
pub const SITE_OUTPUT_DIRECTORY: &str = "/site";

const STANDARD_FORMATS: &[&str] = &["tar.gz", "tar.bz2", "zip"];

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| Error::io("read descriptor", path, e))?;
    toml::from_str(&content).map_err(|source| Error::DescriptorParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read an assembly descriptor file
pub fn read_descriptor(path: &Path) -> Result<Assembly> {
    read_toml(path)
}

/// Read a component descriptor file
pub fn read_component(path: &Path) -> Result<ComponentDescriptor> {
    if !path.is_file() {
        return Err(Error::Config(format!(
            "component descriptor not found: {}",
            path.display()
        )));
    }
    read_toml(path)
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn patterns(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Build one of the [`BUILTIN_DESCRIPTORS`] for a project
pub fn builtin(name: &str, project: &Project) -> Result<Assembly> {
    let build_dir = path_string(&project.build.directory);

    let assembly = match name {
        "bin" => {
            let mut assembly = Assembly::new("bin", STANDARD_FORMATS);
            assembly.file_sets = vec![
                FileSet {
                    output_directory: Some(String::new()),
                    includes: patterns(&["README*", "LICENSE*", "NOTICE*"]),
                    ..FileSet::default()
                },
                FileSet {
                    includes: patterns(&["*.jar"]),
                    ..FileSet::new(&build_dir, "")
                },
                FileSet::new(&format!("{}/site", build_dir), "docs"),
            ];
            assembly
        }
        "jar-with-dependencies" => {
            let mut assembly =
                Assembly::new("jar-with-dependencies", &["jar"]).with_base_directory(false);
            assembly.dependency_sets = vec![DependencySet {
                unpack: true,
                scope: ScopeFilter::Runtime,
                ..DependencySet::new("/")
            }];
            assembly.file_sets = vec![FileSet::new(
                &path_string(&project.build.output_directory),
                "/",
            )];
            assembly
        }
        "src" => {
            let mut assembly = Assembly::new("src", STANDARD_FORMATS);
            assembly.file_sets = vec![
                FileSet {
                    output_directory: Some(String::new()),
                    includes: patterns(&["README*", "LICENSE*", "NOTICE*", "pom.xml"]),
                    ..FileSet::default()
                },
                FileSet::new("src", "src"),
            ];
            assembly
        }
        "project" => {
            let mut assembly = Assembly::new("project", STANDARD_FORMATS);
            assembly.file_sets = vec![FileSet {
                output_directory: Some(String::new()),
                excludes: vec!["**/*.log".to_string(), format!("{}/**", build_dir)],
                ..FileSet::default()
            }];
            assembly
        }
        other => return Err(Error::UnknownDescriptorRef(other.to_string())),
    };
    Ok(assembly)
}

/// Merge the assembly's component descriptors into it
///
/// Descriptor paths are relative to the project base directory.
pub fn expand_components(assembly: Assembly, basedir: &Path) -> Result<Assembly> {
    let mut components = Vec::with_capacity(assembly.component_descriptors.len());
    for reference in &assembly.component_descriptors {
        let path = basedir.join(reference);
        debug!("Reading component descriptor {}", path.display());
        components.push(read_component(&path)?);
    }
    Ok(assembly.expand_components(components))
}

/// Append the project site when the assembly or configuration asks for it
pub fn include_site(
    mut assembly: Assembly,
    config: &AssemblerConfig,
    project: &Project,
) -> Result<Assembly> {
    if !(config.include_site || assembly.include_site_directory) {
        return Ok(assembly);
    }

    let site = project.resolve(&config.site_directory);
    if !site.is_dir() {
        return Err(Error::Config(format!(
            "site directory does not exist: {}",
            site.display()
        )));
    }
    assembly
        .file_sets
        .push(FileSet::new(&path_string(&site), SITE_OUTPUT_DIRECTORY));
    Ok(assembly)
}

/// Collect every assembly named by a build request
pub fn read_assemblies(request: &BuildRequest) -> Result<Vec<Assembly>> {
    let project = &request.project;
    let mut assemblies = request.assemblies.clone();

    for descriptor in &request.descriptors {
        let path = project.resolve(descriptor);
        debug!("Reading assembly descriptor {}", path.display());
        assemblies.push(read_descriptor(&path)?);
    }
    for reference in &request.descriptor_refs {
        assemblies.push(builtin(reference, project)?);
    }

    if assemblies.is_empty() {
        return Err(Error::NoDescriptors);
    }

    let mut ids = HashSet::new();
    let mut expanded = Vec::with_capacity(assemblies.len());
    for assembly in assemblies {
        if !ids.insert(assembly.id.clone()) {
            return Err(Error::DuplicateAssemblyId(assembly.id));
        }
        let assembly = expand_components(assembly, &project.basedir)?;
        expanded.push(include_site(assembly, &request.config, project)?);
    }
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn request(basedir: &Path) -> BuildRequest {
        BuildRequest {
            project: Project::new("org.example", "app", "1.0").with_basedir(basedir),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_descriptors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_assemblies(&request(dir.path())),
            Err(Error::NoDescriptors)
        ));
    }

    #[test]
    fn test_builtin_refs() {
        let dir = TempDir::new().unwrap();
        let mut req = request(dir.path());
        req.descriptor_refs = vec!["bin".to_string(), "jar-with-dependencies".to_string()];

        let assemblies = read_assemblies(&req).unwrap();
        assert_eq!(assemblies[0].id, "bin");
        assert_eq!(assemblies[0].formats, vec!["tar.gz", "tar.bz2", "zip"]);
        assert!(!assemblies[1].include_base_directory);
        assert!(assemblies[1].dependency_sets[0].unpack);
    }

    #[test]
    fn test_unknown_ref() {
        let dir = TempDir::new().unwrap();
        let mut req = request(dir.path());
        req.descriptor_refs = vec!["fat".to_string()];
        let err = read_assemblies(&req).unwrap_err();
        assert!(matches!(err, Error::UnknownDescriptorRef(ref name) if name == "fat"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_duplicate_ids() {
        let dir = TempDir::new().unwrap();
        let mut req = request(dir.path());
        req.assemblies = vec![Assembly::new("dist", &["zip"]), Assembly::new("dist", &["tar"])];
        assert!(matches!(
            read_assemblies(&req),
            Err(Error::DuplicateAssemblyId(ref id)) if id == "dist"
        ));
    }

    #[test]
    fn test_descriptor_file_and_components() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("dist.toml"),
            r#"
            id = "dist"
            formats = ["zip"]
            component-descriptors = ["shared.toml"]

            [[file-sets]]
            directory = "conf"
            "#,
        )
        .unwrap();
        fs::write(
            dir.path().join("shared.toml"),
            r#"
            [[files]]
            source = "LICENSE"
            "#,
        )
        .unwrap();

        let mut req = request(dir.path());
        req.descriptors = vec!["dist.toml".into()];
        let assemblies = read_assemblies(&req).unwrap();

        assert_eq!(assemblies.len(), 1);
        assert_eq!(assemblies[0].files[0].source, "LICENSE");
        assert!(assemblies[0].component_descriptors.is_empty());
    }

    #[test]
    fn test_missing_component_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let mut assembly = Assembly::new("dist", &["zip"]);
        assembly.component_descriptors = vec!["absent.toml".to_string()];
        let err = expand_components(assembly, dir.path()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_site_inclusion() {
        let dir = TempDir::new().unwrap();
        let project = Project::new("org.example", "app", "1.0").with_basedir(dir.path());
        let config = AssemblerConfig {
            include_site: true,
            ..Default::default()
        };

        let missing = include_site(Assembly::new("dist", &["zip"]), &config, &project);
        assert!(matches!(missing, Err(Error::Config(_))));

        fs::create_dir_all(dir.path().join("target/site")).unwrap();
        let assembly = include_site(Assembly::new("dist", &["zip"]), &config, &project).unwrap();
        let site = assembly.file_sets.last().unwrap();
        assert_eq!(site.output_directory.as_deref(), Some(SITE_OUTPUT_DIRECTORY));
    }
}
