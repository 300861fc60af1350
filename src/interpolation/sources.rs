// src/interpolation/sources.rs

//! Value source layers
//!
//! Each function returns an [`Interpolator`] holding one or more lookups for
//! a single conceptual layer (an artifact, a project, a property table).
//! Layers are chained by [`TemplateContext`](super::TemplateContext) in the
//! canonical precedence order.

use super::Interpolator;
use crate::model::{Artifact, FieldMap, Project};
use std::collections::BTreeMap;

/// Look a key up in a field map after stripping one of the prefixes
fn prefixed(fields: &FieldMap, prefixes: &[&str], allow_unprefixed: bool, key: &str) -> Option<String> {
    for prefix in prefixes {
        if let Some(rest) = key.strip_prefix(prefix)
            && let Some(value) = fields.get(rest)
        {
            return Some(value.clone());
        }
    }
    if allow_unprefixed {
        return fields.get(key).cloned();
    }
    None
}

/// Look a key up in a property table after stripping a prefix
fn prefixed_property(
    properties: &BTreeMap<String, String>,
    prefix: &str,
    key: &str,
) -> Option<String> {
    key.strip_prefix(prefix)
        .and_then(|rest| properties.get(rest).cloned())
}

/// Unprefixed property table
pub fn properties<'a>(name: &'static str, table: &'a BTreeMap<String, String>) -> Interpolator<'a> {
    Interpolator::new().with_source(name, move |key| table.get(key).cloned())
}

/// Environment variables, exposed under `env.`
pub fn environment(env: &BTreeMap<String, String>) -> Interpolator<'_> {
    Interpolator::new().with_source("environment", move |key| prefixed_property(env, "env.", key))
}

/// `finalName` and `build.finalName` aliases
pub fn final_name<'a>(final_name: Option<&'a str>) -> Interpolator<'a> {
    match final_name {
        Some(name) => Interpolator::new().with_source("final-name", move |key| match key {
            "finalName" | "build.finalName" => Some(name.to_string()),
            _ => None,
        }),
        None => Interpolator::new(),
    }
}

/// Main project fields under `project.`, `pom.`, or no prefix
pub fn main_project(project: &Project) -> Interpolator<'static> {
    let fields = project.fields();
    Interpolator::new().with_source("main-project", move |key| {
        prefixed(&fields, &["project.", "pom."], true, key)
    })
}

/// Main project properties under `project.properties.`, `pom.properties.`, or no prefix
pub fn main_project_properties(project: &Project) -> Interpolator<'_> {
    Interpolator::new().with_source("main-project-properties", move |key| {
        prefixed_property(&project.properties, "project.properties.", key)
            .or_else(|| prefixed_property(&project.properties, "pom.properties.", key))
            .or_else(|| project.properties.get(key).cloned())
    })
}

/// Fields of the project that owns a module being assembled
pub fn module_project(project: Option<&Project>) -> Interpolator<'_> {
    let Some(project) = project else {
        return Interpolator::new();
    };
    let fields = project.fields();
    let artifact_fields = project.artifact.as_ref().map(Artifact::fields);

    Interpolator::new()
        .with_source("module-project", move |key| prefixed(&fields, &["module."], false, key))
        .with_source("module-project-properties", move |key| {
            prefixed_property(&project.properties, "module.properties.", key)
        })
        .with_source("module-project-artifact", move |key| {
            artifact_fields
                .as_ref()
                .and_then(|f| prefixed(f, &["module."], false, key))
        })
}

/// Fields of a module's main artifact and its type handler
pub fn module_artifact(artifact: Option<&Artifact>) -> Interpolator<'static> {
    let Some(artifact) = artifact else {
        return Interpolator::new();
    };
    let group_id_path = artifact.group_id_path();
    let fields = artifact.fields();
    let handler = artifact.handler().fields();
    let handler_prefixed = handler.clone();

    Interpolator::new()
        .with_source("module-group-path", move |key| {
            (key == "module.groupIdPath").then(|| group_id_path.clone())
        })
        .with_source("module-artifact", move |key| prefixed(&fields, &["module."], false, key))
        .with_source("module-handler", move |key| prefixed(&handler, &["module."], false, key))
        .with_source("module-handler-prefixed", move |key| {
            prefixed(&handler_prefixed, &["module.handler."], false, key)
        })
}

/// Fields of the artifact being copied and its type handler
pub fn artifact(artifact: &Artifact) -> Interpolator<'static> {
    let group_id_path = artifact.group_id_path();
    let fields = artifact.fields();
    let handler = artifact.handler().fields();
    let handler_prefixed = handler.clone();

    Interpolator::new()
        .with_source("artifact-group-path", move |key| {
            (key == "artifact.groupIdPath").then(|| group_id_path.clone())
        })
        .with_source("artifact", move |key| prefixed(&fields, &["artifact."], false, key))
        .with_source("artifact-handler", move |key| prefixed(&handler, &["artifact."], false, key))
        .with_source("artifact-handler-prefixed", move |key| {
            prefixed(&handler_prefixed, &["artifact.handler."], false, key)
        })
}

/// Fields of the project model that produced an artifact
pub fn artifact_project(project: Option<&Project>) -> Interpolator<'_> {
    let Some(project) = project else {
        return Interpolator::new();
    };
    let group_id_path = project.group_id_path();
    let fields = project.fields();
    let artifact_fields = project.artifact.as_ref().map(Artifact::fields);

    Interpolator::new()
        .with_source("artifact-project-group-path", move |key| {
            (key == "artifact.groupIdPath").then(|| group_id_path.clone())
        })
        .with_source("artifact-project", move |key| prefixed(&fields, &["artifact."], false, key))
        .with_source("artifact-project-properties", move |key| {
            prefixed_property(&project.properties, "artifact.properties.", key)
        })
        .with_source("artifact-project-artifact", move |key| {
            artifact_fields
                .as_ref()
                .and_then(|f| prefixed(f, &["artifact."], false, key))
        })
}

/// `dashClassifier` and `dashClassifier?` convenience variables
pub fn classifier_rules(artifact: &Artifact) -> Interpolator<'static> {
    let dash = artifact
        .effective_classifier()
        .map(|c| format!("-{}", c))
        .unwrap_or_default();

    Interpolator::new().with_source("classifier-rules", move |key| match key {
        "dashClassifier" | "dashClassifier?" => Some(dash.clone()),
        _ => None,
    })
}

/// Reserved `extension` token, resolved from the artifact type handler
pub fn extension_fallback(artifact: &Artifact) -> Interpolator<'static> {
    let extension = artifact.extension();
    Interpolator::new().with_source("extension", move |key| {
        (key.trim() == "extension").then(|| extension.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_project_prefixes() {
        let project = Project::new("org.example", "app", "1.0");
        let interp = main_project(&project);

        assert_eq!(interp.interpolate("${project.version}"), "1.0");
        assert_eq!(interp.interpolate("${pom.artifactId}"), "app");
        assert_eq!(interp.interpolate("${groupId}"), "org.example");
        assert_eq!(interp.interpolate("${project.nope}"), "${project.nope}");
    }

    #[test]
    fn test_artifact_layer() {
        let dep = Artifact::new("org.example.lib", "core", "2.1").with_type("test-jar");
        let interp = artifact(&dep);

        assert_eq!(interp.interpolate("${artifact.artifactId}"), "core");
        assert_eq!(interp.interpolate("${artifact.extension}"), "jar");
        assert_eq!(interp.interpolate("${artifact.handler.extension}"), "jar");
        assert_eq!(interp.interpolate("${artifact.groupIdPath}"), "org/example/lib");
        assert_eq!(interp.interpolate("${artifactId}"), "${artifactId}");
    }

    #[test]
    fn test_classifier_rules() {
        let plain = Artifact::new("g", "a", "1");
        assert_eq!(classifier_rules(&plain).interpolate("x${dashClassifier?}"), "x");

        let classified = Artifact::new("g", "a", "1").with_classifier("win");
        assert_eq!(
            classifier_rules(&classified).interpolate("x${dashClassifier}"),
            "x-win"
        );
    }

    #[test]
    fn test_module_layers_absent() {
        assert!(module_project(None).source_names().is_empty());
        assert!(module_artifact(None).source_names().is_empty());
        assert!(artifact_project(None).source_names().is_empty());
        assert!(final_name(None).source_names().is_empty());
    }

    #[test]
    fn test_artifact_project_properties() {
        let project = Project::new("g", "dep", "3").with_property("license", "ASL");
        let interp = artifact_project(Some(&project));

        assert_eq!(interp.interpolate("${artifact.properties.license}"), "ASL");
        assert_eq!(interp.interpolate("${artifact.version}"), "3");
    }

    #[test]
    fn test_environment_prefix() {
        let mut env = BTreeMap::new();
        env.insert("HOME".to_string(), "/home/builder".to_string());
        let interp = environment(&env);

        assert_eq!(interp.interpolate("${env.HOME}"), "/home/builder");
        assert_eq!(interp.interpolate("${HOME}"), "${HOME}");
    }
}
