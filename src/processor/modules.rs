// src/processor/modules.rs

//! Module references resolved against reactor projects

use crate::model::{FileSet, Project};
use std::path::{Path, PathBuf};
use tracing::debug;

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// `path` relative to `basedir` when it lies below it
fn relative_to(path: &Path, basedir: &Path) -> String {
    let relative = if path.is_absolute() {
        path.strip_prefix(basedir).unwrap_or(path)
    } else {
        path
    };
    relative.to_string_lossy().replace('\\', "/")
}

/// File sets for the named modules, paired with their projects
///
/// Each module `m` matches the reactor project whose base directory is
/// `project.basedir/m`. Its file set covers the module base directory,
/// lands under `m`, and leaves out build output and reports. Unknown
/// modules are skipped.
pub fn module_file_sets<'a>(
    project: &Project,
    reactor: &'a [Project],
    modules: &[String],
) -> Vec<(&'a Project, FileSet)> {
    let mut sets = Vec::with_capacity(modules.len());

    for module in modules {
        let expected = normalize(&project.basedir.join(module));
        let Some(found) = reactor.iter().find(|p| normalize(&p.basedir) == expected) else {
            debug!("Module {} is not part of the reactor, skipping", module);
            continue;
        };

        let excludes = [
            &found.build.directory,
            &found.build.output_directory,
            &found.build.test_output_directory,
            &found.reporting_directory,
        ]
        .into_iter()
        .map(|dir| format!("{}/**", relative_to(dir, &found.basedir)))
        .collect();

        sets.push((
            found,
            FileSet {
                directory: Some(found.basedir.to_string_lossy().to_string()),
                output_directory: Some(module.clone()),
                excludes,
                ..FileSet::default()
            },
        ));
    }
    sets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_module_file_sets() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("core")).unwrap();
        let main = Project::new("org.example", "parent", "1.0").with_basedir(dir.path());
        let reactor = vec![
            Project::new("org.example", "core", "1.0").with_basedir(dir.path().join("core")),
        ];

        let sets = module_file_sets(
            &main,
            &reactor,
            &["core".to_string(), "missing".to_string()],
        );
        assert_eq!(sets.len(), 1);

        let (module, set) = &sets[0];
        assert_eq!(module.artifact_id, "core");
        assert_eq!(set.output_directory.as_deref(), Some("core"));
        assert_eq!(
            set.excludes,
            vec![
                "target/**",
                "target/classes/**",
                "target/test-classes/**",
                "target/site/**"
            ]
        );
    }

    #[test]
    fn test_relative_to() {
        let base = Path::new("/work/core");
        assert_eq!(relative_to(Path::new("/work/core/out"), base), "out");
        assert_eq!(relative_to(Path::new("target"), base), "target");
    }
}
