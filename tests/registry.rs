// tests/registry.rs

//! Component registry merging across unpacked dependencies

mod common;

use assembler::{
    Artifact, Assembly, AssemblyProcessor, AttachedArtifact, BuildRequest, DependencySet,
};
use common::{config, project, write_jar, zip_entries, zip_text};
use std::path::Path;
use tempfile::TempDir;

const COMPONENTS: &str = "META-INF/plexus/components.xml";

fn fragment(implementation: &str, extra_role: &str) -> String {
    format!(
        r#"<component-set>
  <components>
    <component>
      <role>org.example.Handler</role>
      <implementation>{}</implementation>
    </component>
    <component>
      <role>{}</role>
      <implementation>{}Extra</implementation>
    </component>
  </components>
</component-set>
"#,
        implementation, extra_role, implementation
    )
}

fn unpacked(root: &Path, artifact_id: &str, components: Option<&str>) -> Artifact {
    let jar = root.join(format!("repo/{}-1.0.jar", artifact_id));
    let class = format!("org/{}/Main.class", artifact_id);
    let mut entries = vec![(class.as_str(), "bytes")];
    if let Some(xml) = components {
        entries.push((COMPONENTS, xml));
    }
    write_jar(&jar, &entries);
    Artifact::new("org.example", artifact_id, "1.0").with_file(jar)
}

fn unpack_all() -> Assembly {
    let set = DependencySet {
        unpack: true,
        ..DependencySet::new("/")
    };
    Assembly::new("all", &["zip", "jar"])
        .with_base_directory(false)
        .with_dependency_set(set)
}

#[test]
fn test_fragments_merge_once_per_archive() {
    let dir = TempDir::new().unwrap();
    let first = fragment("org.first.Handler", "org.first.Extra");
    let second = fragment("org.second.Handler", "org.second.Extra");
    let artifacts = vec![
        unpacked(dir.path(), "first", Some(&first)),
        unpacked(dir.path(), "second", Some(&second)),
    ];

    let project = project(dir.path());
    let config = config(dir.path());
    let mut attached: Vec<AttachedArtifact> = Vec::new();
    let created = AssemblyProcessor::new(&config, &project)
        .with_artifacts(&artifacts)
        .create_archives(&unpack_all(), &mut attached)
        .unwrap();
    assert_eq!(created.len(), 2);

    for archive in &created {
        let entries = zip_entries(archive);
        assert_eq!(entries.iter().filter(|e| *e == COMPONENTS).count(), 1);
        assert!(entries.contains(&"org/first/Main.class".to_string()));
        assert!(entries.contains(&"org/second/Main.class".to_string()));

        let merged = zip_text(archive, COMPONENTS);
        assert_eq!(merged.matches("<role>org.example.Handler</role>").count(), 1);
        assert!(merged.contains("org.first.Handler"));
        assert!(!merged.contains("org.second.Handler<"));
        assert!(merged.contains("org.first.Extra"));
        assert!(merged.contains("org.second.Extra"));
    }
}

#[test]
fn test_no_fragments_no_registry_entry() {
    let dir = TempDir::new().unwrap();
    let artifacts = vec![unpacked(dir.path(), "plain", None)];

    let project = project(dir.path());
    let config = config(dir.path());
    let mut attached: Vec<AttachedArtifact> = Vec::new();
    AssemblyProcessor::new(&config, &project)
        .with_artifacts(&artifacts)
        .create_archives(&unpack_all(), &mut attached)
        .unwrap();

    for found in &attached {
        let entries = zip_entries(&found.file);
        assert!(!entries.iter().any(|e| e == COMPONENTS));
        assert!(entries.contains(&"org/plain/Main.class".to_string()));
    }
}

#[test]
fn test_registry_does_not_carry_over_between_builds() {
    let dir = TempDir::new().unwrap();
    let first = fragment("org.first.Handler", "org.first.Extra");
    let artifacts = vec![unpacked(dir.path(), "first", Some(&first))];

    // the second assembly copies the jar instead of unpacking it, so it
    // never offers a fragment of its own
    let copied = Assembly::new("copied", &["zip"])
        .with_base_directory(false)
        .with_dependency_set(DependencySet::new("lib"));
    let request = BuildRequest {
        config: config(dir.path()).with_append_assembly_id(true),
        project: project(dir.path()),
        artifacts,
        assemblies: vec![unpack_all(), copied],
        ..Default::default()
    };

    let mut attached: Vec<AttachedArtifact> = Vec::new();
    let created = assembler::processor::run(&request, &mut attached).unwrap();
    assert_eq!(
        created,
        vec![
            dir.path().join("target/app-1.0-all.zip"),
            dir.path().join("target/app-1.0-all.jar"),
            dir.path().join("target/app-1.0-copied.zip"),
        ]
    );

    for archive in &created[..2] {
        assert!(zip_entries(archive).iter().any(|e| e == COMPONENTS));
    }
    let copied = zip_entries(&created[2]);
    assert_eq!(copied, vec!["lib/", "lib/first-1.0.jar"]);
}
