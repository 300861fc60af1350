// src/archiver/manifest.rs

//! `META-INF/MANIFEST.MF` for jar-style archives

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Archive path of the manifest
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

const MAX_LINE_BYTES: usize = 72;

/// Manifest configuration (`[config.archive]`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ManifestSettings {
    /// Use this file verbatim instead of generating a manifest
    pub manifest_file: Option<PathBuf>,
    /// Extra main attributes, in order
    pub manifest_entries: IndexMap<String, String>,
}

impl ManifestSettings {
    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.manifest_entries
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Produce the manifest bytes
    pub fn render(&self, created_by: &str) -> Result<Vec<u8>> {
        if let Some(path) = &self.manifest_file {
            if !path.is_file() {
                return Err(Error::Manifest {
                    path: path.clone(),
                    message: "Manifest not found".to_string(),
                });
            }
            return fs::read(path).map_err(|e| Error::Manifest {
                path: path.clone(),
                message: e.to_string(),
            });
        }

        let mut attributes = IndexMap::new();
        attributes.insert("Manifest-Version".to_string(), "1.0".to_string());
        attributes.insert("Created-By".to_string(), created_by.to_string());
        for (key, value) in &self.manifest_entries {
            attributes.insert(key.clone(), value.clone());
        }

        let mut out = String::new();
        for (key, value) in &attributes {
            write_attribute(&mut out, key, value);
        }
        out.push_str("\r\n");
        Ok(out.into_bytes())
    }
}

/// Write `Key: Value`, wrapping at 72 bytes with single-space continuations
fn write_attribute(out: &mut String, key: &str, value: &str) {
    let line = format!("{}: {}", key, value);
    let mut rest = line.as_str();
    let mut limit = MAX_LINE_BYTES;
    let mut first = true;

    while !rest.is_empty() {
        let mut cut = rest.len().min(limit);
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if !first {
            out.push(' ');
        }
        out.push_str(&rest[..cut]);
        out.push_str("\r\n");
        rest = &rest[cut..];
        // continuation lines spend one byte on the leading space
        limit = MAX_LINE_BYTES - 1;
        first = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generated_manifest() {
        let settings = ManifestSettings::default().with_entry("Main-Class", "org.example.Main");
        let text = String::from_utf8(settings.render("assembler 1.0").unwrap()).unwrap();

        assert_eq!(
            text,
            "Manifest-Version: 1.0\r\nCreated-By: assembler 1.0\r\nMain-Class: org.example.Main\r\n\r\n"
        );
    }

    #[test]
    fn test_entries_override_defaults_in_place() {
        let settings = ManifestSettings::default().with_entry("Created-By", "hand");
        let text = String::from_utf8(settings.render("assembler").unwrap()).unwrap();
        assert!(text.starts_with("Manifest-Version: 1.0\r\nCreated-By: hand\r\n"));
    }

    #[test]
    fn test_long_values_wrap() {
        let value = "x".repeat(200);
        let settings = ManifestSettings::default().with_entry("Class-Path", &value);
        let text = String::from_utf8(settings.render("a").unwrap()).unwrap();

        for line in text.split("\r\n") {
            assert!(line.len() <= 72, "line too long: {}", line.len());
        }
        let joined: String = text
            .split("\r\n")
            .skip_while(|l| !l.starts_with("Class-Path"))
            .take_while(|l| !l.is_empty())
            .map(|l| l.strip_prefix(' ').unwrap_or(l))
            .collect();
        assert_eq!(joined, format!("Class-Path: {}", value));
    }

    #[test]
    fn test_manifest_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("MANIFEST.MF");
        fs::write(&path, "Manifest-Version: 1.0\r\nX-Custom: yes\r\n\r\n").unwrap();

        let settings = ManifestSettings {
            manifest_file: Some(path),
            ..Default::default()
        };
        let text = String::from_utf8(settings.render("ignored").unwrap()).unwrap();
        assert!(text.contains("X-Custom: yes"));
        assert!(!text.contains("ignored"));
    }

    #[test]
    fn test_missing_manifest_file() {
        let dir = TempDir::new().unwrap();
        let settings = ManifestSettings {
            manifest_file: Some(dir.path().join("absent.MF")),
            ..Default::default()
        };
        assert!(matches!(
            settings.render("a"),
            Err(Error::Manifest { .. })
        ));
    }
}
