// src/archiver/zip.rs

//! Zip-family archivers: `zip`, `jar`, `war` and `ear`
//!
//! Jar-style archives start with `META-INF/` and the manifest; any other
//! `META-INF/MANIFEST.MF` offered to the archiver is ignored.

use super::entries::EntrySet;
use super::manifest::{MANIFEST_PATH, ManifestSettings};
use super::{Archiver, ArchiverSettings, persist, staged_file};
use crate::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

const WEB_XML_PATH: &str = "WEB-INF/web.xml";

pub struct ZipArchiver {
    format: String,
    manifest: Option<(ManifestSettings, String)>,
    web_xml_required: bool,
    entries: EntrySet,
    dest: Option<PathBuf>,
}

impl ZipArchiver {
    /// Plain zip archive
    pub fn new(format: &str) -> Self {
        Self {
            format: format.to_string(),
            manifest: None,
            web_xml_required: false,
            entries: EntrySet::new(),
            dest: None,
        }
    }

    /// Zip archive carrying a manifest
    pub fn jar(format: &str, settings: &ArchiverSettings) -> Self {
        Self {
            manifest: Some((settings.manifest.clone(), settings.created_by.clone())),
            ..Self::new(format)
        }
    }

    /// Require `WEB-INF/web.xml` to be present when the archive is created
    ///
    /// The default registry always bypasses this check for `war`; custom
    /// registries that want the descriptor enforced register their own
    /// `war` factory with this set.
    pub fn with_web_xml_required(mut self, required: bool) -> Self {
        self.web_xml_required = required;
        self
    }

    fn options(mode: u32) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(mode)
    }
}

impl Archiver for ZipArchiver {
    fn format(&self) -> &str {
        &self.format
    }

    fn entries(&self) -> &EntrySet {
        &self.entries
    }

    fn entries_mut(&mut self) -> &mut EntrySet {
        &mut self.entries
    }

    fn set_dest_file(&mut self, dest: &Path) {
        self.dest = Some(dest.to_path_buf());
    }

    fn dest_file(&self) -> Option<&Path> {
        self.dest.as_deref()
    }

    fn create_archive(&mut self) -> Result<PathBuf> {
        let dest = self
            .dest
            .clone()
            .ok_or_else(|| Error::Config(format!("{} archiver has no destination file", self.format)))?;

        if self.web_xml_required && !self.entries.contains(WEB_XML_PATH) {
            return Err(Error::archive(
                &dest,
                format!("{} is required but was not added", WEB_XML_PATH),
            ));
        }

        let manifest = match &self.manifest {
            Some((settings, created_by)) => Some(settings.render(created_by)?),
            None => None,
        };

        let mut staged = staged_file(&dest)?;
        let mut writer = zip::ZipWriter::new(staged.as_file_mut());

        let directory_mode = self.entries.directory_mode();
        let file_mode = self.entries.file_mode();

        if let Some(manifest) = &manifest {
            writer
                .add_directory("META-INF/", Self::options(directory_mode))
                .map_err(|e| Error::archive(&dest, e))?;
            writer
                .start_file(MANIFEST_PATH, Self::options(file_mode))
                .map_err(|e| Error::archive(&dest, e))?;
            writer
                .write_all(manifest)
                .map_err(|e| Error::io("write manifest", &dest, e))?;
        }

        for entry in self.entries.iter() {
            if manifest.is_some() && (entry.name == "META-INF/" || entry.name == MANIFEST_PATH) {
                if entry.name == MANIFEST_PATH {
                    debug!("Ignoring {} from {:?}", MANIFEST_PATH, entry.source);
                }
                continue;
            }

            if entry.is_dir() {
                writer
                    .add_directory(entry.name.as_str(), Self::options(entry.mode))
                    .map_err(|e| Error::archive(&dest, e))?;
                continue;
            }

            let content = entry.read()?;
            writer
                .start_file(entry.name.as_str(), Self::options(entry.mode))
                .map_err(|e| Error::archive(&dest, e))?;
            writer
                .write_all(&content)
                .map_err(|e| Error::io("write zip entry", &dest, e))?;
        }

        writer.finish().map_err(|e| Error::archive(&dest, e))?;
        persist(staged, &dest)?;
        debug!("Wrote {} entries to {}", self.entries.len(), dest.display());
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Read;
    use tempfile::TempDir;

    fn zip_names(path: &Path) -> Vec<String> {
        let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        archive.file_names().map(String::from).collect::<Vec<_>>()
    }

    fn zip_text(path: &Path, name: &str) -> String {
        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut text = String::new();
        file.read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn test_zip_entries_and_modes() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out/app.zip");

        let mut archiver = ZipArchiver::new("zip");
        archiver
            .add_content("app/bin/run.sh", b"run".to_vec(), Some(0o755))
            .unwrap();
        archiver.set_dest_file(&dest);
        archiver.create_archive().unwrap();

        let mut names = zip_names(&dest);
        names.sort();
        assert_eq!(names, vec!["app/", "app/bin/", "app/bin/run.sh"]);

        let mut archive = zip::ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let file = archive.by_name("app/bin/run.sh").unwrap();
        assert_eq!(file.unix_mode().unwrap() & 0o777, 0o755);
    }

    #[test]
    fn test_jar_manifest_comes_first() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("app.jar");
        let settings = ArchiverSettings {
            manifest: ManifestSettings::default().with_entry("Main-Class", "org.example.Main"),
            ..Default::default()
        };

        let mut archiver = ZipArchiver::jar("jar", &settings);
        archiver
            .add_content("org/example/Main.class", b"cafebabe".to_vec(), None)
            .unwrap();
        archiver
            .add_content(MANIFEST_PATH, b"Manifest-Version: 9\r\n".to_vec(), None)
            .unwrap();
        archiver.set_dest_file(&dest);
        archiver.create_archive().unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 5);
        assert_eq!(archive.by_index(0).unwrap().name(), "META-INF/");
        assert_eq!(archive.by_index(1).unwrap().name(), MANIFEST_PATH);

        let manifest = zip_text(&dest, MANIFEST_PATH);
        assert!(manifest.starts_with("Manifest-Version: 1.0\r\n"));
        assert!(manifest.contains("Main-Class: org.example.Main\r\n"));
    }

    #[test]
    fn test_war_requires_web_xml() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("app.war");
        let settings = ArchiverSettings::default();

        let mut archiver = ZipArchiver::jar("war", &settings).with_web_xml_required(true);
        archiver.add_content("index.html", b"<html/>".to_vec(), None).unwrap();
        archiver.set_dest_file(&dest);
        assert!(matches!(archiver.create_archive(), Err(Error::Archive { .. })));

        archiver
            .add_content(WEB_XML_PATH, b"<web-app/>".to_vec(), None)
            .unwrap();
        archiver.create_archive().unwrap();
        assert!(zip_names(&dest).contains(&WEB_XML_PATH.to_string()));
    }

    #[test]
    fn test_failed_write_leaves_no_archive() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src/data.txt");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, "data").unwrap();
        let out = dir.path().join("out");
        let dest = out.join("app.zip");

        let mut archiver = ZipArchiver::new("zip");
        archiver.add_content("first.txt", b"first".to_vec(), None).unwrap();
        archiver.add_file(&source, "data.txt", None).unwrap();
        archiver.set_dest_file(&dest);
        fs::remove_file(&source).unwrap();

        assert!(matches!(archiver.create_archive(), Err(Error::Io { .. })));
        assert!(!dest.exists());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }
}
