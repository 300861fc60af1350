// src/archiver/mod.rs

//! Archive writers
//!
//! Every output format is an [`Archiver`]: entries are buffered in an
//! [`EntrySet`] while content is added and written in insertion order when
//! [`Archiver::create_archive`] runs. [`ArchiverRegistry`] maps format tags
//! (see [`format`]) to archiver constructors.

mod dir;
mod entries;
pub mod format;
mod manifest;
mod tar;
mod zip;

pub use dir::DirectoryArchiver;
pub use entries::{ArchiveEntry, EntrySet, EntrySource, normalize_name};
pub use format::{Compression, FormatSelection, LongFileMode};
pub use manifest::{MANIFEST_PATH, ManifestSettings};
pub use tar::TarArchiver;
pub use zip::ZipArchiver;

use crate::error::{Error, Result};
use crate::paths;
use crate::scanner::DirectoryScanner;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;

/// Decides whether a file offered to an archiver is actually added
pub trait FileSelector {
    /// `entry_name` is the archive path, `source` the file on disk
    fn is_selected(&mut self, entry_name: &str, source: &Path) -> Result<bool>;
}

/// Selector that accepts everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl FileSelector for AcceptAll {
    fn is_selected(&mut self, _entry_name: &str, _source: &Path) -> Result<bool> {
        Ok(true)
    }
}

/// Output archive capability
pub trait Archiver {
    /// Format tag this archiver was created for
    fn format(&self) -> &str;

    fn entries(&self) -> &EntrySet;

    fn entries_mut(&mut self) -> &mut EntrySet;

    fn set_dest_file(&mut self, dest: &Path);

    fn dest_file(&self) -> Option<&Path>;

    /// Write every buffered entry to the destination
    fn create_archive(&mut self) -> Result<PathBuf>;

    /// Modes for entries added from now on without an explicit mode
    fn set_default_modes(&mut self, directory_mode: u32, file_mode: u32) {
        self.entries_mut().set_default_modes(directory_mode, file_mode);
    }

    fn add_file(&mut self, source: &Path, entry_name: &str, mode: Option<u32>) -> Result<()> {
        self.entries_mut().add_file(source, entry_name, mode)?;
        Ok(())
    }

    fn add_content(&mut self, entry_name: &str, content: Vec<u8>, mode: Option<u32>) -> Result<()> {
        self.entries_mut().add_content(entry_name, content, mode);
        Ok(())
    }

    /// Add the selected part of a directory tree below `prefix`
    fn add_directory(
        &mut self,
        source: &Path,
        prefix: &str,
        includes: &[String],
        excludes: &[String],
    ) -> Result<()> {
        let scanner = DirectoryScanner::with_patterns(includes, excludes)?;
        self.add_scanned(source, prefix, &scanner, &mut AcceptAll)
    }

    /// Add a scanned tree, offering each file to `selector` first
    fn add_scanned(
        &mut self,
        source: &Path,
        prefix: &str,
        scanner: &DirectoryScanner,
        selector: &mut dyn FileSelector,
    ) -> Result<()> {
        for entry in scanner.scan(source)? {
            let name = paths::join_entry(prefix, &entry.relative);
            if entry.is_dir {
                self.entries_mut().add_directory(&name);
            } else if selector.is_selected(&name, &entry.path)? {
                self.add_file(&entry.path, &name, None)?;
            }
        }
        Ok(())
    }
}

/// Shared archiver configuration
#[derive(Debug, Clone)]
pub struct ArchiverSettings {
    pub long_file_mode: LongFileMode,
    pub manifest: ManifestSettings,
    /// `Created-By` manifest value
    pub created_by: String,
}

impl Default for ArchiverSettings {
    fn default() -> Self {
        Self {
            long_file_mode: LongFileMode::default(),
            manifest: ManifestSettings::default(),
            created_by: format!("assembler {}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Constructor for a registered archiver
pub type ArchiverFactory = fn(&FormatSelection, &ArchiverSettings) -> Box<dyn Archiver>;

/// Format tag to archiver mapping
pub struct ArchiverRegistry {
    factories: IndexMap<String, ArchiverFactory>,
}

impl ArchiverRegistry {
    /// Registry with no archivers
    pub fn empty() -> Self {
        Self {
            factories: IndexMap::new(),
        }
    }

    pub fn register(&mut self, name: &str, factory: ArchiverFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    /// Registered archiver names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Parse a tag and check that its archiver is registered
    pub fn resolve(&self, tag: &str) -> Result<FormatSelection> {
        let selection = format::select(tag)?;
        if !self.factories.contains_key(&selection.archiver) {
            return Err(Error::UnsupportedFormat(tag.to_string()));
        }
        Ok(selection)
    }

    /// Create a fresh archiver for a tag
    pub fn create(&self, tag: &str, settings: &ArchiverSettings) -> Result<Box<dyn Archiver>> {
        let selection = format::select(tag)?;
        let factory = self
            .factories
            .get(&selection.archiver)
            .ok_or_else(|| Error::UnsupportedFormat(tag.to_string()))?;
        Ok(factory(&selection, settings))
    }
}

impl Default for ArchiverRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("zip", |selection, _| {
            Box::new(ZipArchiver::new(&selection.tag))
        });
        registry.register("jar", |selection, settings| {
            Box::new(ZipArchiver::jar(&selection.tag, settings))
        });
        registry.register("war", |selection, settings| {
            Box::new(
                ZipArchiver::jar(&selection.tag, settings)
                    .with_web_xml_required(!selection.bypass_validation),
            )
        });
        registry.register("ear", |selection, settings| {
            Box::new(ZipArchiver::jar(&selection.tag, settings))
        });
        registry.register("tar", |selection, settings| {
            Box::new(TarArchiver::new(
                &selection.tag,
                selection.compression,
                settings.long_file_mode,
            ))
        });
        registry.register("dir", |selection, _| {
            Box::new(DirectoryArchiver::new(&selection.tag))
        });
        registry
    }
}

impl std::fmt::Debug for ArchiverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiverRegistry")
            .field("archivers", &self.names())
            .finish()
    }
}

/// Temporary file next to `dest` that receives the archive while it is written
///
/// Dropping it without [`persist`] removes it, so a failed write never
/// leaves a partial archive under the destination name.
pub(crate) fn staged_file(dest: &Path) -> Result<NamedTempFile> {
    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| Error::io("create directory", parent, e))?;
    NamedTempFile::new_in(parent).map_err(|e| Error::io("create", dest, e))
}

/// Move a fully written staged archive to its destination
pub(crate) fn persist(staged: NamedTempFile, dest: &Path) -> Result<()> {
    staged
        .persist(dest)
        .map_err(|e| Error::io("rename", dest, e.error))?;
    Ok(())
}

/// Timestamp for entries that have no file on disk
///
/// Honors `SOURCE_DATE_EPOCH` for reproducible output.
pub(crate) fn build_timestamp() -> u64 {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        })
}

/// Modification time of a file in seconds, falling back to `fallback`
pub(crate) fn file_mtime(path: &Path, fallback: u64) -> u64 {
    path.metadata()
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_registry() {
        let registry = ArchiverRegistry::default();
        assert_eq!(registry.names(), vec!["zip", "jar", "war", "ear", "tar", "dir"]);

        let settings = ArchiverSettings::default();
        assert_eq!(registry.create("tar.gz", &settings).unwrap().format(), "tar.gz");
        assert_eq!(registry.create("jar", &settings).unwrap().format(), "jar");
    }

    #[test]
    fn test_unsupported_format() {
        let registry = ArchiverRegistry::default();
        let settings = ArchiverSettings::default();

        let err = registry.create("rar", &settings).err().unwrap();
        assert!(matches!(err, Error::UnsupportedFormat(ref tag) if tag == "rar"));
        assert!(registry.resolve("7z").is_err());
        assert!(registry.resolve("tar.bz2").is_ok());
    }

    #[test]
    fn test_custom_registry_enforces_web_xml() {
        let dir = TempDir::new().unwrap();
        let mut registry = ArchiverRegistry::default();
        registry.register("war", |selection, settings| {
            Box::new(ZipArchiver::jar(&selection.tag, settings).with_web_xml_required(true))
        });

        let mut archiver = registry.create("war", &ArchiverSettings::default()).unwrap();
        archiver.add_content("index.html", b"<html/>".to_vec(), None).unwrap();
        archiver.set_dest_file(&dir.path().join("app.war"));
        assert!(matches!(archiver.create_archive(), Err(Error::Archive { .. })));
        assert!(!dir.path().join("app.war").exists());
    }

    #[test]
    fn test_add_directory_uses_prefix_and_patterns() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("conf")).unwrap();
        fs::write(dir.path().join("conf/app.properties"), "a=1").unwrap();
        fs::write(dir.path().join("conf/skip.tmp"), "x").unwrap();

        let mut archiver = ZipArchiver::new("zip");
        archiver
            .add_directory(dir.path(), "app-1.0/", &[], &["**/*.tmp".to_string()])
            .unwrap();

        let names = archiver.entries().names();
        assert_eq!(
            names,
            vec!["app-1.0/", "app-1.0/conf/", "app-1.0/conf/app.properties"]
        );
    }

    struct RejectTmp;

    impl FileSelector for RejectTmp {
        fn is_selected(&mut self, entry_name: &str, _source: &Path) -> Result<bool> {
            Ok(!entry_name.ends_with(".tmp"))
        }
    }

    #[test]
    fn test_selector_can_veto_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("keep.txt"), "k").unwrap();
        fs::write(dir.path().join("drop.tmp"), "d").unwrap();

        let mut archiver = ZipArchiver::new("zip");
        archiver
            .add_scanned(dir.path(), "", &DirectoryScanner::new(), &mut RejectTmp)
            .unwrap();

        assert_eq!(archiver.entries().names(), vec!["keep.txt"]);
    }
}
