// src/scanner.rs

//! Directory scanning with Ant-style include/exclude patterns
//!
//! Patterns are matched against `/`-separated paths relative to the scan
//! root. `*` stays within one path segment, `**` spans any number of
//! segments, and a pattern ending in `/` is treated as `pattern/**`.
//! Version-control and editor metadata is always excluded unless default
//! excludes are turned off.

use crate::error::{Error, Result};
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Patterns excluded from every scan by default
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/*~",
    "**/#*#",
    "**/.#*",
    "**/%*%",
    "**/._*",
    "**/CVS",
    "**/CVS/**",
    "**/.cvsignore",
    "**/RCS",
    "**/RCS/**",
    "**/SCCS",
    "**/SCCS/**",
    "**/vssver.scc",
    "**/project.pj",
    "**/.svn",
    "**/.svn/**",
    "**/.arch-ids",
    "**/.arch-ids/**",
    "**/.bzr",
    "**/.bzr/**",
    "**/.MySCMServerInfo",
    "**/.DS_Store",
    "**/.metadata",
    "**/.metadata/**",
    "**/.hg",
    "**/.hg/**",
    "**/.git",
    "**/.git/**",
    "**/.gitignore",
    "**/BitKeeper",
    "**/BitKeeper/**",
    "**/ChangeSet",
    "**/ChangeSet/**",
    "**/_darcs",
    "**/_darcs/**",
    "**/.darcsrepo",
    "**/.darcsrepo/**",
    "**/-darcs-backup*",
    "**/.darcs-temp-mail",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compile one Ant-style pattern
pub fn compile_pattern(pattern: &str) -> Result<Pattern> {
    let mut normalized = pattern.trim().replace('\\', "/");
    if let Some(stripped) = normalized.strip_prefix("./") {
        normalized = stripped.to_string();
    }
    if normalized.ends_with('/') {
        normalized.push_str("**");
    }
    Pattern::new(&normalized)
        .map_err(|e| Error::Config(format!("invalid path pattern '{}': {}", pattern, e)))
}

fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Pattern>> {
    patterns.iter().map(|p| compile_pattern(p.as_ref())).collect()
}

/// One entry found by a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedEntry {
    /// Path relative to the scan root, `/`-separated
    pub relative: String,
    /// Absolute path on disk
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Include/exclude rules for walking a directory tree
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    includes: Vec<Pattern>,
    excludes: Vec<Pattern>,
}

impl DirectoryScanner {
    /// Scanner including everything except the default excludes
    pub fn new() -> Self {
        let excludes = DEFAULT_EXCLUDES
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .collect();
        Self {
            includes: Vec::new(),
            excludes,
        }
    }

    /// Scanner for the given include/exclude lists plus default excludes
    pub fn with_patterns<S: AsRef<str>>(includes: &[S], excludes: &[S]) -> Result<Self> {
        let mut scanner = Self::new();
        scanner.includes = compile_all(includes)?;
        scanner.excludes.extend(compile_all(excludes)?);
        Ok(scanner)
    }

    /// Add more exclude patterns
    pub fn exclude<S: AsRef<str>>(mut self, excludes: &[S]) -> Result<Self> {
        self.excludes.extend(compile_all(excludes)?);
        Ok(self)
    }

    /// Whether a relative path passes the include and exclude rules
    pub fn is_selected(&self, relative: &str) -> bool {
        let included = self.includes.is_empty()
            || self
                .includes
                .iter()
                .any(|p| p.matches_with(relative, MATCH_OPTIONS));
        included && !self.is_excluded(relative)
    }

    pub fn is_excluded(&self, relative: &str) -> bool {
        self.excludes
            .iter()
            .any(|p| p.matches_with(relative, MATCH_OPTIONS))
    }

    /// Walk `root` and return the selected files and directories
    ///
    /// Entries come back in a stable, name-sorted, depth-first order. The
    /// root itself is never returned.
    pub fn scan(&self, root: &Path) -> Result<Vec<ScannedEntry>> {
        if !root.is_dir() {
            return Err(Error::MissingSource(root.to_path_buf()));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                Error::io("scan", path, e.into())
            })?;

            let relative = relative_path(root, entry.path());
            let is_dir = entry.file_type().is_dir();
            if !is_dir && !entry.path().is_file() {
                continue;
            }
            if self.is_selected(&relative) {
                entries.push(ScannedEntry {
                    relative,
                    path: entry.path().to_path_buf(),
                    is_dir,
                });
            }
        }
        Ok(entries)
    }
}

impl Default for DirectoryScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// `/`-separated path of `path` below `root`
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
