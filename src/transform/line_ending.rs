// src/transform/line_ending.rs

//! Line terminator rewriting

use super::split_lines;
use crate::error::{Error, Result};
use crate::scanner::DirectoryScanner;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Requested line-ending treatment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// Leave content untouched
    Keep,
    /// `\r\n` (`dos` or `crlf`)
    Dos,
    /// `\n` (`unix` or `lf`)
    Unix,
}

impl LineEnding {
    /// Terminator to write after each line, `None` for [`LineEnding::Keep`]
    pub fn terminator(&self) -> Option<&'static str> {
        match self {
            Self::Keep => None,
            Self::Dos => Some("\r\n"),
            Self::Unix => Some("\n"),
        }
    }

    /// Resolve an optional descriptor token to a terminator
    ///
    /// A missing token and `keep` both mean no rewrite.
    pub fn terminator_for(token: Option<&str>) -> Result<Option<&'static str>> {
        match token {
            None => Ok(None),
            Some(token) => Ok(token.parse::<LineEnding>()?.terminator()),
        }
    }
}

impl FromStr for LineEnding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "keep" => Ok(Self::Keep),
            "dos" | "crlf" => Ok(Self::Dos),
            "unix" | "lf" => Ok(Self::Unix),
            other => Err(Error::InvalidLineEndingMode(other.to_string())),
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep => write!(f, "keep"),
            Self::Dos => write!(f, "dos"),
            Self::Unix => write!(f, "unix"),
        }
    }
}

/// Rewrite every line of `content` to end with `terminator`
///
/// A terminator follows every line, including a final line that had none.
pub fn rewrite(content: &[u8], terminator: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 16);
    for line in split_lines(content) {
        out.extend_from_slice(line);
        out.extend_from_slice(terminator.as_bytes());
    }
    out
}

/// Copy `source` to `dest` with rewritten line endings
pub fn rewrite_file(source: &Path, dest: &Path, terminator: &str) -> Result<()> {
    debug!(
        "Copying while replacing line endings: {} to {}",
        source.display(),
        dest.display()
    );
    let content = fs::read(source).map_err(|e| Error::io("read", source, e))?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io("create directory", parent, e))?;
    }
    fs::write(dest, rewrite(&content, terminator)).map_err(|e| Error::io("write", dest, e))
}

/// Copy the selected part of a tree into `dest_root` with rewritten line
/// endings, preserving relative paths
pub fn rewrite_tree(
    source_root: &Path,
    scanner: &DirectoryScanner,
    dest_root: &Path,
    terminator: &str,
) -> Result<()> {
    for entry in scanner.scan(source_root)? {
        let target = dest_root.join(&entry.relative);
        if entry.is_dir {
            fs::create_dir_all(&target).map_err(|e| Error::io("create directory", &target, e))?;
        } else {
            rewrite_file(&entry.path, &target, terminator)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_tokens() {
        assert_eq!("crlf".parse::<LineEnding>().unwrap(), LineEnding::Dos);
        assert_eq!("lf".parse::<LineEnding>().unwrap(), LineEnding::Unix);
        assert_eq!("keep".parse::<LineEnding>().unwrap(), LineEnding::Keep);
        assert!(matches!(
            "mac".parse::<LineEnding>(),
            Err(Error::InvalidLineEndingMode(_))
        ));
    }

    #[test]
    fn test_terminator_for() {
        assert_eq!(LineEnding::terminator_for(None).unwrap(), None);
        assert_eq!(LineEnding::terminator_for(Some("keep")).unwrap(), None);
        assert_eq!(LineEnding::terminator_for(Some("dos")).unwrap(), Some("\r\n"));
        assert!(LineEnding::terminator_for(Some("DOS")).is_err());
    }

    #[test]
    fn test_rewrite_appends_final_terminator() {
        assert_eq!(rewrite(b"a\r\nb\rc\nd", "\r\n"), b"a\r\nb\r\nc\r\nd\r\n");
        assert_eq!(rewrite(b"one\r\ntwo\r\n", "\n"), b"one\ntwo\n");
        assert_eq!(rewrite(b"", "\n"), b"");
    }

    #[test]
    fn test_rewrite_tree_preserves_layout() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("bin")).unwrap();
        fs::write(src.path().join("bin/run.sh"), "#!/bin/sh\r\necho hi\r\n").unwrap();
        fs::write(src.path().join("notes.txt"), "x").unwrap();

        let scanner = DirectoryScanner::with_patterns(&["bin/**"], &[] as &[&str]).unwrap();
        rewrite_tree(src.path(), &scanner, dest.path(), "\n").unwrap();

        let script = fs::read_to_string(dest.path().join("bin/run.sh")).unwrap();
        assert_eq!(script, "#!/bin/sh\necho hi\n");
        assert!(!dest.path().join("notes.txt").exists());
    }
}
