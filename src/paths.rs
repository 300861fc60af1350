// src/paths.rs

//! Archive path normalization
//!
//! Archive entry paths are plain strings built from templates, so they are
//! normalized textually rather than through `std::path`: both separator
//! kinds are handled independently and nothing touches the filesystem.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{error, warn};

static DRIVE_LETTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z]:").unwrap());

const SEPARATORS: [&str; 2] = ["/", "\\"];

/// Remove `.` segments and fold `..` segments into their predecessor
///
/// Each separator kind is processed on its own, repeating until neither
/// split has a `.` or `..` segment left. A `..` with nothing before it is
/// dropped. A trailing separator on the input is kept on the output.
pub fn fix_relative_refs(path: &str) -> String {
    let trailing = SEPARATORS.into_iter().find(|sep| path.ends_with(sep));

    let mut value = path.to_string();
    loop {
        let next = SEPARATORS
            .iter()
            .fold(value.clone(), |current, sep| fold_segments(&current, sep));
        if next == value {
            break;
        }
        value = next;
    }

    if let Some(sep) = trailing
        && !value.is_empty()
        && !value.ends_with(sep)
    {
        value.push_str(sep);
    }
    value
}

/// One pass over the segments of `value` split on `sep`
fn fold_segments(value: &str, sep: &str) -> String {
    if !value.split(sep).any(|part| part == "." || part == "..") {
        return value.to_string();
    }

    let mut kept: Vec<&str> = Vec::new();
    for part in value.split(sep) {
        match part {
            "." => {}
            ".." => {
                kept.pop();
            }
            other => kept.push(other),
        }
    }
    while kept.last().is_some_and(|p| p.is_empty()) {
        kept.pop();
    }
    kept.join(sep)
}

/// Collapse doubled separators
pub fn collapse_separators(path: &str) -> String {
    path.replace("//", "/").replace("\\\\", "\\")
}

fn ends_with_separator(path: &str) -> bool {
    path.ends_with('/') || path.ends_with('\\')
}

fn starts_with_separator(path: &str) -> bool {
    path.starts_with('/') || path.starts_with('\\')
}

/// Turn an interpolated output directory into an archive path prefix
///
/// The result is empty or ends with exactly one separator. With
/// `include_base_directory` it is rooted at `final_name`; otherwise one
/// leading separator is stripped.
pub fn resolve_output_directory(
    interpolated: &str,
    final_name: &str,
    include_base_directory: bool,
) -> String {
    let mut value = interpolated.to_string();
    if !value.is_empty() && !ends_with_separator(&value) {
        value.push('/');
    }

    if include_base_directory {
        value = if starts_with_separator(&value) {
            format!("{}{}", final_name, value)
        } else {
            format!("{}/{}", final_name, value)
        };
    } else if starts_with_separator(&value) {
        value.remove(0);
    }

    fix_relative_refs(&collapse_separators(&value))
}

/// True for destinations starting with a drive letter (`C:`)
pub fn is_windows_path(destination: &str) -> bool {
    DRIVE_LETTER.is_match(destination)
}

/// True for destinations starting with `/`
pub fn is_unix_root_reference(destination: &str) -> bool {
    destination.starts_with('/')
}

/// Log destinations that will not unpack the same way on every platform
pub fn platform_warnings(destination: &str) {
    if cfg!(windows) {
        if is_unix_root_reference(destination) {
            error!(
                "Destination '{}' is a root-relative reference (starting with slash) on Windows",
                destination
            );
        } else if is_windows_path(destination) {
            warn!(
                "Destination '{}' uses a drive letter; this is not portable and will fail on non-Windows",
                destination
            );
        }
    } else if is_windows_path(destination) {
        error!(
            "Destination '{}' uses a Windows drive letter on a non-Windows platform",
            destination
        );
    } else if is_unix_root_reference(destination) {
        warn!(
            "Destination '{}' is a root-relative reference (starting with slash); this is not portable and might fail on Windows",
            destination
        );
    }
}

/// Base name of an output archive, without the format extension
///
/// The assembly id is appended when requested and non-empty; otherwise a
/// configured classifier is appended.
pub fn distribution_name(
    final_name: &str,
    assembly_id: &str,
    append_assembly_id: bool,
    classifier: Option<&str>,
) -> String {
    if append_assembly_id && !assembly_id.is_empty() {
        return format!("{}-{}", final_name, assembly_id);
    }
    match classifier {
        Some(c) if !c.is_empty() => format!("{}-{}", final_name, c),
        _ => final_name.to_string(),
    }
}

/// Join an archive prefix and a relative entry name with one `/`
pub fn join_entry(prefix: &str, name: &str) -> String {
    let name = name.trim_start_matches(['/', '\\']);
    if prefix.is_empty() {
        return name.to_string();
    }
    if ends_with_separator(prefix) {
        format!("{}{}", prefix, name)
    } else {
        format!("{}/{}", prefix, name)
    }
}
