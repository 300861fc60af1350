// src/transform/mod.rs

//! Content transforms applied before a file enters an archive
//!
//! - [`line_ending`]: rewrite every line terminator to a fixed sequence
//! - [`filtering`]: substitute `${token}` references in text content
//! - [`properties`]: Java-style property files used as filter sources
//!
//! Transforms never modify their source; output always goes to a new path.

pub mod filtering;
pub mod line_ending;
pub mod properties;

pub use filtering::ContentFilter;
pub use line_ending::LineEnding;

use std::ops::Range;

/// Byte ranges of the lines in `content`
///
/// Lines end at `\n`, `\r`, or `\r\n`. The terminators are not part of the
/// ranges, and a final unterminated line is still a line.
fn line_ranges(content: &[u8]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < content.len() {
        match content[i] {
            b'\n' => {
                ranges.push(start..i);
                i += 1;
                start = i;
            }
            b'\r' => {
                ranges.push(start..i);
                i += 1;
                if content.get(i) == Some(&b'\n') {
                    i += 1;
                }
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < content.len() {
        ranges.push(start..content.len());
    }
    ranges
}

/// Split raw bytes into lines
pub fn split_lines(content: &[u8]) -> Vec<&[u8]> {
    line_ranges(content)
        .into_iter()
        .map(|range| &content[range])
        .collect()
}

/// Split text into lines
pub fn split_text_lines(text: &str) -> Vec<&str> {
    // terminators are ASCII, so every range falls on a char boundary
    line_ranges(text.as_bytes())
        .into_iter()
        .map(|range| &text[range])
        .collect()
}
