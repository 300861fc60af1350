// src/selection.rs

//! Dependency selection for dependency sets
//!
//! An artifact is selected when its scope is accepted by the set's scope
//! filter, it matches at least one include pattern (or there are none), and
//! it matches no exclude pattern. Exclusion always wins.

use crate::error::{Error, Result};
use crate::model::{Artifact, DependencySet, Scope};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Scope vocabulary accepted by a dependency set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeFilter {
    Compile,
    #[default]
    Runtime,
    Test,
    Provided,
    System,
    /// Accept every scope
    Unfiltered,
}

impl ScopeFilter {
    /// Whether an artifact in `scope` is visible through this filter
    pub fn accepts(&self, scope: Scope) -> bool {
        match self {
            Self::Compile => matches!(scope, Scope::Compile | Scope::Provided | Scope::System),
            Self::Runtime => matches!(scope, Scope::Compile | Scope::Runtime),
            Self::Test | Self::Unfiltered => true,
            Self::Provided => scope == Scope::Provided,
            Self::System => scope == Scope::System,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Runtime => "runtime",
            Self::Test => "test",
            Self::Provided => "provided",
            Self::System => "system",
            Self::Unfiltered => "unfiltered",
        }
    }
}

impl fmt::Display for ScopeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "compile" => Ok(Self::Compile),
            "runtime" => Ok(Self::Runtime),
            "test" => Ok(Self::Test),
            "provided" => Ok(Self::Provided),
            "system" => Ok(Self::System),
            "unfiltered" => Ok(Self::Unfiltered),
            other => Err(Error::Config(format!("unknown scope filter '{}'", other))),
        }
    }
}

/// A `group:artifact[:type[:classifier]]` glob pattern
///
/// Each segment is matched independently; a pattern with fewer segments
/// only constrains the leading coordinates.
#[derive(Debug, Clone)]
pub struct ArtifactPattern {
    source: String,
    segments: Vec<Pattern>,
}

impl ArtifactPattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let parts: Vec<&str> = pattern.trim().split(':').collect();
        if parts.is_empty() || parts.len() > 4 || parts[0].is_empty() {
            return Err(Error::Config(format!(
                "invalid artifact pattern '{}' (expected group:artifact[:type[:classifier]])",
                pattern
            )));
        }

        let segments = parts
            .iter()
            .map(|part| {
                let glob = if part.is_empty() { "*" } else { part };
                Pattern::new(glob).map_err(|e| {
                    Error::Config(format!("invalid artifact pattern '{}': {}", pattern, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, artifact: &Artifact) -> bool {
        let classifier = artifact.classifier.clone().unwrap_or_default();
        let coordinates = [
            artifact.group_id.as_str(),
            artifact.artifact_id.as_str(),
            artifact.artifact_type.as_str(),
            classifier.as_str(),
        ];
        self.segments
            .iter()
            .zip(coordinates)
            .all(|(pattern, value)| pattern.matches(value))
    }
}

/// Outcome of evaluating one artifact against a selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Included,
    OutOfScope,
    NotIncluded,
    /// Matched the named exclude pattern
    Excluded(String),
}

/// Compiled selection rules of one dependency set
#[derive(Debug, Clone)]
pub struct ArtifactSelector {
    scope: ScopeFilter,
    includes: Vec<ArtifactPattern>,
    excludes: Vec<ArtifactPattern>,
}

impl ArtifactSelector {
    pub fn new(scope: ScopeFilter, includes: &[String], excludes: &[String]) -> Result<Self> {
        Ok(Self {
            scope,
            includes: includes
                .iter()
                .map(|p| ArtifactPattern::parse(p))
                .collect::<Result<_>>()?,
            excludes: excludes
                .iter()
                .map(|p| ArtifactPattern::parse(p))
                .collect::<Result<_>>()?,
        })
    }

    pub fn for_set(set: &DependencySet) -> Result<Self> {
        Self::new(set.scope, &set.includes, &set.excludes)
    }

    pub fn evaluate(&self, artifact: &Artifact) -> Selection {
        if !self.scope.accepts(artifact.scope) {
            return Selection::OutOfScope;
        }
        if !self.includes.is_empty() && !self.includes.iter().any(|p| p.matches(artifact)) {
            return Selection::NotIncluded;
        }
        if let Some(pattern) = self.excludes.iter().find(|p| p.matches(artifact)) {
            return Selection::Excluded(pattern.as_str().to_string());
        }
        Selection::Included
    }

    /// Keep the selected artifacts in their original order
    pub fn select<'a>(&self, artifacts: &'a [Artifact]) -> Vec<&'a Artifact> {
        artifacts
            .iter()
            .filter(|artifact| match self.evaluate(artifact) {
                Selection::Included => true,
                Selection::OutOfScope => {
                    debug!(
                        "{} excluded: scope {} not accepted by {}",
                        artifact, artifact.scope, self.scope
                    );
                    false
                }
                Selection::NotIncluded => {
                    debug!("{} excluded: matches no include pattern", artifact);
                    false
                }
                Selection::Excluded(pattern) => {
                    debug!("{} excluded by pattern {}", artifact, pattern);
                    false
                }
            })
            .collect()
    }
}
