// src/interpolation/mod.rs

//! Layered `${token}` interpolation
//!
//! An [`Interpolator`] is an ordered list of pure lookup functions. For each
//! token the sources are consulted in declaration order and the first one
//! that yields a value wins. Tokens no source knows are left verbatim.
//!
//! The canonical layer stacks used for file name mappings and output
//! directories live in [`TemplateContext`].

mod context;
pub mod sources;

pub use context::TemplateContext;

use crate::error::{Error, Result};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}").unwrap());

/// A single value source: `key -> optional value`
pub type Lookup<'a> = Box<dyn Fn(&str) -> Option<String> + 'a>;

/// Ordered, first-match-wins composition of value sources
#[derive(Default)]
pub struct Interpolator<'a> {
    sources: Vec<(&'static str, Lookup<'a>)>,
}

impl<'a> Interpolator<'a> {
    /// Create an interpolator with no sources
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source with lower precedence than every existing one
    pub fn with_source(
        mut self,
        name: &'static str,
        lookup: impl Fn(&str) -> Option<String> + 'a,
    ) -> Self {
        self.sources.push((name, Box::new(lookup)));
        self
    }

    /// Append all sources of another interpolator, keeping their order
    pub fn chain(mut self, other: Interpolator<'a>) -> Self {
        self.sources.extend(other.sources);
        self
    }

    /// Names of the sources in precedence order
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|(name, _)| *name).collect()
    }

    /// Look a key up in precedence order
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|(_, lookup)| lookup(key))
    }

    /// Replace every resolvable `${token}` in `template`
    ///
    /// Resolved values are interpolated again against the same sources; a
    /// reference cycle leaves the offending token literal.
    pub fn interpolate(&self, template: &str) -> String {
        let mut resolving = Vec::new();
        self.resolve(template, &mut resolving)
    }

    fn resolve(&self, template: &str, resolving: &mut Vec<String>) -> String {
        if !template.contains("${") {
            return template.to_string();
        }

        TOKEN
            .replace_all(template, |caps: &Captures| {
                let key = &caps[1];
                if resolving.iter().any(|k| k == key) {
                    return caps[0].to_string();
                }
                match self.lookup(key) {
                    Some(value) => {
                        resolving.push(key.to_string());
                        let resolved = self.resolve(&value, resolving);
                        resolving.pop();
                        resolved
                    }
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

impl std::fmt::Debug for Interpolator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpolator")
            .field("sources", &self.source_names())
            .finish()
    }
}

/// Reject templates with an unterminated `${`
pub fn validate_template(template: &str) -> Result<()> {
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => rest = &after[end + 1..],
            None => {
                return Err(Error::Template {
                    template: template.to_string(),
                    message: format!("unterminated expression at '{}'", &rest[start..]),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_earlier_source_wins() {
        let first = map(&[("name", "first")]);
        let second = map(&[("name", "second"), ("only", "later")]);
        let interp = Interpolator::new()
            .with_source("first", |k| first.get(k).cloned())
            .with_source("second", |k| second.get(k).cloned());

        assert_eq!(interp.interpolate("${name}"), "first");
        assert_eq!(interp.interpolate("${only}"), "later");
        assert_eq!(interp.interpolate("${missing}"), "${missing}");
    }

    #[test]
    fn test_mixed_text_and_tokens() {
        let values = map(&[("a", "x"), ("b", "y")]);
        let interp = Interpolator::new().with_source("values", |k| values.get(k).cloned());

        assert_eq!(interp.interpolate("pre-${a}/${b}.post"), "pre-x/y.post");
        assert_eq!(interp.interpolate("no tokens"), "no tokens");
        assert_eq!(interp.interpolate("${a"), "${a");
    }

    #[test]
    fn test_nested_values_resolve() {
        let values = map(&[("outer", "${inner}-suffix"), ("inner", "core")]);
        let interp = Interpolator::new().with_source("values", |k| values.get(k).cloned());

        assert_eq!(interp.interpolate("${outer}"), "core-suffix");
    }

    #[test]
    fn test_cycle_left_literal() {
        let values = map(&[("a", "${b}"), ("b", "${a}")]);
        let interp = Interpolator::new().with_source("values", |k| values.get(k).cloned());

        assert_eq!(interp.interpolate("${a}"), "${a}");
    }

    #[test]
    fn test_chain_preserves_order() {
        let a = map(&[("k", "a")]);
        let b = map(&[("k", "b")]);
        let first = Interpolator::new().with_source("a", |k| a.get(k).cloned());
        let second = Interpolator::new().with_source("b", |k| b.get(k).cloned());

        let chained = second.chain(first);
        assert_eq!(chained.source_names(), vec!["b", "a"]);
        assert_eq!(chained.interpolate("${k}"), "b");
    }

    #[test]
    fn test_validate_template() {
        assert!(validate_template("${a}/${b}").is_ok());
        assert!(validate_template("plain").is_ok());
        assert!(matches!(
            validate_template("lib/${artifactId"),
            Err(Error::Template { .. })
        ));
    }
}
