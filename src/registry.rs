// src/registry.rs

//! Component registry merging
//!
//! Dependency archives unpacked into one output may each carry a
//! `META-INF/plexus/components.xml` fragment. Copying them verbatim would
//! keep only one, so the registry intercepts every candidate at that path,
//! keeps the first component seen for each `role + role-hint` key, and
//! writes a single merged document once all other content is in place.
//!
//! A registry belongs to exactly one archive build: it is created with the
//! archiver, fed while content is added, and consumed by [`finalize`].
//!
//! [`finalize`]: ComponentRegistry::finalize

use crate::archiver::{Archiver, FileSelector};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Archive path of the registry fragment
pub const COMPONENTS_XML_PATH: &str = "META-INF/plexus/components.xml";

/// What to do with a candidate archive entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Hand the entry to the archiver unchanged
    PassThrough,
    /// Merge the entry into the registry instead of archiving it
    Absorb,
}

/// Which child of a component is being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Role,
    RoleHint,
}

/// A component element being collected
#[derive(Default)]
struct PendingComponent {
    events: Vec<Event<'static>>,
    role: Option<String>,
    role_hint: Option<String>,
    field: Option<Field>,
}

impl PendingComponent {
    fn append_text(&mut self, text: &str) {
        let target = match self.field {
            Some(Field::Role) => &mut self.role,
            Some(Field::RoleHint) => &mut self.role_hint,
            None => return,
        };
        target.get_or_insert_with(String::new).push_str(text);
    }
}

/// Deduplicating accumulator for component registry fragments
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    components: IndexMap<String, Vec<Event<'static>>>,
    fragments: usize,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a candidate entry by its archive path
    ///
    /// Backslashes count as `/` and a single leading `/` is ignored.
    pub fn classify(entry_name: &str) -> Disposition {
        let normalized = entry_name.replace('\\', "/");
        let normalized = normalized.strip_prefix('/').unwrap_or(&normalized);
        if normalized == COMPONENTS_XML_PATH {
            Disposition::Absorb
        } else {
            Disposition::PassThrough
        }
    }

    /// Number of fragments absorbed so far
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    /// Number of distinct components kept
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Keys of the kept components in first-seen order
    pub fn keys(&self) -> Vec<&str> {
        self.components.keys().map(String::as_str).collect()
    }

    /// Absorb a fragment read from disk
    pub fn absorb_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read(path).map_err(|e| Error::io("read", path, e))?;
        self.absorb(&path.display().to_string(), &content)
    }

    /// Absorb one fragment document
    ///
    /// Every child of the root's first `components` element is a component;
    /// its key is the text of its `role` child followed by the text of its
    /// `role-hint` child (empty when absent). Later duplicates are dropped.
    pub fn absorb(&mut self, source_name: &str, content: &[u8]) -> Result<()> {
        let fail = |message: String| Error::Registry {
            source_name: source_name.to_string(),
            message,
        };

        let text = std::str::from_utf8(content).map_err(|e| fail(e.to_string()))?;
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        // number of currently open elements
        let mut depth = 0usize;
        let mut components_seen = false;
        let mut in_components = false;
        let mut pending: Option<PendingComponent> = None;

        loop {
            let event = reader.read_event().map_err(|e| fail(e.to_string()))?;
            match event {
                Event::Eof => break,
                Event::Start(start) => {
                    depth += 1;
                    match depth {
                        2 if !components_seen && start.name().as_ref() == b"components" => {
                            components_seen = true;
                            in_components = true;
                        }
                        3 if in_components => pending = Some(PendingComponent::default()),
                        4 => {
                            if let Some(component) = pending.as_mut() {
                                component.field = match start.name().as_ref() {
                                    b"role" => Some(Field::Role),
                                    b"role-hint" => Some(Field::RoleHint),
                                    _ => None,
                                };
                            }
                        }
                        _ => {}
                    }
                    if let Some(component) = pending.as_mut() {
                        component.events.push(Event::Start(start.into_owned()));
                    }
                }
                Event::Empty(empty) => {
                    let level = depth + 1;
                    if level == 3 && in_components {
                        return Err(fail(format!(
                            "component <{}/> has no role",
                            String::from_utf8_lossy(empty.name().as_ref())
                        )));
                    }
                    if let Some(component) = pending.as_mut() {
                        if level == 4 {
                            match empty.name().as_ref() {
                                b"role" => {
                                    component.role.get_or_insert_with(String::new);
                                }
                                b"role-hint" => {
                                    component.role_hint.get_or_insert_with(String::new);
                                }
                                _ => {}
                            }
                        }
                        component.events.push(Event::Empty(empty.into_owned()));
                    }
                }
                Event::Text(text) => {
                    if let Some(component) = pending.as_mut() {
                        let unescaped = text.unescape().map_err(|e| fail(e.to_string()))?;
                        component.append_text(&unescaped);
                        component.events.push(Event::Text(text.into_owned()));
                    }
                }
                Event::CData(data) => {
                    if let Some(component) = pending.as_mut() {
                        component.append_text(&String::from_utf8_lossy(&data));
                        component.events.push(Event::CData(data.into_owned()));
                    }
                }
                Event::End(end) => {
                    if let Some(component) = pending.as_mut() {
                        component.events.push(Event::End(end.into_owned()));
                    }
                    match depth {
                        4 => {
                            if let Some(component) = pending.as_mut() {
                                component.field = None;
                            }
                        }
                        3 => {
                            if let Some(component) = pending.take() {
                                self.keep(component, &fail)?;
                            }
                        }
                        2 => in_components = false,
                        _ => {}
                    }
                    depth = depth.saturating_sub(1);
                }
                // declarations, comments and processing instructions are dropped
                _ => {}
            }
        }

        self.fragments += 1;
        Ok(())
    }

    fn keep(
        &mut self,
        component: PendingComponent,
        fail: &impl Fn(String) -> Error,
    ) -> Result<()> {
        let Some(role) = component.role else {
            return Err(fail("component without a role element".to_string()));
        };
        let key = format!(
            "{}{}",
            role.trim(),
            component.role_hint.as_deref().unwrap_or_default().trim()
        );

        if self.components.contains_key(&key) {
            debug!("Skipping duplicate component {}", key);
        } else {
            self.components.insert(key, component.events);
        }
        Ok(())
    }

    /// Render the merged `component-set` document, if anything was absorbed
    pub fn render(&self) -> Result<Option<Vec<u8>>> {
        if self.fragments == 0 {
            return Ok(None);
        }

        let fail = |e: &dyn std::fmt::Display| Error::Registry {
            source_name: COMPONENTS_XML_PATH.to_string(),
            message: e.to_string(),
        };

        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| fail(&e))?;
        writer
            .write_event(Event::Start(BytesStart::new("component-set")))
            .map_err(|e| fail(&e))?;
        writer
            .write_event(Event::Start(BytesStart::new("components")))
            .map_err(|e| fail(&e))?;
        for events in self.components.values() {
            for event in events {
                writer.write_event(event.clone()).map_err(|e| fail(&e))?;
            }
        }
        writer
            .write_event(Event::End(BytesEnd::new("components")))
            .map_err(|e| fail(&e))?;
        writer
            .write_event(Event::End(BytesEnd::new("component-set")))
            .map_err(|e| fail(&e))?;

        Ok(Some(writer.into_inner()))
    }

    /// Write the merged document into the archive and discard the registry
    ///
    /// Returns whether an entry was added. Nothing is added when no
    /// fragment was ever absorbed.
    pub fn finalize(self, archiver: &mut dyn Archiver) -> Result<bool> {
        match self.render()? {
            Some(document) => {
                debug!(
                    "Merged {} component(s) from {} fragment(s) into {}",
                    self.components.len(),
                    self.fragments,
                    COMPONENTS_XML_PATH
                );
                archiver.add_content(COMPONENTS_XML_PATH, document, None)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl FileSelector for ComponentRegistry {
    fn is_selected(&mut self, entry_name: &str, source: &Path) -> Result<bool> {
        match Self::classify(entry_name) {
            Disposition::PassThrough => Ok(true),
            Disposition::Absorb => {
                debug!("Absorbing component registry fragment {}", source.display());
                self.absorb_file(source)?;
                Ok(false)
            }
        }
    }
}
