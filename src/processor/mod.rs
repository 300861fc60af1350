// src/processor/mod.rs

//! Assembly processing
//!
//! For every requested format of an assembly the processor opens a fresh
//! archiver and component registry, adds content in a fixed order
//! (dependency sets, file sets, single files, then module file sets), lets
//! the registry write its merged document, and writes the archive to
//! `output_directory/<distribution name>.<format>`.
//!
//! The whole assembly is validated first, so configuration errors never
//! leave a half-written archive behind. A content error aborts the format
//! being built; archives finished for earlier formats stay on disk and
//! remain attached.

mod dependency_sets;
mod file_items;
mod file_sets;
mod modules;

pub use modules::module_file_sets;

use crate::archiver::{Archiver, ArchiverRegistry, ArchiverSettings, FileSelector};
use crate::config::{AssemblerConfig, BuildRequest};
use crate::descriptor;
use crate::error::{Error, Result, parse_mode};
use crate::interpolation::{TemplateContext, validate_template};
use crate::model::{Artifact, Assembly, Project};
use crate::paths;
use crate::registry::ComponentRegistry;
use crate::scanner::DirectoryScanner;
use crate::selection::ArtifactSelector;
use crate::transform::{ContentFilter, LineEnding};
use crate::unpack::Unpacker;
use serde::Serialize;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// An archive reported back to the host build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachedArtifact {
    /// Format tag, also the file extension
    pub format: String,
    /// Assembly id, configured classifier, or none
    pub classifier: Option<String>,
    pub file: PathBuf,
}

/// Host callback receiving each finished archive
pub trait ArtifactAttacher {
    fn attach(&mut self, artifact: AttachedArtifact);
}

impl ArtifactAttacher for Vec<AttachedArtifact> {
    fn attach(&mut self, artifact: AttachedArtifact) {
        self.push(artifact);
    }
}

/// Builds archives for assemblies of one project
pub struct AssemblyProcessor<'a> {
    config: &'a AssemblerConfig,
    project: &'a Project,
    artifacts: &'a [Artifact],
    reactor: &'a [Project],
    archivers: ArchiverRegistry,
    settings: ArchiverSettings,
    final_name: String,
}

impl<'a> AssemblyProcessor<'a> {
    pub fn new(config: &'a AssemblerConfig, project: &'a Project) -> Self {
        Self {
            config,
            project,
            artifacts: &[],
            reactor: &[],
            archivers: ArchiverRegistry::default(),
            settings: config.archiver_settings(project),
            final_name: config.final_name_for(project),
        }
    }

    /// Resolved dependencies available to dependency sets
    pub fn with_artifacts(mut self, artifacts: &'a [Artifact]) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Reactor projects available to module references
    pub fn with_reactor(mut self, reactor: &'a [Project]) -> Self {
        self.reactor = reactor;
        self
    }

    pub fn with_archivers(mut self, archivers: ArchiverRegistry) -> Self {
        self.archivers = archivers;
        self
    }

    pub fn archivers(&self) -> &ArchiverRegistry {
        &self.archivers
    }

    pub fn final_name(&self) -> &str {
        &self.final_name
    }

    /// Check every format, mode, pattern and template of an assembly
    pub fn validate(&self, assembly: &Assembly) -> Result<()> {
        for format in &assembly.formats {
            self.archivers.resolve(format)?;
        }

        for set in &assembly.dependency_sets {
            parse_mode(&set.directory_mode)?;
            parse_mode(&set.file_mode)?;
            ArtifactSelector::for_set(set)?;
            validate_template(&set.output_file_name_mapping)?;
            validate_template(set.output_directory.as_deref().unwrap_or_default())?;
        }
        for set in &assembly.file_sets {
            parse_mode(&set.directory_mode)?;
            parse_mode(&set.file_mode)?;
            LineEnding::terminator_for(set.line_ending.as_deref())?;
            DirectoryScanner::with_patterns(&set.includes, &set.excludes)?;
            validate_template(set.output_directory.as_deref().unwrap_or_default())?;
        }
        for item in &assembly.files {
            parse_mode(&item.file_mode)?;
            LineEnding::terminator_for(item.line_ending.as_deref())?;
            validate_template(item.output_directory.as_deref().unwrap_or_default())?;
        }
        Ok(())
    }

    /// Path of the archive for one format
    pub fn destination(&self, assembly: &Assembly, format: &str) -> PathBuf {
        let name = paths::distribution_name(
            &self.final_name,
            &assembly.id,
            self.config.append_assembly_id,
            self.config.classifier.as_deref(),
        );
        self.project
            .resolve(&self.config.output_directory)
            .join(format!("{}.{}", name, format))
    }

    fn classifier(&self, assembly: &Assembly) -> Option<String> {
        if self.config.append_assembly_id && !assembly.id.is_empty() {
            Some(assembly.id.clone())
        } else {
            self.config.classifier.clone().filter(|c| !c.is_empty())
        }
    }

    /// The assembly with its component descriptors merged in
    ///
    /// Component files are read relative to the project base directory.
    /// An assembly without component references is returned as is.
    pub fn expanded<'s>(&self, assembly: &'s Assembly) -> Result<Cow<'s, Assembly>> {
        if assembly.component_descriptors.is_empty() {
            return Ok(Cow::Borrowed(assembly));
        }
        descriptor::expand_components(assembly.clone(), &self.project.basedir).map(Cow::Owned)
    }

    /// Build every format of an assembly, attaching each archive as it is
    /// finished
    pub fn create_archives(
        &self,
        assembly: &Assembly,
        attacher: &mut dyn ArtifactAttacher,
    ) -> Result<Vec<PathBuf>> {
        let assembly = self.expanded(assembly)?;
        let assembly = &*assembly;
        self.validate(assembly)?;

        let mut created = Vec::with_capacity(assembly.formats.len());
        for format in &assembly.formats {
            let file = self.create_archive(assembly, format)?;
            attacher.attach(AttachedArtifact {
                format: format.clone(),
                classifier: self.classifier(assembly),
                file: file.clone(),
            });
            created.push(file);
        }
        Ok(created)
    }

    /// Build one format of an assembly
    pub fn create_archive(&self, assembly: &Assembly, format: &str) -> Result<PathBuf> {
        let assembly = self.expanded(assembly)?;
        let assembly = &*assembly;
        let archiver = self.archivers.create(format, &self.settings)?;
        let dest = self.destination(assembly, format);
        info!("Building {} archive {}", format, dest.display());

        let mut build = ArchiveBuild::new(self, assembly, archiver)?;

        for set in &assembly.dependency_sets {
            dependency_sets::add_dependency_set(&mut build, set)?;
        }
        for set in &assembly.file_sets {
            file_sets::add_file_set(&mut build, set, None)?;
        }
        for item in &assembly.files {
            file_items::add_file_item(&mut build, item)?;
        }
        for (module, set) in module_file_sets(self.project, self.reactor, &assembly.modules) {
            file_sets::add_file_set(&mut build, &set, Some(module))?;
        }

        let file = build.finish(&dest)?;
        info!("Created {}", file.display());
        Ok(file)
    }
}

/// State of one (assembly, format) archive build
pub(crate) struct ArchiveBuild<'p> {
    processor: &'p AssemblyProcessor<'p>,
    assembly: &'p Assembly,
    context: TemplateContext<'p>,
    archiver: Box<dyn Archiver>,
    registry: ComponentRegistry,
    unpacker: Unpacker,
    filter: Option<ContentFilter>,
    scratch: TempDir,
    scratch_files: usize,
}

impl<'p> ArchiveBuild<'p> {
    fn new(
        processor: &'p AssemblyProcessor<'p>,
        assembly: &'p Assembly,
        archiver: Box<dyn Archiver>,
    ) -> Result<Self> {
        let config = processor.config;
        let project = processor.project;
        let temp_root = project.resolve(&config.temp_root);
        fs::create_dir_all(&temp_root)
            .map_err(|e| Error::io("create directory", &temp_root, e))?;
        let scratch = tempfile::Builder::new()
            .prefix(&format!("{}-", assembly.id))
            .tempdir_in(&temp_root)
            .map_err(|e| Error::io("create scratch directory", &temp_root, e))?;

        let context = TemplateContext::new(&processor.final_name, project)
            .with_execution_properties(&config.execution_properties)
            .with_command_line_properties(&config.command_line_properties)
            .with_environment(&config.environment);

        Ok(Self {
            processor,
            assembly,
            context,
            archiver,
            registry: ComponentRegistry::new(),
            unpacker: Unpacker::new(project.resolve(&config.work_directory)),
            filter: None,
            scratch,
            scratch_files: 0,
        })
    }

    fn project(&self) -> &'p Project {
        self.processor.project
    }

    fn config(&self) -> &'p AssemblerConfig {
        self.processor.config
    }

    fn include_base_directory(&self) -> bool {
        self.assembly.include_base_directory
    }

    /// Jar-style archives drop signing metadata from unpacked dependencies
    fn strips_signatures(&self) -> bool {
        matches!(self.archiver.format(), "jar" | "war" | "ear")
    }

    fn set_default_modes(&mut self, directory_mode: u32, file_mode: u32) {
        debug!(
            "Default modes: directories {:o}, files {:o}",
            directory_mode, file_mode
        );
        self.archiver.set_default_modes(directory_mode, file_mode);
    }

    /// Fresh path inside the build's scratch directory
    fn scratch_path(&mut self, name: &str) -> PathBuf {
        self.scratch_files += 1;
        self.scratch
            .path()
            .join(self.scratch_files.to_string())
            .join(name)
    }

    /// Content filter, created on first use
    fn filter(&mut self) -> Result<&ContentFilter> {
        match self.filter {
            Some(ref filter) => Ok(filter),
            None => {
                let config = self.processor.config;
                let filter =
                    ContentFilter::new(self.project(), &config.execution_properties, &config.filters)?;
                Ok(self.filter.insert(filter))
            }
        }
    }

    /// Add one file, routing registry fragments to the registry
    fn add_file(&mut self, source: &Path, entry_name: &str, mode: Option<u32>) -> Result<()> {
        if self.registry.is_selected(entry_name, source)? {
            self.archiver.add_file(source, entry_name, mode)?;
        }
        Ok(())
    }

    /// Add a scanned tree, routing registry fragments to the registry
    fn add_tree(&mut self, root: &Path, prefix: &str, scanner: &DirectoryScanner) -> Result<()> {
        self.archiver
            .add_scanned(root, prefix, scanner, &mut self.registry)
    }

    fn finish(mut self, dest: &Path) -> Result<PathBuf> {
        self.registry.finalize(self.archiver.as_mut())?;
        self.archiver.set_dest_file(dest);
        // scratch files are still referenced here and removed on drop
        self.archiver.create_archive()
    }
}

/// Read every assembly of a request and build all of their archives
pub fn run(request: &BuildRequest, attacher: &mut dyn ArtifactAttacher) -> Result<Vec<PathBuf>> {
    let assemblies = descriptor::read_assemblies(request)?;
    let processor = AssemblyProcessor::new(&request.config, &request.project)
        .with_artifacts(&request.artifacts)
        .with_reactor(&request.reactor);

    for assembly in &assemblies {
        processor.validate(assembly)?;
    }

    let mut created = Vec::new();
    for assembly in &assemblies {
        created.extend(processor.create_archives(assembly, attacher)?);
    }
    Ok(created)
}
