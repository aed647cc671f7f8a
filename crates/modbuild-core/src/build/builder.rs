//! Build orchestration
//!
//! Walks the requested targets over the validated primary table:
//! - resolves each primary's pending work at most once per run
//!   (the checked set),
//! - builds dependencies before dependents and propagates interface
//!   regeneration to dependents (the updated set),
//! - relinks a target when its executable is missing or anything was
//!   updated earlier in the run,
//! - precompiles system headers first, then standalone groups, then targets.
//!
//! The first toolchain failure aborts the run; artifacts already produced
//! stay in place and the next run resumes from them.

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};

use crate::layout::Layout;
use crate::manifest::{Manifest, Primary, StandaloneGroup, Target};
use crate::stale::needs_rebuild;
use crate::toolchain::Toolchain;
use crate::{Error, Result};

use super::resolve::{resolve_primary, CompileTask};

/// Result of a build run
#[derive(Debug, Default)]
pub struct BuildResult {
    /// System headers precompiled this run
    pub headers_precompiled: Vec<String>,
    /// Sources compiled, in execution order
    pub compiled: Vec<Utf8PathBuf>,
    /// Primaries that had files compiled, in completion order
    pub updated_primaries: Vec<String>,
    /// Targets linked this run
    pub linked_targets: Vec<String>,
    /// Standalone executables built this run
    pub standalone_built: Vec<Utf8PathBuf>,
}

impl BuildResult {
    /// True when the run issued no toolchain commands at all
    pub fn is_noop(&self) -> bool {
        self.headers_precompiled.is_empty()
            && self.compiled.is_empty()
            && self.linked_targets.is_empty()
            && self.standalone_built.is_empty()
    }
}

/// Work a build run would perform, without performing it
#[derive(Debug, Default)]
pub struct BuildPlan {
    /// System headers that would be precompiled
    pub headers: Vec<String>,
    /// Primary compile tasks that would run
    pub tasks: Vec<CompileTask>,
    /// Standalone executables that would be rebuilt
    pub standalone: Vec<Utf8PathBuf>,
    /// Targets that would be linked
    pub links: Vec<String>,
}

impl BuildPlan {
    /// True when a build run would issue no toolchain commands
    pub fn is_noop(&self) -> bool {
        self.headers.is_empty()
            && self.tasks.is_empty()
            && self.standalone.is_empty()
            && self.links.is_empty()
    }
}

/// Incremental builder for one manifest, layout and toolchain.
///
/// The checked and updated sets live exactly as long as one run, which is
/// why [`run`](Builder::run) consumes the builder.
pub struct Builder<'a> {
    manifest: &'a Manifest,
    layout: &'a Layout,
    toolchain: &'a Toolchain,
    checked: HashSet<String>,
    updated: HashSet<String>,
    result: BuildResult,
}

impl<'a> Builder<'a> {
    /// Create a builder for one run
    pub fn new(manifest: &'a Manifest, layout: &'a Layout, toolchain: &'a Toolchain) -> Self {
        Self {
            manifest,
            layout,
            toolchain,
            checked: HashSet::new(),
            updated: HashSet::new(),
            result: BuildResult::default(),
        }
    }

    /// Execute the build.
    ///
    /// An empty request builds everything declared; otherwise each name
    /// must match a target or standalone group, checked before any work.
    pub fn run(mut self, requested: &[String]) -> Result<BuildResult> {
        let (groups, targets) = self.select(requested)?;

        self.precompile_system_headers()?;

        for group in groups {
            self.build_standalone_group(group)?;
        }

        for target in targets {
            self.build_target(target)?;
        }

        Ok(self.result)
    }

    /// Compute the work a run would perform, without executing anything
    pub fn plan(&self, requested: &[String]) -> Result<BuildPlan> {
        let (groups, targets) = self.select(requested)?;
        let mut plan = BuildPlan::default();

        for header in &self.manifest.system_headers {
            if !self.layout.system_header_interface_path(header).exists() {
                plan.headers.push(header.clone());
            }
        }

        for group in groups {
            for file in &group.files {
                let source = self.layout.source_path(&group.name, file);
                let executable = self.layout.standalone_executable_path(file);
                if needs_rebuild(&source, &executable)? {
                    plan.standalone.push(executable);
                }
            }
        }

        // Mirrors the run loop: targets in order, each link decided with
        // the updated set as it stands at that target's turn
        let mut checked: HashSet<String> = HashSet::new();
        let mut would_update: HashSet<String> = HashSet::new();
        for target in targets {
            for name in &target.primaries {
                if !checked.insert(name.clone()) {
                    continue;
                }
                let primary = self.primary(name)?;
                let tasks = self.tasks_with_propagation(primary, &would_update)?;
                if !tasks.is_empty() {
                    would_update.insert(name.clone());
                    plan.tasks.extend(tasks);
                }
            }

            let executable = self.layout.executable_path(&target.name);
            if !executable.exists() || !would_update.is_empty() {
                plan.links.push(target.name.clone());
            }
        }

        Ok(plan)
    }

    /// Split a request into standalone groups and targets, in declaration
    /// order. Unknown names fail here, before any work starts.
    fn select(
        &self,
        requested: &[String],
    ) -> Result<(Vec<&'a StandaloneGroup>, Vec<&'a Target>)> {
        if requested.is_empty() {
            return Ok((
                self.manifest.standalone.iter().collect(),
                self.manifest.targets.iter().collect(),
            ));
        }

        let mut groups = Vec::new();
        let mut targets = Vec::new();
        for name in requested {
            if let Some(target) = self.manifest.target(name) {
                targets.push(target);
            } else if let Some(group) = self.manifest.standalone_group(name) {
                groups.push(group);
            } else {
                return Err(Error::unknown_target(name));
            }
        }
        Ok((groups, targets))
    }

    fn primary(&self, name: &str) -> Result<&'a Primary> {
        self.manifest.primary(name).ok_or_else(|| {
            Error::manifest(
                format!("primary '{name}' is not declared"),
                "Check the [[primary]] tables in modbuild.toml",
            )
        })
    }

    /// Resolve a primary's pending work, at most once per run. A second
    /// visit, from whichever path, returns an empty list.
    fn pending_tasks(&mut self, name: &str) -> Result<Vec<CompileTask>> {
        if self.checked.contains(name) {
            return Ok(Vec::new());
        }

        let primary = self.primary(name)?;
        let tasks = self.tasks_with_propagation(primary, &self.updated)?;

        self.checked.insert(name.to_string());
        Ok(tasks)
    }

    /// Resolver output, widened to the full member list when a module
    /// dependency had its interface regenerated earlier in this run:
    /// every object of the dependent was compiled against the old
    /// interface and has to be redone.
    fn tasks_with_propagation(
        &self,
        primary: &Primary,
        updated: &HashSet<String>,
    ) -> Result<Vec<CompileTask>> {
        let tasks = resolve_primary(primary, self.layout)?;

        let dep_regenerated = primary.deps.iter().any(|dep| {
            updated.contains(dep) && self.manifest.primary(dep).is_some_and(|p| p.module)
        });
        if !dep_regenerated {
            return Ok(tasks);
        }

        tracing::debug!(
            "Rebuilding {} in full (module dependency updated)",
            primary.name
        );
        Ok(primary
            .files
            .iter()
            .map(|file| CompileTask {
                source: self.layout.source_path(&primary.name, file),
                object: self.layout.object_path(&primary.name, file),
            })
            .collect())
    }

    /// Compile a primary's pending tasks, dependencies first
    fn build_primary(&mut self, name: &str, tasks: Vec<CompileTask>) -> Result<()> {
        if self.updated.contains(name) {
            return Ok(());
        }

        let primary = self.primary(name)?;
        for dep in &primary.deps {
            let dep_tasks = self.pending_tasks(dep)?;
            if !dep_tasks.is_empty() {
                self.build_primary(dep, dep_tasks)?;
            }
        }

        tracing::info!("Building {} ({})", name, self.layout.variant());
        for task in &tasks {
            self.toolchain.compile(&task.source, &task.object)?;
            self.result.compiled.push(task.source.clone());
        }

        self.updated.insert(name.to_string());
        self.result.updated_primaries.push(name.to_string());
        Ok(())
    }

    fn build_target(&mut self, target: &Target) -> Result<()> {
        for name in &target.primaries {
            let tasks = self.pending_tasks(name)?;
            if !tasks.is_empty() {
                self.build_primary(name, tasks)?;
            }
        }

        let executable = self.layout.executable_path(&target.name);
        if !executable.exists() || !self.updated.is_empty() {
            self.link_target(target, &executable)?;
        } else {
            tracing::info!("Skipping {} (up to date)", target.name);
        }
        Ok(())
    }

    fn link_target(&mut self, target: &Target, executable: &Utf8Path) -> Result<()> {
        let mut objects = Vec::new();
        for name in &target.primaries {
            let primary = self.primary(name)?;
            for file in &primary.files {
                objects.push(self.layout.object_path(name, file));
            }
        }

        tracing::info!("Linking {} ({})", target.name, self.layout.variant());
        self.toolchain.link(&objects, executable)?;
        self.result.linked_targets.push(target.name.clone());
        Ok(())
    }

    /// Precompile declared system headers that have no interface artifact
    /// yet. Existence only, no timestamps, no variant flags.
    fn precompile_system_headers(&mut self) -> Result<()> {
        for header in &self.manifest.system_headers {
            let artifact = self.layout.system_header_interface_path(header);
            if artifact.exists() {
                continue;
            }
            tracing::info!("Precompiling system header {}", header);
            self.toolchain.precompile_system_header(header)?;
            self.result.headers_precompiled.push(header.clone());
        }
        Ok(())
    }

    /// Build every member of a standalone group whose executable is stale
    fn build_standalone_group(&mut self, group: &StandaloneGroup) -> Result<()> {
        for file in &group.files {
            let source = self.layout.source_path(&group.name, file);
            let executable = self.layout.standalone_executable_path(file);
            if needs_rebuild(&source, &executable)? {
                tracing::info!("Building standalone {}", executable);
                self.toolchain.build_standalone(&source, &executable)?;
                self.result.standalone_built.push(executable);
            }
        }
        Ok(())
    }
}
