//! Manifest parsing and validation
//!
//! This module handles parsing of `modbuild.toml` and `modbuild.local.toml`
//! files: the primary/target declaration tables, the directory layout, and
//! the toolchain settings. The manifest is validated at load time so the
//! build walk only ever sees a well-formed, acyclic table.

use std::collections::{HashMap, HashSet};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::variant::Variant;
use crate::{graph, Error, Result};

/// Main manifest structure for a modbuild project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Directory layout settings
    pub layout: LayoutConfig,

    /// Toolchain settings
    pub toolchain: ToolchainConfig,

    /// Standard headers to precompile into the interface cache
    pub system_headers: Vec<String>,

    /// pkg-config library names resolved at startup
    pub libraries: Vec<String>,

    /// Compilation groups
    #[serde(rename = "primary")]
    pub primaries: Vec<Primary>,

    /// Linked executables
    #[serde(rename = "target")]
    pub targets: Vec<Target>,

    /// Single-file executables built outside the primary table
    #[serde(rename = "standalone")]
    pub standalone: Vec<StandaloneGroup>,
}

/// A named group of source files compiled together
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Primary {
    /// Primary name; also the source subdirectory under `source_dir`
    pub name: String,

    /// Whether the primary produces a module interface artifact
    #[serde(default)]
    pub module: bool,

    /// Names of primaries this one depends on
    #[serde(default)]
    pub deps: Vec<String>,

    /// Member source files, in compile order
    #[serde(default)]
    pub files: Vec<String>,
}

impl Primary {
    /// The member file that produces the module interface: the one whose
    /// stem equals the primary's name. `None` for non-module primaries.
    pub fn interface_file(&self) -> Option<&str> {
        if !self.module {
            return None;
        }
        self.files
            .iter()
            .map(String::as_str)
            .find(|f| Utf8Path::new(f).file_stem() == Some(self.name.as_str()))
    }
}

/// An executable linked from the objects of its listed primaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Executable name under the variant build tree
    pub name: String,

    /// Constituent primaries: the target's own primary plus its transitive
    /// dependencies, flattened, dependencies first
    #[serde(default)]
    pub primaries: Vec<String>,
}

/// A group of sources each compiled and linked to its own executable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandaloneGroup {
    /// Group name; also the source subdirectory under `source_dir`
    pub name: String,

    /// Member source files
    #[serde(default)]
    pub files: Vec<String>,
}

/// Directory layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Source tree, one subdirectory per primary (default: "src")
    pub source_dir: Utf8PathBuf,

    /// Header directory passed to the compiler via -I (default: "inc")
    pub include_dir: Utf8PathBuf,

    /// Build artifacts directory, one subtree per variant (default: "build")
    pub build_dir: Utf8PathBuf,

    /// Module interface cache, shared by all variants (default: "gcm.cache")
    pub interface_dir: Utf8PathBuf,

    /// Subtree of the interface cache where the compiler writes
    /// system-header interfaces, e.g. "usr/include/c++/14.1.1"
    /// (default: empty, meaning the cache root)
    pub system_header_subdir: Utf8PathBuf,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            source_dir: Utf8PathBuf::from("src"),
            include_dir: Utf8PathBuf::from("inc"),
            build_dir: Utf8PathBuf::from("build"),
            interface_dir: Utf8PathBuf::from("gcm.cache"),
            system_header_subdir: Utf8PathBuf::new(),
        }
    }
}

/// Toolchain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Compiler driver (default: "g++")
    pub compiler: String,

    /// Tool used to resolve library flags (default: "pkg-config")
    pub pkg_config: String,

    /// Flags passed on every invocation, compile and link alike
    pub driver_flags: Vec<String>,

    /// Compile flags (default: C++23 with modules)
    pub cxx_flags: Vec<String>,

    /// Extra compile flags for the debug variant
    pub debug_flags: Vec<String>,

    /// Extra compile flags for the release variant
    pub release_flags: Vec<String>,

    /// Link flags, before the resolved library flags
    pub ld_flags: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: "g++".to_string(),
            pkg_config: "pkg-config".to_string(),
            driver_flags: vec!["-fdiagnostics-color=always".to_string()],
            cxx_flags: vec!["-std=c++23".to_string(), "-fmodules-ts".to_string()],
            debug_flags: vec!["-g".to_string(), "-DDEBUG".to_string()],
            release_flags: vec!["-DNDEBUG".to_string()],
            ld_flags: Vec::new(),
        }
    }
}

impl ToolchainConfig {
    /// Flags selected by the active variant
    pub fn variant_flags(&self, variant: Variant) -> &[String] {
        match variant {
            Variant::Debug => &self.debug_flags,
            Variant::Release => &self.release_flags,
        }
    }
}

impl Manifest {
    /// Load the manifest from a project directory.
    ///
    /// This reads `modbuild.toml` and merges `modbuild.local.toml` over it
    /// if present. A missing `modbuild.toml` is an error: the manifest is
    /// the build definition, there is nothing to fall back to.
    pub fn load(root: &Utf8Path) -> Result<Self> {
        let manifest_path = root.join("modbuild.toml");
        let local_path = root.join("modbuild.local.toml");

        if !manifest_path.exists() {
            return Err(Error::manifest(
                format!("no modbuild.toml found in {}", root),
                "Run modbuild from the project root or point -C at it",
            ));
        }

        let content = std::fs::read_to_string(&manifest_path)?;
        let base = toml::from_str::<toml::Value>(&content)?;

        let merged = if local_path.exists() {
            let local_content = std::fs::read_to_string(&local_path)?;
            let local = toml::from_str::<toml::Value>(&local_content)?;
            merge_toml_values(base, local)
        } else {
            base
        };

        let manifest: Manifest = merged.try_into()?;
        manifest.validate()?;

        Ok(manifest)
    }

    /// Parse and validate a manifest from a string (for testing)
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Look up a primary by name
    pub fn primary(&self, name: &str) -> Option<&Primary> {
        self.primaries.iter().find(|p| p.name == name)
    }

    /// Look up a target by name
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Look up a standalone group by name
    pub fn standalone_group(&self, name: &str) -> Option<&StandaloneGroup> {
        self.standalone.iter().find(|g| g.name == name)
    }

    /// Check the declaration tables for structural problems.
    ///
    /// Everything here is rejected before any filesystem or toolchain work:
    /// duplicate or dangling names, module primaries without an interface
    /// file, dependency cycles, and target lists that are not flattened in
    /// dependency order.
    pub fn validate(&self) -> Result<()> {
        let mut names: HashSet<&str> = HashSet::new();
        for primary in &self.primaries {
            if !names.insert(&primary.name) {
                return Err(Error::manifest(
                    format!("primary '{}' is declared more than once", primary.name),
                    "Primary names must be unique",
                ));
            }
            if primary.files.is_empty() {
                return Err(Error::manifest(
                    format!("primary '{}' has no files", primary.name),
                    "List the member source files under `files`",
                ));
            }
            if primary.module && primary.interface_file().is_none() {
                return Err(Error::manifest(
                    format!(
                        "module primary '{}' has no interface file",
                        primary.name
                    ),
                    format!(
                        "Add a file named '{}.<ext>' to its files or set module = false",
                        primary.name
                    ),
                ));
            }
        }

        for primary in &self.primaries {
            for dep in &primary.deps {
                if !names.contains(dep.as_str()) {
                    return Err(Error::manifest(
                        format!(
                            "primary '{}' depends on undeclared primary '{}'",
                            primary.name, dep
                        ),
                        "Every deps entry must name a declared primary",
                    ));
                }
            }
        }

        graph::ensure_acyclic(&self.primaries)?;

        let primaries_by_name: HashMap<&str, &Primary> = self
            .primaries
            .iter()
            .map(|p| (p.name.as_str(), p))
            .collect();

        let mut target_names: HashSet<&str> = HashSet::new();
        for target in &self.targets {
            if !target_names.insert(&target.name) {
                return Err(Error::manifest(
                    format!("target '{}' is declared more than once", target.name),
                    "Target names must be unique",
                ));
            }
            if target.primaries.is_empty() {
                return Err(Error::manifest(
                    format!("target '{}' lists no primaries", target.name),
                    "A target links the objects of at least one primary",
                ));
            }
            let mut listed: HashSet<&str> = HashSet::new();
            for member in &target.primaries {
                let Some(primary) = primaries_by_name.get(member.as_str()) else {
                    return Err(Error::manifest(
                        format!(
                            "target '{}' lists undeclared primary '{}'",
                            target.name, member
                        ),
                        "Every target entry must name a declared primary",
                    ));
                };
                for dep in &primary.deps {
                    if !listed.contains(dep.as_str()) {
                        return Err(Error::manifest(
                            format!(
                                "target '{}': primary '{}' depends on '{}', which must be listed before it",
                                target.name, member, dep
                            ),
                            "Target lists are flattened in dependency order",
                        ));
                    }
                }
                listed.insert(member);
            }
        }

        let mut group_names: HashSet<&str> = HashSet::new();
        for group in &self.standalone {
            if !group_names.insert(&group.name) {
                return Err(Error::manifest(
                    format!("standalone group '{}' is declared more than once", group.name),
                    "Standalone group names must be unique",
                ));
            }
            if target_names.contains(group.name.as_str()) {
                return Err(Error::manifest(
                    format!(
                        "'{}' is declared as both a target and a standalone group",
                        group.name
                    ),
                    "Targets and standalone groups share the request namespace",
                ));
            }
        }

        Ok(())
    }
}

/// Merge two TOML values, local over base:
/// - Tables: recursively merged
/// - Arrays: local replaces base (not merged)
/// - Primitives: local overrides base
fn merge_toml_values(base: toml::Value, local: toml::Value) -> toml::Value {
    match (base, local) {
        (toml::Value::Table(mut base_table), toml::Value::Table(local_table)) => {
            for (key, local_value) in local_table {
                if let Some(base_value) = base_table.remove(&key) {
                    base_table.insert(key, merge_toml_values(base_value, local_value));
                } else {
                    base_table.insert(key, local_value);
                }
            }
            toml::Value::Table(base_table)
        }
        // For arrays and primitives, local completely overrides base
        (_, local) => local,
    }
}
