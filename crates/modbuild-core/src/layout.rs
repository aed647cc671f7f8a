//! Artifact layout
//!
//! Maps primaries, targets and system headers to the paths of their build
//! products. Objects and executables live under a per-variant tree; module
//! interface artifacts are keyed by primary name only and shared by all
//! variants, which is why they carry no variant component.

use camino::{Utf8Path, Utf8PathBuf};

use crate::manifest::{LayoutConfig, Manifest};
use crate::variant::Variant;
use crate::Result;

const OBJECT_SUBDIR: &str = "objects";

/// Resolved artifact paths for one project root and one variant
#[derive(Debug, Clone)]
pub struct Layout {
    variant: Variant,
    source_dir: Utf8PathBuf,
    include_dir: Utf8PathBuf,
    build_dir: Utf8PathBuf,
    variant_dir: Utf8PathBuf,
    object_dir: Utf8PathBuf,
    interface_dir: Utf8PathBuf,
    system_header_dir: Utf8PathBuf,
}

impl Layout {
    /// Resolve the layout for a project root and variant
    pub fn new(root: &Utf8Path, config: &LayoutConfig, variant: Variant) -> Self {
        let build_dir = root.join(&config.build_dir);
        let variant_dir = build_dir.join(variant.dir_name());
        let interface_dir = root.join(&config.interface_dir);
        let system_header_dir = if config.system_header_subdir.as_str().is_empty() {
            interface_dir.clone()
        } else {
            interface_dir.join(&config.system_header_subdir)
        };

        Self {
            variant,
            source_dir: root.join(&config.source_dir),
            include_dir: root.join(&config.include_dir),
            build_dir,
            object_dir: variant_dir.join(OBJECT_SUBDIR),
            variant_dir,
            interface_dir,
            system_header_dir,
        }
    }

    /// The active variant
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Header directory passed to the compiler via -I
    pub fn include_dir(&self) -> &Utf8Path {
        &self.include_dir
    }

    /// Root of the build tree, all variants
    pub fn build_dir(&self) -> &Utf8Path {
        &self.build_dir
    }

    /// Build tree of the active variant
    pub fn variant_dir(&self) -> &Utf8Path {
        &self.variant_dir
    }

    /// The module interface cache
    pub fn interface_dir(&self) -> &Utf8Path {
        &self.interface_dir
    }

    /// Source file of a primary or standalone group member
    pub fn source_path(&self, group: &str, file: &str) -> Utf8PathBuf {
        self.source_dir.join(group).join(file)
    }

    /// Object file compiled from a primary member, variant-scoped
    pub fn object_path(&self, primary: &str, file: &str) -> Utf8PathBuf {
        let stem = Utf8Path::new(file).file_stem().unwrap_or(file);
        self.object_dir.join(primary).join(format!("{}.o", stem))
    }

    /// Module interface artifact of a primary. Keyed by name only: every
    /// variant reads and writes the same path.
    pub fn interface_path(&self, primary: &str) -> Utf8PathBuf {
        self.interface_dir.join(format!("{}.gcm", primary))
    }

    /// Precompiled system header interface
    pub fn system_header_interface_path(&self, header: &str) -> Utf8PathBuf {
        self.system_header_dir.join(format!("{}.gcm", header))
    }

    /// Linked executable of a target, variant-scoped
    pub fn executable_path(&self, target: &str) -> Utf8PathBuf {
        self.variant_dir.join(target)
    }

    /// Executable built from a standalone source file, variant-scoped
    pub fn standalone_executable_path(&self, file: &str) -> Utf8PathBuf {
        let stem = Utf8Path::new(file).file_stem().unwrap_or(file);
        self.variant_dir.join(stem)
    }

    /// Create the variant tree, one object directory per primary, and the
    /// interface cache. Runs before any compilation.
    pub fn ensure_directories(&self, manifest: &Manifest) -> Result<()> {
        std::fs::create_dir_all(&self.variant_dir)?;
        std::fs::create_dir_all(&self.object_dir)?;
        for primary in &manifest.primaries {
            std::fs::create_dir_all(self.object_dir.join(&primary.name))?;
        }
        std::fs::create_dir_all(&self.system_header_dir)?;
        Ok(())
    }
}
