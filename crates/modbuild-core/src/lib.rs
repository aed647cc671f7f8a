//! modbuild-core - Core library for modbuild
//!
//! This crate provides the core functionality for modbuild, including:
//! - Manifest parsing, merging and validation (modbuild.toml)
//! - Dependency graph checking over the primary table
//! - Artifact layout (variant-scoped objects, shared module interfaces)
//! - Timestamp-based staleness decisions
//! - Toolchain command assembly and execution (compile, link,
//!   system header precompilation, pkg-config resolution)
//! - Incremental build orchestration over targets and standalone groups

pub mod build;
pub mod error;
pub mod graph;
pub mod layout;
pub mod manifest;
pub mod stale;
pub mod toolchain;
pub mod variant;

pub use error::{Error, Result};
