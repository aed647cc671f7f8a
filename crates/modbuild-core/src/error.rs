//! Error types for modbuild

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for modbuild operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for modbuild
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Manifest error
    #[error("Manifest error: {message}")]
    Manifest { message: String, help: String },

    /// Circular dependency in the primary table
    #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
    #[diagnostic(help("Check the deps declarations in modbuild.toml"))]
    CircularDependency {
        /// Primaries forming the cycle, first repeated at the end
        cycle: Vec<String>,
    },

    /// Requested target is not declared in the manifest
    #[error("Unknown target '{name}'")]
    #[diagnostic(help("Declare the target in modbuild.toml or check the spelling"))]
    UnknownTarget { name: String },

    /// Library flag resolution error
    #[error("Failed to resolve library '{name}': {message}")]
    #[diagnostic(help("Verify that pkg-config knows the library and is on PATH"))]
    Library { name: String, message: String },

    /// Toolchain invocation error
    #[error("Toolchain error: {message}")]
    Toolchain { message: String, help: String },
}

impl Error {
    /// Create a manifest error
    pub fn manifest(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Manifest {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a circular dependency error
    pub fn circular_dependency(cycle: Vec<String>) -> Self {
        Self::CircularDependency { cycle }
    }

    /// Create an unknown target error
    pub fn unknown_target(name: impl Into<String>) -> Self {
        Self::UnknownTarget { name: name.into() }
    }

    /// Create a library resolution error
    pub fn library(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Library {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a toolchain error
    pub fn toolchain(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Toolchain {
            message: message.into(),
            help: help.into(),
        }
    }
}
