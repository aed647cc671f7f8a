//! Build variants
//!
//! Exactly one variant is active per invocation. It selects the
//! variant-scoped build tree and the variant flag set; module interface
//! artifacts are not variant-scoped.

/// Build variant selecting flags and the build tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    /// Debug build (default)
    #[default]
    Debug,
    /// Optimized build
    Release,
}

impl Variant {
    /// Directory name of the variant build tree
    pub fn dir_name(&self) -> &'static str {
        match self {
            Variant::Debug => "debug",
            Variant::Release => "release",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

impl From<&str> for Variant {
    fn from(s: &str) -> Self {
        match s {
            "release" => Variant::Release,
            _ => Variant::Debug,
        }
    }
}
