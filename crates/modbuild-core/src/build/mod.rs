//! Incremental build execution
//!
//! Split in two layers:
//! - [`resolve_primary`] decides, per primary, which sources need
//!   recompiling,
//! - [`Builder`] walks targets over those decisions, memoizing per run
//!   and issuing toolchain commands.

mod builder;
mod resolve;

pub use builder::{BuildPlan, BuildResult, Builder};
pub use resolve::{resolve_primary, CompileTask};
