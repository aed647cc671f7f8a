//! Per-primary task resolution
//!
//! Decides which member files of a primary need recompiling. Holds no
//! state: memoization belongs to the builder, and calling the resolver
//! twice without intervening compilation yields the same list.

use camino::Utf8PathBuf;

use crate::layout::Layout;
use crate::manifest::Primary;
use crate::stale::needs_rebuild;
use crate::Result;

/// One pending compilation: a source file and its object destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileTask {
    /// Source file to compile
    pub source: Utf8PathBuf,
    /// Object file to produce
    pub object: Utf8PathBuf,
}

/// Collect the compile tasks a primary needs, in member order.
///
/// A file is scheduled when its object is stale. The interface file of a
/// module primary is additionally checked against the shared interface
/// artifact, but a file is never scheduled twice: at most one task per
/// file, whichever check fires first.
pub fn resolve_primary(primary: &Primary, layout: &Layout) -> Result<Vec<CompileTask>> {
    let mut tasks = Vec::new();
    let interface_file = primary.interface_file();

    for file in &primary.files {
        let source = layout.source_path(&primary.name, file);
        let object = layout.object_path(&primary.name, file);

        let mut wanted = needs_rebuild(&source, &object)?;
        if !wanted && interface_file == Some(file.as_str()) {
            wanted = needs_rebuild(&source, &layout.interface_path(&primary.name))?;
        }

        if wanted {
            tasks.push(CompileTask { source, object });
        }
    }

    Ok(tasks)
}
