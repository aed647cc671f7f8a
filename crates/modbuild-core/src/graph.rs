//! Dependency graph validation
//!
//! The primary table must form a DAG. This is checked once at manifest load
//! time so the build walk can recurse through deps without cycle guards; a
//! violation is reported with the concrete cycle path instead of blowing the
//! stack at build time.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;

use crate::manifest::Primary;
use crate::{Error, Result};

/// Verify that the declared dependencies are acyclic.
///
/// Unknown dep names are ignored here; reference checking is the manifest's
/// job and runs before this.
pub fn ensure_acyclic(primaries: &[Primary]) -> Result<()> {
    // Edge from A to B means "B depends on A" (A must be built before B)
    let mut graph = DiGraph::<&str, ()>::new();
    let mut node_indices: HashMap<&str, _> = HashMap::new();

    for primary in primaries {
        let idx = graph.add_node(primary.name.as_str());
        node_indices.insert(primary.name.as_str(), idx);
    }

    for primary in primaries {
        let dependent_idx = node_indices[primary.name.as_str()];
        for dep in &primary.deps {
            if let Some(&dependency_idx) = node_indices.get(dep.as_str()) {
                graph.add_edge(dependency_idx, dependent_idx, ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_) => Ok(()),
        Err(cycle) => {
            let start = graph[cycle.node_id()];
            let cycle = trace_cycle(start, primaries)
                .unwrap_or_else(|| vec![start.to_string(), start.to_string()]);
            Err(Error::circular_dependency(cycle))
        }
    }
}

/// Walk the deps edges from a node known to sit on a cycle and return the
/// cycle path, first name repeated at the end.
fn trace_cycle(start: &str, primaries: &[Primary]) -> Option<Vec<String>> {
    let deps_by_name: HashMap<&str, &[String]> = primaries
        .iter()
        .map(|p| (p.name.as_str(), p.deps.as_slice()))
        .collect();

    let mut path: Vec<&str> = Vec::new();
    let mut on_path: HashSet<&str> = HashSet::new();
    let mut done: HashSet<&str> = HashSet::new();

    visit(start, &deps_by_name, &mut path, &mut on_path, &mut done)
}

fn visit<'a>(
    node: &'a str,
    deps_by_name: &HashMap<&'a str, &'a [String]>,
    path: &mut Vec<&'a str>,
    on_path: &mut HashSet<&'a str>,
    done: &mut HashSet<&'a str>,
) -> Option<Vec<String>> {
    if on_path.contains(node) {
        let pos = path.iter().position(|n| *n == node)?;
        let mut cycle: Vec<String> = path[pos..].iter().map(|n| n.to_string()).collect();
        cycle.push(node.to_string());
        return Some(cycle);
    }
    if done.contains(node) {
        return None;
    }

    path.push(node);
    on_path.insert(node);

    if let Some(deps) = deps_by_name.get(node) {
        for dep in deps.iter() {
            if let Some(found) =
                visit(dep.as_str(), deps_by_name, path, on_path, done)
            {
                return Some(found);
            }
        }
    }

    path.pop();
    on_path.remove(node);
    done.insert(node);

    None
}
