//! Foreign-key dependency graph and migration ordering.
//!
//! A table depends on every other migrated table it references. The
//! migration order is a depth-first topological sort of that graph:
//! dependencies are emitted before their dependents, and ties between
//! independent tables keep the enumeration order the graph was built from.

use std::collections::{HashMap, HashSet};

use crate::error::{MigrateError, Result};

use super::schema::ForeignKey;

/// Table → tables it depends on, restricted to one run's table set.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Tables in enumeration order.
    tables: Vec<String>,
    /// Dependencies per table, deduplicated, in first-seen order.
    dependencies: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

impl DependencyGraph {
    /// Build the graph for `tables` from each table's foreign keys.
    ///
    /// Self-references and references to tables outside `tables` do not
    /// constrain ordering and are dropped. Several keys pointing at the same
    /// table collapse into one dependency.
    pub fn build(tables: &[String], foreign_keys: &HashMap<String, Vec<ForeignKey>>) -> Self {
        let known: HashSet<&str> = tables.iter().map(String::as_str).collect();
        let mut dependencies = HashMap::with_capacity(tables.len());

        for table in tables {
            let mut deps: Vec<String> = Vec::new();
            for fk in foreign_keys.get(table).into_iter().flatten() {
                if fk.ref_table == *table || !known.contains(fk.ref_table.as_str()) {
                    continue;
                }
                if !deps.contains(&fk.ref_table) {
                    deps.push(fk.ref_table.clone());
                }
            }
            dependencies.insert(table.clone(), deps);
        }

        Self {
            tables: tables.to_vec(),
            dependencies,
        }
    }

    /// Tables that must be migrated before `table`.
    pub fn dependencies(&self, table: &str) -> &[String] {
        self.dependencies
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of dependency edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(Vec::len).sum()
    }

    /// Linearize the graph so every table follows all of its dependencies.
    ///
    /// Uses three-color marking with an explicit stack, visiting the same
    /// nodes in the same order a recursive depth-first search would. Reaching
    /// a table that is still in progress means the graph has a cycle; the
    /// error names that table and nothing is returned.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let mut marks: HashMap<&str, Mark> = self
            .tables
            .iter()
            .map(|t| (t.as_str(), Mark::Unvisited))
            .collect();
        let mut order: Vec<String> = Vec::with_capacity(self.tables.len());
        let mut stack: Vec<(&str, usize)> = Vec::new();

        for root in &self.tables {
            if marks.get(root.as_str()) != Some(&Mark::Unvisited) {
                continue;
            }
            marks.insert(root.as_str(), Mark::InProgress);
            stack.push((root.as_str(), 0));

            while let Some(top) = stack.last_mut() {
                let (table, next) = *top;
                let deps = self.dependencies(table);

                if next < deps.len() {
                    top.1 += 1;
                    let dep = deps[next].as_str();
                    match marks.get(dep).copied().unwrap_or(Mark::Done) {
                        Mark::InProgress => {
                            return Err(MigrateError::CycleDetected(dep.to_string()));
                        }
                        Mark::Done => {}
                        Mark::Unvisited => {
                            marks.insert(dep, Mark::InProgress);
                            stack.push((dep, 0));
                        }
                    }
                } else {
                    marks.insert(table, Mark::Done);
                    order.push(table.to_string());
                    stack.pop();
                }
            }
        }

        Ok(order)
    }
}

/// Build the graph and sort it in one step.
pub fn sort_tables_by_dependencies(
    tables: &[String],
    foreign_keys: &HashMap<String, Vec<ForeignKey>>,
) -> Result<Vec<String>> {
    DependencyGraph::build(tables, foreign_keys).topological_order()
}
