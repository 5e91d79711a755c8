// src/dag/validate.rs

//! Structural validation of a DAG's dependency graph.
//!
//! Runs before every execution, not only at creation time, so a DAG edited
//! into a bad state never starts a run.

use std::collections::HashMap;

use tracing::warn;

use crate::dag::model::Dag;
use crate::errors::{ConduitError, Result};

/// Detect a cycle in the DAG's dependency graph.
///
/// Depth-first search from every unvisited task. The visited and on-stack
/// maps are keyed by task id and scoped to the whole check, so cycles
/// reachable from any starting node are found regardless of iteration order.
pub fn has_cycle(dag: &Dag) -> bool {
    let mut visited: HashMap<i64, bool> = HashMap::new();
    let mut on_stack: HashMap<i64, bool> = HashMap::new();

    for task in &dag.tasks {
        if !visited.get(&task.id).copied().unwrap_or(false)
            && dfs_cycle_check(dag, task.id, &mut visited, &mut on_stack)
        {
            return true;
        }
    }

    false
}

fn dfs_cycle_check(
    dag: &Dag,
    task_id: i64,
    visited: &mut HashMap<i64, bool>,
    on_stack: &mut HashMap<i64, bool>,
) -> bool {
    visited.insert(task_id, true);
    on_stack.insert(task_id, true);

    let Some(task) = dag.task_by_id(task_id) else {
        // Dangling edge target; reported by validate_dependencies, not here.
        on_stack.insert(task_id, false);
        return false;
    };

    for dep in &task.dependencies {
        if !visited.get(&dep.task_id).copied().unwrap_or(false) {
            if dfs_cycle_check(dag, dep.task_id, visited, on_stack) {
                return true;
            }
        }
        if on_stack.get(&dep.task_id).copied().unwrap_or(false) {
            // Back-edge: the dependency is still on the recursion stack.
            return true;
        }
    }

    on_stack.insert(task_id, false);
    false
}

/// Validate the dependency graph of a DAG.
///
/// Cycle detection runs first and fails immediately; afterwards every
/// dependency edge must reference a task that exists in the same DAG.
pub fn validate_dependencies(dag: &Dag) -> Result<()> {
    if has_cycle(dag) {
        warn!(dag = %dag.name, "cycle detected in DAG");
        return Err(ConduitError::DagCycle(dag.name.clone()));
    }

    for task in &dag.tasks {
        for dep in &task.dependencies {
            if dag.task_by_id(dep.task_id).is_none() {
                warn!(
                    dag = %dag.name,
                    task = %task.name,
                    dependency_id = dep.task_id,
                    "dependency references a task that does not exist"
                );
                return Err(ConduitError::InvalidDag {
                    dag: dag.name.clone(),
                    reason: format!(
                        "task '{}' depends on unknown task {} ('{}')",
                        task.name, dep.task_id, dep.task_name
                    ),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::model::{DagTask, DEFAULT_MAX_DEPENDENCIES};

    fn dag_with_edges(edges: &[(i64, i64)], task_ids: &[i64]) -> Dag {
        let mut dag = Dag::new("test", "* * * * *", "");
        for &id in task_ids {
            dag.add_task(DagTask::new(id, 0, format!("t{id}"), format!("t{id}.sh")))
                .unwrap();
        }
        for &(from, to) in edges {
            let task = dag.tasks.iter_mut().find(|t| t.id == from).unwrap();
            task.add_dependency(to, format!("t{to}"), DEFAULT_MAX_DEPENDENCIES)
                .unwrap();
        }
        dag
    }

    #[test]
    fn empty_dag_is_valid() {
        let dag = Dag::new("empty", "* * * * *", "");
        assert!(!has_cycle(&dag));
        assert!(validate_dependencies(&dag).is_ok());
    }

    #[test]
    fn chain_is_acyclic() {
        let dag = dag_with_edges(&[(2, 1), (3, 2)], &[1, 2, 3]);
        assert!(!has_cycle(&dag));
        assert!(validate_dependencies(&dag).is_ok());
    }

    #[test]
    fn diamond_is_acyclic() {
        // 1 -> {2, 3} -> 4
        let dag = dag_with_edges(&[(2, 1), (3, 1), (4, 2), (4, 3)], &[1, 2, 3, 4]);
        assert!(!has_cycle(&dag));
        assert!(validate_dependencies(&dag).is_ok());
    }

    #[test]
    fn three_task_cycle_detected() {
        // A(1) -> B(2) -> C(3) -> A(1)
        let dag = dag_with_edges(&[(1, 2), (2, 3), (3, 1)], &[1, 2, 3]);
        assert!(has_cycle(&dag));
        assert!(matches!(
            validate_dependencies(&dag),
            Err(ConduitError::DagCycle(_))
        ));
    }

    #[test]
    fn cycle_in_disconnected_component_detected() {
        // 1 standalone, 2 <-> 3 cycle.
        let dag = dag_with_edges(&[(2, 3), (3, 2)], &[1, 2, 3]);
        assert!(has_cycle(&dag));
    }

    #[test]
    fn dangling_dependency_fails_validation() {
        let dag = dag_with_edges(&[(1, 99)], &[1, 2]);
        assert!(!has_cycle(&dag));
        assert!(matches!(
            validate_dependencies(&dag),
            Err(ConduitError::InvalidDag { .. })
        ));
    }

    #[test]
    fn sparse_large_ids_are_fine() {
        // Ids well beyond any dense-array ceiling.
        let dag = dag_with_edges(&[(1_000_003, 1_000_001)], &[1_000_001, 1_000_003]);
        assert!(!has_cycle(&dag));
        assert!(validate_dependencies(&dag).is_ok());
    }
}
