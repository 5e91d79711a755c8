// src/engine/queue.rs

use std::collections::HashSet;

use tracing::debug;

use crate::dag::model::Dag;

/// Per-task readiness state, scoped to one DAG run and discarded afterwards.
#[derive(Debug, Clone)]
struct QueueEntry {
    task_id: i64,
    dependency_ids: Vec<i64>,
    ready_to_run: bool,
    completed_dependencies: usize,
}

/// Readiness tracker for one DAG run.
///
/// Built from a validated DAG; yields waves of currently-runnable tasks via
/// [`ready_tasks`](Self::ready_tasks) and advances the frontier through
/// [`mark_completed`](Self::mark_completed). Never shared across runs, so no
/// locking is needed.
#[derive(Debug)]
pub struct ExecutionQueue {
    entries: Vec<QueueEntry>,
    /// Tasks already recorded as completed; guards against a duplicate
    /// `mark_completed` double-advancing a dependent's counter.
    completed: HashSet<i64>,
}

impl ExecutionQueue {
    /// One entry per task; tasks with zero dependencies start ready.
    pub fn new(dag: &Dag) -> Self {
        let entries = dag
            .tasks
            .iter()
            .map(|task| QueueEntry {
                task_id: task.id,
                dependency_ids: task.dependencies.iter().map(|d| d.task_id).collect(),
                ready_to_run: task.dependencies.is_empty(),
                completed_dependencies: 0,
            })
            .collect();

        Self {
            entries,
            completed: HashSet::new(),
        }
    }

    /// Snapshot of all task ids currently ready to run. Does not mutate the
    /// queue; callers consume the snapshot within one wave.
    pub fn ready_tasks(&self) -> Vec<i64> {
        self.entries
            .iter()
            .filter(|e| e.ready_to_run)
            .map(|e| e.task_id)
            .collect()
    }

    /// Record that a task reached terminal success.
    ///
    /// Flips the task's own entry to not-ready (it has been consumed) and
    /// bumps the completed-dependency counter of every entry depending on
    /// it, flipping dependents to ready once all their dependencies are
    /// done. Idempotent: a second call for the same task is a no-op.
    pub fn mark_completed(&mut self, task_id: i64) {
        let Some(entry) = self.entries.iter_mut().find(|e| e.task_id == task_id) else {
            debug!(task_id, "mark_completed for unknown task ignored");
            return;
        };
        if !self.completed.insert(task_id) {
            debug!(task_id, "duplicate mark_completed ignored");
            return;
        }
        entry.ready_to_run = false;

        for entry in &mut self.entries {
            if entry.task_id == task_id {
                continue;
            }
            if entry.dependency_ids.contains(&task_id) {
                entry.completed_dependencies += 1;
                if entry.completed_dependencies >= entry.dependency_ids.len() {
                    entry.ready_to_run = true;
                }
            }
        }
    }

    /// Number of tasks not yet recorded as completed.
    pub fn remaining(&self) -> usize {
        self.entries.len() - self.completed.len()
    }
}
