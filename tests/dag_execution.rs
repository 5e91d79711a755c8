use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use parking_lot::Mutex;

use conduit::dag::model::{Dag, DagTask, ExecutionStatus, DEFAULT_MAX_DEPENDENCIES};
use conduit::engine::executor::{execute_dag, ExecutorOptions};
use conduit::exec::TaskLauncher;
use conduit::store::SqliteStore;

/// Launcher that never touches the OS: scripted exit codes per directive,
/// recording every invocation in order.
struct FakeLauncher {
    exit_codes: HashMap<String, i32>,
    calls: Mutex<Vec<String>>,
}

impl FakeLauncher {
    fn all_succeed() -> Self {
        Self {
            exit_codes: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing(directives: &[&str]) -> Self {
        let exit_codes = directives.iter().map(|d| (d.to_string(), 1)).collect();
        Self {
            exit_codes,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl TaskLauncher for FakeLauncher {
    fn run<'a>(&'a self, directive: &'a str) -> Pin<Box<dyn Future<Output = i32> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().push(directive.to_string());
            self.exit_codes.get(directive).copied().unwrap_or(0)
        })
    }
}

fn task(id: i64, name: &str, deps: &[(i64, &str)]) -> DagTask {
    let mut t = DagTask::new(id, 1, name, format!("{name}.sh"));
    for &(dep_id, dep_name) in deps {
        t.add_dependency(dep_id, dep_name, DEFAULT_MAX_DEPENDENCIES)
            .unwrap();
    }
    t
}

fn quick_options() -> ExecutorOptions {
    ExecutorOptions {
        wave_retry_delay: std::time::Duration::from_millis(1),
    }
}

#[tokio::test]
async fn chain_runs_in_dependency_order() {
    let store = SqliteStore::open_in_memory().unwrap();
    let launcher = FakeLauncher::all_succeed();

    let mut dag = Dag::new("chain", "* * * * *", "");
    dag.id = 1;
    dag.add_task(task(1, "a", &[])).unwrap();
    dag.add_task(task(2, "b", &[(1, "a")])).unwrap();
    dag.add_task(task(3, "c", &[(2, "b")])).unwrap();

    let report = execute_dag(&dag, &store, &launcher, &quick_options())
        .await
        .unwrap();

    assert_eq!(report.status, ExecutionStatus::Success);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(launcher.calls(), vec!["a.sh", "b.sh", "c.sh"]);
    assert_eq!(store.execution_count(1).unwrap(), 1);
}

#[tokio::test]
async fn failed_branch_aborts_run_and_blocks_dependents() {
    // a -> {b, c}; e depends on b. b fails, c succeeds.
    let store = SqliteStore::open_in_memory().unwrap();
    let launcher = FakeLauncher::failing(&["b.sh"]);

    let mut dag = Dag::new("diamond", "* * * * *", "");
    dag.id = 1;
    dag.add_task(task(1, "a", &[])).unwrap();
    dag.add_task(task(2, "b", &[(1, "a")])).unwrap();
    dag.add_task(task(3, "c", &[(1, "a")])).unwrap();
    dag.add_task(task(4, "e", &[(2, "b")])).unwrap();

    let report = execute_dag(&dag, &store, &launcher, &quick_options())
        .await
        .unwrap();

    assert_eq!(report.status, ExecutionStatus::Failed);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);

    // The already-started wave finished (c ran after b's failure), but e,
    // downstream of the failure, never launched.
    let calls = launcher.calls();
    assert!(calls.contains(&"c.sh".to_string()));
    assert!(!calls.contains(&"e.sh".to_string()));

    let execution = store.execution_by_id(1).unwrap().unwrap();
    assert_eq!(execution.status, ExecutionStatus::Failed);
    assert!(execution.completed_at.is_some());
    assert!(execution
        .error_message
        .as_deref()
        .unwrap()
        .contains("2 successful, 1 failed"));
}

#[tokio::test]
async fn cyclic_dag_never_creates_an_execution_record() {
    let store = SqliteStore::open_in_memory().unwrap();
    let launcher = FakeLauncher::all_succeed();

    // a -> b -> c -> a
    let mut dag = Dag::new("cyclic", "* * * * *", "");
    dag.id = 1;
    dag.add_task(task(1, "a", &[(2, "b")])).unwrap();
    dag.add_task(task(2, "b", &[(3, "c")])).unwrap();
    dag.add_task(task(3, "c", &[(1, "a")])).unwrap();

    let result = execute_dag(&dag, &store, &launcher, &quick_options()).await;

    assert!(result.is_err());
    assert!(launcher.calls().is_empty());
    assert_eq!(store.execution_count(1).unwrap(), 0);
}

#[tokio::test]
async fn dangling_dependency_rejected_before_any_record() {
    let store = SqliteStore::open_in_memory().unwrap();
    let launcher = FakeLauncher::all_succeed();

    let mut dag = Dag::new("dangling", "* * * * *", "");
    dag.id = 1;
    dag.add_task(task(1, "a", &[(99, "ghost")])).unwrap();

    let result = execute_dag(&dag, &store, &launcher, &quick_options()).await;

    assert!(result.is_err());
    assert!(launcher.calls().is_empty());
    assert_eq!(store.execution_count(1).unwrap(), 0);
}

#[tokio::test]
async fn inactive_dag_is_rejected() {
    let store = SqliteStore::open_in_memory().unwrap();
    let launcher = FakeLauncher::all_succeed();

    let mut dag = Dag::new("paused", "* * * * *", "");
    dag.id = 1;
    dag.status = conduit::dag::model::DagStatus::Paused;
    dag.add_task(task(1, "a", &[])).unwrap();

    assert!(execute_dag(&dag, &store, &launcher, &quick_options())
        .await
        .is_err());
    assert!(launcher.calls().is_empty());
    assert_eq!(store.execution_count(1).unwrap(), 0);
}

#[tokio::test]
async fn single_task_dag_succeeds() {
    let store = SqliteStore::open_in_memory().unwrap();
    let launcher = FakeLauncher::all_succeed();

    let mut dag = Dag::new("solo", "* * * * *", "");
    dag.id = 1;
    dag.add_task(task(1, "only", &[])).unwrap();

    let report = execute_dag(&dag, &store, &launcher, &quick_options())
        .await
        .unwrap();

    assert_eq!(report.status, ExecutionStatus::Success);
    assert_eq!(report.succeeded, 1);
    assert!(report.execution_id.starts_with("dag_1_"));
}
