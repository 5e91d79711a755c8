use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use conduit::cron::matcher::CronTime;
use conduit::dag::model::{Dag, DagStatus, DagTask, ExecutionStatus};
use conduit::engine::{ExecutorOptions, Scheduler, SchedulerOptions};
use conduit::errors::ConduitError;
use conduit::exec::TaskLauncher;
use conduit::store::{SqliteStore, Store};

/// Launcher where every task exits 0 instantly.
struct NoopLauncher;

impl TaskLauncher for NoopLauncher {
    fn run<'a>(&'a self, _directive: &'a str) -> Pin<Box<dyn Future<Output = i32> + Send + 'a>> {
        Box::pin(async move { 0 })
    }
}

fn at(minute: i64, hour: i64) -> CronTime {
    CronTime {
        minute,
        hour,
        day_of_month: 10,
        month: 4,
        day_of_week: 2,
    }
}

fn quick_options() -> SchedulerOptions {
    SchedulerOptions {
        poll_interval: Duration::from_millis(10),
        executor: ExecutorOptions {
            wave_retry_delay: Duration::from_millis(1),
        },
    }
}

fn seed_dag(store: &SqliteStore, name: &str, cron: &str) -> i64 {
    let dag = Dag::new(name, cron, "seeded by test");
    let dag_id = store.insert_dag(&dag).unwrap();

    let task = DagTask::new(0, dag_id, format!("{name}-task"), format!("{name}.sh"));
    store.insert_task(&task).unwrap();
    dag_id
}

fn scheduler_with(store: Arc<SqliteStore>) -> Scheduler {
    Scheduler::new(store, Arc::new(NoopLauncher), quick_options())
}

#[tokio::test]
async fn reload_installs_stored_dags() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    seed_dag(&store, "first", "* * * * *");
    seed_dag(&store, "second", "0 0 * * *");

    let scheduler = scheduler_with(Arc::clone(&store));
    assert!(scheduler.active_dags().is_empty());

    scheduler.reload().unwrap();
    assert_eq!(scheduler.active_dags().len(), 2);
}

#[tokio::test]
async fn every_minute_dag_is_due_on_any_tick() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    seed_dag(&store, "always", "* * * * *");

    let scheduler = scheduler_with(Arc::clone(&store));
    scheduler.reload().unwrap();

    for (minute, hour) in [(0, 0), (17, 3), (59, 23)] {
        let due = scheduler.due_dags(&at(minute, hour));
        assert_eq!(due.len(), 1, "expected exactly one due DAG at {hour}:{minute}");
    }
}

#[tokio::test]
async fn cron_schedule_filters_ticks() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    seed_dag(&store, "two-am", "0 2 * * *");

    let scheduler = scheduler_with(Arc::clone(&store));
    scheduler.reload().unwrap();

    assert_eq!(scheduler.due_dags(&at(0, 2)).len(), 1);
    assert!(scheduler.due_dags(&at(1, 2)).is_empty());
    assert!(scheduler.due_dags(&at(0, 3)).is_empty());
}

#[tokio::test]
async fn non_active_dags_are_never_due() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let mut dag = Dag::new("paused", "* * * * *", "");
    dag.status = DagStatus::Paused;
    store.insert_dag(&dag).unwrap();

    let scheduler = scheduler_with(Arc::clone(&store));
    scheduler.reload().unwrap();

    assert!(scheduler.due_dags(&at(0, 0)).is_empty());
}

#[tokio::test]
async fn dispatch_records_an_execution_per_due_dag() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let first = seed_dag(&store, "one", "* * * * *");
    let second = seed_dag(&store, "two", "* * * * *");

    let scheduler = scheduler_with(Arc::clone(&store));
    scheduler.reload().unwrap();

    let dispatched = scheduler.dispatch_due(&at(12, 12));
    assert_eq!(dispatched, 2);

    // Runs are detached; poll until both have recorded an execution.
    for _ in 0..50 {
        if store.execution_count(first).unwrap() == 1
            && store.execution_count(second).unwrap() == 1
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("dispatched runs never recorded executions");
}

#[tokio::test]
async fn manual_trigger_runs_synchronously() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let dag_id = seed_dag(&store, "manual", "0 0 1 1 0");

    let scheduler = scheduler_with(Arc::clone(&store));
    scheduler.reload().unwrap();

    let report = scheduler.trigger_manually(dag_id).await.unwrap();
    assert_eq!(report.status, ExecutionStatus::Success);
    assert_eq!(report.succeeded, 1);
    assert_eq!(store.execution_count(dag_id).unwrap(), 1);
}

#[tokio::test]
async fn manual_trigger_of_paused_dag_reports_not_found() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let mut dag = Dag::new("paused", "* * * * *", "");
    dag.status = DagStatus::Paused;
    let dag_id = store.insert_dag(&dag).unwrap();

    let scheduler = scheduler_with(Arc::clone(&store));
    scheduler.reload().unwrap();
    assert_eq!(scheduler.active_dags().len(), 1);

    // Loaded but not active: not triggerable, and no run record appears.
    let err = scheduler.trigger_manually(dag_id).await.unwrap_err();
    assert!(matches!(err, ConduitError::DagNotFound(id) if id == dag_id));
    assert_eq!(store.execution_count(dag_id).unwrap(), 0);
}

#[tokio::test]
async fn manual_trigger_of_unknown_dag_fails() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let scheduler = scheduler_with(Arc::clone(&store));
    scheduler.reload().unwrap();

    let err = scheduler.trigger_manually(424242).await.unwrap_err();
    assert!(matches!(err, ConduitError::DagNotFound(424242)));
}
