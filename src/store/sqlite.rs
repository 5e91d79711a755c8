// src/store/sqlite.rs

//! SQLite-backed [`Store`] implementation using `rusqlite`.
//!
//! A single connection guarded by a mutex; concurrent DAG runs serialize on
//! it for the duration of one statement, which is short enough that it never
//! blocks the scheduler tick.

use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::dag::model::{
    Dag, DagExecution, DagStatus, DagTask, ExecutionStatus, TaskDependency, TaskExecution,
};
use crate::errors::Result;
use crate::store::Store;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS dags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            cron_expression TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'active',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dag_id INTEGER NOT NULL,
            task_name TEXT NOT NULL,
            task_execution TEXT NOT NULL,
            FOREIGN KEY(dag_id) REFERENCES dags(id)
        );
        CREATE TABLE IF NOT EXISTS task_dependencies (
            task_id INTEGER NOT NULL,
            dependency_task_id INTEGER NOT NULL,
            dependency_task_name TEXT NOT NULL,
            PRIMARY KEY(task_id, dependency_task_id),
            FOREIGN KEY(task_id) REFERENCES tasks(id)
        );
        CREATE TABLE IF NOT EXISTS dag_executions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dag_id INTEGER NOT NULL,
            execution_id TEXT NOT NULL,
            status TEXT NOT NULL,
            started_at INTEGER NOT NULL,
            completed_at INTEGER,
            error_message TEXT,
            FOREIGN KEY(dag_id) REFERENCES dags(id)
        );
        CREATE TABLE IF NOT EXISTS task_executions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dag_execution_id INTEGER NOT NULL,
            task_id INTEGER NOT NULL,
            task_name TEXT NOT NULL,
            status TEXT NOT NULL,
            started_at INTEGER NOT NULL,
            completed_at INTEGER,
            error_message TEXT,
            FOREIGN KEY(dag_execution_id) REFERENCES dag_executions(id)
        );
        CREATE TABLE IF NOT EXISTS task_status_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            task_id INTEGER NOT NULL,
            dag_id INTEGER NOT NULL,
            dag_execution_id INTEGER NOT NULL,
            status TEXT NOT NULL,
            timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
            details TEXT
        );",
    )?;
    debug!("sqlite migrations applied");
    Ok(())
}

fn to_unix(t: DateTime<Utc>) -> i64 {
    t.timestamp()
}

fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

impl Store for SqliteStore {
    fn load_active_dags(&self) -> Result<Vec<Dag>> {
        let conn = self.conn.lock();

        let mut dags: Vec<Dag> = {
            let mut stmt = conn.prepare(
                "SELECT id, name, cron_expression, description, status, created_at, updated_at
                 FROM dags ORDER BY id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Dag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    cron_expression: row.get(2)?,
                    description: row.get(3)?,
                    status: DagStatus::parse(&row.get::<_, String>(4)?),
                    created_at: from_unix(row.get(5)?),
                    updated_at: from_unix(row.get(6)?),
                    tasks: Vec::new(),
                })
            })?;
            rows.collect::<std::result::Result<_, _>>()?
        };

        for dag in &mut dags {
            let mut stmt = conn.prepare(
                "SELECT id, dag_id, task_name, task_execution FROM tasks
                 WHERE dag_id = ?1 ORDER BY id",
            )?;
            let tasks = stmt.query_map(params![dag.id], |row| {
                Ok(DagTask {
                    id: row.get(0)?,
                    dag_id: row.get(1)?,
                    name: row.get(2)?,
                    execution: row.get(3)?,
                    dependencies: Vec::new(),
                })
            })?;
            dag.tasks = tasks.collect::<std::result::Result<_, _>>()?;

            for task in &mut dag.tasks {
                let mut stmt = conn.prepare(
                    "SELECT dependency_task_id, dependency_task_name FROM task_dependencies
                     WHERE task_id = ?1",
                )?;
                let deps = stmt.query_map(params![task.id], |row| {
                    Ok(TaskDependency {
                        task_id: row.get(0)?,
                        task_name: row.get(1)?,
                    })
                })?;
                task.dependencies = deps.collect::<std::result::Result<_, _>>()?;
            }
        }

        Ok(dags)
    }

    fn insert_dag(&self, dag: &Dag) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO dags (name, cron_expression, description, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                dag.name,
                dag.cron_expression,
                dag.description,
                dag.status.as_str(),
                to_unix(dag.created_at),
                to_unix(dag.updated_at),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn insert_task(&self, task: &DagTask) -> Result<i64> {
        let conn = self.conn.lock();

        let task_id = if task.id != 0 {
            conn.execute(
                "INSERT INTO tasks (id, dag_id, task_name, task_execution)
                 VALUES (?1, ?2, ?3, ?4)",
                params![task.id, task.dag_id, task.name, task.execution],
            )?;
            task.id
        } else {
            conn.execute(
                "INSERT INTO tasks (dag_id, task_name, task_execution)
                 VALUES (?1, ?2, ?3)",
                params![task.dag_id, task.name, task.execution],
            )?;
            conn.last_insert_rowid()
        };

        for dep in &task.dependencies {
            conn.execute(
                "INSERT INTO task_dependencies (task_id, dependency_task_id, dependency_task_name)
                 VALUES (?1, ?2, ?3)",
                params![task_id, dep.task_id, dep.task_name],
            )?;
        }

        Ok(task_id)
    }

    fn insert_execution(&self, execution: &DagExecution) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO dag_executions (dag_id, execution_id, status, started_at, completed_at, error_message)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                execution.dag_id,
                execution.execution_id,
                execution.status.as_str(),
                to_unix(execution.started_at),
                execution.completed_at.map(to_unix),
                execution.error_message,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn insert_task_execution(&self, execution: &TaskExecution) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO task_executions (dag_execution_id, task_id, task_name, status, started_at, completed_at, error_message)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                execution.dag_execution_id,
                execution.task_id,
                execution.task_name,
                execution.status.as_str(),
                to_unix(execution.started_at),
                execution.completed_at.map(to_unix),
                execution.error_message,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update_execution_status(
        &self,
        execution_db_id: i64,
        status: ExecutionStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE dag_executions SET status = ?1, completed_at = ?2, error_message = ?3
             WHERE id = ?4",
            params![
                status.as_str(),
                terminal_completed_at(status),
                error_message,
                execution_db_id,
            ],
        )?;
        Ok(())
    }

    fn update_task_execution_status(
        &self,
        task_execution_db_id: i64,
        status: ExecutionStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE task_executions SET status = ?1, completed_at = ?2, error_message = ?3
             WHERE id = ?4",
            params![
                status.as_str(),
                terminal_completed_at(status),
                error_message,
                task_execution_db_id,
            ],
        )?;
        Ok(())
    }

    fn delete_dag(&self, dag_id: i64) -> Result<bool> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM task_executions WHERE dag_execution_id IN
             (SELECT id FROM dag_executions WHERE dag_id = ?1)",
            params![dag_id],
        )?;
        tx.execute("DELETE FROM dag_executions WHERE dag_id = ?1", params![dag_id])?;
        tx.execute(
            "DELETE FROM task_dependencies WHERE task_id IN
             (SELECT id FROM tasks WHERE dag_id = ?1)",
            params![dag_id],
        )?;
        tx.execute("DELETE FROM tasks WHERE dag_id = ?1", params![dag_id])?;
        tx.execute("DELETE FROM task_status_log WHERE dag_id = ?1", params![dag_id])?;
        let deleted = tx.execute("DELETE FROM dags WHERE id = ?1", params![dag_id])?;

        tx.commit()?;
        Ok(deleted > 0)
    }

    fn log_task_status(
        &self,
        task_id: i64,
        dag_id: i64,
        dag_execution_id: i64,
        phase: &str,
        details: &str,
    ) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO task_status_log (task_id, dag_id, dag_execution_id, status, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![task_id, dag_id, dag_execution_id, phase, details],
        )?;
        Ok(())
    }
}

impl SqliteStore {
    /// Fetch one run record by row id; test/diagnostic helper.
    pub fn execution_by_id(&self, id: i64) -> Result<Option<DagExecution>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT id, dag_id, execution_id, status, started_at, completed_at, error_message
                 FROM dag_executions WHERE id = ?1",
                params![id],
                |row| {
                    Ok(DagExecution {
                        id: row.get(0)?,
                        dag_id: row.get(1)?,
                        execution_id: row.get(2)?,
                        status: ExecutionStatus::parse(&row.get::<_, String>(3)?),
                        started_at: from_unix(row.get(4)?),
                        completed_at: row.get::<_, Option<i64>>(5)?.map(from_unix),
                        error_message: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Count run records for a DAG; test/diagnostic helper.
    pub fn execution_count(&self, dag_id: i64) -> Result<i64> {
        let conn = self.conn.lock();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM dag_executions WHERE dag_id = ?1",
            params![dag_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn terminal_completed_at(status: ExecutionStatus) -> Option<i64> {
    match status {
        ExecutionStatus::Success
        | ExecutionStatus::Failed
        | ExecutionStatus::Cancelled
        | ExecutionStatus::Skipped => Some(Utc::now().timestamp()),
        ExecutionStatus::Pending | ExecutionStatus::Running => None,
    }
}
