//! Storage layer and allocation engine for shop-floor time tracking.
//!
//! Persists workstations, tasks and their event logs using `rusqlite`, and
//! hosts the allocation engine: the only code that changes task status,
//! workstation occupancy or appends to an event log.
//!
//! # Concurrency
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Concurrent operators use one `Database` per thread against the same file.
//! Every mutating operation runs in a `BEGIN IMMEDIATE` transaction, so it holds
//! the store's write lock from its first read until commit. A second writer
//! waits (up to the busy timeout) and then observes the committed state.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as INTEGER seconds since the Unix epoch. Durations are
//! plain integer differences, so no timezone conversion ever takes part in
//! time arithmetic.
//!
//! ## Storage-Level Invariants
//!
//! Two partial unique indexes back the engine's invariants:
//! - `idx_tasks_active_resource`: one in-progress or paused task per resource
//! - `idx_task_events_open_pause`: one open pause per task

mod aggregate;
mod audit;
mod engine;

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

use shop_core::{
    Actuals, ActiveTaskCheck, EventType, OrderId, Resource, ResourceId, ResourceStatus,
    ServiceDefinition, ServiceId, Task, TaskEvent, TaskId, TaskSnapshot, TaskStatus, Timestamp,
    ValidationError, WorkerId, reconstruct,
};

pub use aggregate::{OrderCostSummary, TaskCounts};
pub use audit::InvariantViolation;
pub use engine::{CancelOutcome, StartDisposition, StartOutcome, StartRequest, StopOutcome};

/// How long a writer waits for a concurrent transaction before giving up.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The workstation is held by a task from a different context.
    #[error("resource {resource_id} is busy: occupied by task {task_id} ({status})")]
    ResourceBusy {
        resource_id: ResourceId,
        task_id: TaskId,
        status: TaskStatus,
    },

    /// The workstation cannot take work in its current status.
    #[error("resource {resource_id} is unavailable: {status}")]
    ResourceUnavailable {
        resource_id: ResourceId,
        status: ResourceStatus,
    },

    /// The task is not in a status that allows the operation.
    #[error("cannot {operation} task {task_id}: task is {status}")]
    InvalidTransition {
        task_id: TaskId,
        operation: shop_core::Operation,
        status: TaskStatus,
    },

    /// An invariant the engine maintains does not hold.
    #[error("inconsistent state for {subject}: {detail}")]
    Inconsistency { subject: String, detail: String },

    /// A stored identifier or status failed validation.
    #[error("invalid stored value: {0}")]
    Validation(#[from] ValidationError),

    /// A stored column could not be decoded.
    #[error("invalid stored value in {column}: {message}")]
    InvalidStoredValue {
        column: &'static str,
        message: String,
    },
}

/// Broad classification of [`DbError`] for callers choosing a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Expected and user-facing: busy resource, out-of-order operation.
    Conflict,
    /// Expected and user-facing: unknown task, resource, order or service.
    NotFound,
    /// A defect: stored state breaks an invariant.
    Inconsistency,
    /// The storage layer itself failed.
    Storage,
}

impl DbError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ResourceBusy { .. }
            | Self::ResourceUnavailable { .. }
            | Self::InvalidTransition { .. } => ErrorKind::Conflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Inconsistency { .. }
            | Self::Validation(_)
            | Self::InvalidStoredValue { .. } => ErrorKind::Inconsistency,
            Self::Sqlite(_) => ErrorKind::Storage,
        }
    }

    fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    fn inconsistency(subject: impl ToString, detail: impl ToString) -> Self {
        let subject = subject.to_string();
        let detail = detail.to_string();
        tracing::error!(%subject, %detail, "state invariant violated");
        Self::Inconsistency { subject, detail }
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for concurrency considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Opens a database, waiting up to `busy_timeout` for concurrent writers.
    pub fn open_with_timeout(path: &Path, busy_timeout: Duration) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS orders (
                id TEXT PRIMARY KEY,
                name TEXT,
                actual_cost_total REAL NOT NULL DEFAULT 0,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS services (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                default_quantity REAL NOT NULL,
                default_hours REAL NOT NULL,
                default_unit_price REAL NOT NULL
            );

            -- occupancy_status: idle | active | paused | maintenance
            -- current_task_id: set iff occupancy_status is active or paused
            CREATE TABLE IF NOT EXISTS resources (
                id TEXT PRIMARY KEY,
                name TEXT,
                occupancy_status TEXT NOT NULL DEFAULT 'idle',
                current_task_id TEXT,
                updated_at INTEGER NOT NULL,
                FOREIGN KEY (current_task_id) REFERENCES tasks(id) ON DELETE SET NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                order_id TEXT NOT NULL,
                resource_id TEXT NOT NULL,
                service_id TEXT NOT NULL,
                service_name TEXT NOT NULL,
                assigned_worker_id TEXT,
                estimated_quantity REAL NOT NULL,
                estimated_hours REAL NOT NULL,
                unit_price REAL NOT NULL,
                estimated_cost REAL NOT NULL,
                actual_hours REAL,
                actual_cost REAL,
                time_variance_hours REAL,
                cost_variance REAL,
                variance_percent REAL,
                total_pause_duration_seconds INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                started_at INTEGER,
                ended_at INTEGER,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                FOREIGN KEY (order_id) REFERENCES orders(id),
                FOREIGN KEY (resource_id) REFERENCES resources(id)
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_context ON tasks(order_id, resource_id, service_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_worker ON tasks(assigned_worker_id);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_tasks_active_resource
                ON tasks(resource_id) WHERE status IN ('in_progress', 'paused');

            -- event_timestamp: seconds since the Unix epoch
            -- elapsed_seconds: pause length once closed, active seconds on stop
            CREATE TABLE IF NOT EXISTS task_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                event_type TEXT NOT NULL,
                event_timestamp INTEGER NOT NULL,
                elapsed_seconds INTEGER,
                FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_task_events_task ON task_events(task_id, event_timestamp);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_task_events_open_pause
                ON task_events(task_id) WHERE event_type = 'pause' AND elapsed_seconds IS NULL;
            ",
        )?;
        Ok(())
    }

    /// Registers an order, keeping its name if one is already stored.
    pub fn upsert_order(&mut self, id: &OrderId, name: Option<&str>) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO orders (id, name, actual_cost_total, updated_at)
            VALUES (?, ?, 0, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = COALESCE(excluded.name, orders.name),
                updated_at = excluded.updated_at
            ",
            params![id.as_str(), name, Timestamp::now().epoch_seconds()],
        )?;
        Ok(())
    }

    /// Adds or replaces a catalog entry. Existing tasks keep their estimates.
    pub fn upsert_service(&mut self, service: &ServiceDefinition) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO services (id, name, default_quantity, default_hours, default_unit_price)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                default_quantity = excluded.default_quantity,
                default_hours = excluded.default_hours,
                default_unit_price = excluded.default_unit_price
            ",
            params![
                service.id.as_str(),
                service.name,
                service.default_quantity,
                service.default_hours,
                service.default_unit_price,
            ],
        )?;
        Ok(())
    }

    /// Registers a workstation as idle, or renames an existing one.
    ///
    /// Occupancy of an existing workstation is never touched.
    pub fn upsert_resource(&mut self, id: &ResourceId, name: Option<&str>) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO resources (id, name, occupancy_status, current_task_id, updated_at)
            VALUES (?, ?, 'idle', NULL, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = COALESCE(excluded.name, resources.name)
            ",
            params![id.as_str(), name, Timestamp::now().epoch_seconds()],
        )?;
        Ok(())
    }

    /// Looks up a catalog entry.
    pub fn get_service(&self, id: &ServiceId) -> Result<ServiceDefinition, DbError> {
        load_service(&self.conn, id)?.ok_or_else(|| DbError::not_found("service", id))
    }

    /// Fetches a task by ID.
    pub fn get_task(&self, id: &TaskId) -> Result<Task, DbError> {
        load_task(&self.conn, id)?.ok_or_else(|| DbError::not_found("task", id))
    }

    /// Fetches a workstation by ID.
    pub fn get_resource(&self, id: &ResourceId) -> Result<Resource, DbError> {
        load_resource(&self.conn, id)?.ok_or_else(|| DbError::not_found("resource", id))
    }

    /// Lists every workstation with its occupancy, ordered by ID.
    pub fn list_resources(&self) -> Result<Vec<Resource>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, name, occupancy_status, current_task_id
            FROM resources
            ORDER BY id ASC
            ",
        )?;
        let rows = stmt.query_map([], ResourceRow::from_row)?;
        let mut resources = Vec::new();
        for row in rows {
            resources.push(row?.into_resource()?);
        }
        Ok(resources)
    }

    /// Lists a task's event log in log order.
    pub fn list_task_events(&self, task_id: &TaskId) -> Result<Vec<TaskEvent>, DbError> {
        if load_task(&self.conn, task_id)?.is_none() {
            return Err(DbError::not_found("task", task_id));
        }
        list_events(&self.conn, task_id)
    }

    /// Finds the worker's in-flight task, if any.
    ///
    /// With several in flight, the most recently started one wins.
    pub fn check_active_task(&self, worker_id: &WorkerId) -> Result<ActiveTaskCheck, DbError> {
        let task_id: Option<String> = self
            .conn
            .query_row(
                "
                SELECT id
                FROM tasks
                WHERE assigned_worker_id = ? AND status IN ('in_progress', 'paused')
                ORDER BY started_at DESC, updated_at DESC, id ASC
                LIMIT 1
                ",
                [worker_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let task_id = task_id.map(TaskId::new).transpose()?;
        Ok(ActiveTaskCheck {
            has_active: task_id.is_some(),
            task_id,
        })
    }

    /// Returns the task with its live duration as of now.
    pub fn task_snapshot(&self, task_id: &TaskId) -> Result<TaskSnapshot, DbError> {
        self.task_snapshot_at(task_id, Timestamp::now())
    }

    /// Returns the task with its live duration as of `now`, without side effects.
    ///
    /// Running and paused tasks are reconstructed from the log; finished tasks
    /// report the active seconds recorded on their stop event.
    pub fn task_snapshot_at(
        &self,
        task_id: &TaskId,
        now: Timestamp,
    ) -> Result<TaskSnapshot, DbError> {
        // Read task and log from one consistent snapshot.
        let tx = self.conn.unchecked_transaction()?;
        let task = load_task(&tx, task_id)?.ok_or_else(|| DbError::not_found("task", task_id))?;
        let events = list_events(&tx, task_id)?;
        drop(tx);

        let live_duration_seconds = if task.status.is_active() {
            reconstruct(&events, task.status == TaskStatus::Paused, now)
                .map_err(|err| DbError::inconsistency(format!("task {task_id}"), err))?
                .active_seconds
        } else if task.status.is_terminal() {
            events
                .iter()
                .rev()
                .find(|event| event.event_type == EventType::Stop)
                .and_then(|event| event.elapsed_seconds)
                .unwrap_or(0)
        } else {
            0
        };

        Ok(TaskSnapshot {
            task,
            live_duration_seconds,
        })
    }
}

#[derive(Debug)]
struct ResourceRow {
    id: String,
    name: Option<String>,
    occupancy_status: String,
    current_task_id: Option<String>,
}

impl ResourceRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            occupancy_status: row.get(2)?,
            current_task_id: row.get(3)?,
        })
    }

    fn into_resource(self) -> Result<Resource, DbError> {
        Ok(Resource {
            id: ResourceId::new(self.id)?,
            name: self.name,
            occupancy_status: self.occupancy_status.parse()?,
            current_task_id: self.current_task_id.map(TaskId::new).transpose()?,
        })
    }
}

const TASK_COLUMNS: &str = "
    id, order_id, resource_id, service_id, service_name, assigned_worker_id,
    estimated_quantity, estimated_hours, unit_price, estimated_cost,
    actual_hours, actual_cost, time_variance_hours, cost_variance, variance_percent,
    total_pause_duration_seconds, status, started_at, ended_at
";

#[derive(Debug)]
struct TaskRow {
    id: String,
    order_id: String,
    resource_id: String,
    service_id: String,
    service_name: String,
    assigned_worker_id: Option<String>,
    estimated_quantity: f64,
    estimated_hours: f64,
    unit_price: f64,
    estimated_cost: f64,
    actual_hours: Option<f64>,
    actual_cost: Option<f64>,
    time_variance_hours: Option<f64>,
    cost_variance: Option<f64>,
    variance_percent: Option<f64>,
    total_pause_duration_seconds: i64,
    status: String,
    started_at: Option<i64>,
    ended_at: Option<i64>,
}

impl TaskRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            order_id: row.get(1)?,
            resource_id: row.get(2)?,
            service_id: row.get(3)?,
            service_name: row.get(4)?,
            assigned_worker_id: row.get(5)?,
            estimated_quantity: row.get(6)?,
            estimated_hours: row.get(7)?,
            unit_price: row.get(8)?,
            estimated_cost: row.get(9)?,
            actual_hours: row.get(10)?,
            actual_cost: row.get(11)?,
            time_variance_hours: row.get(12)?,
            cost_variance: row.get(13)?,
            variance_percent: row.get(14)?,
            total_pause_duration_seconds: row.get(15)?,
            status: row.get(16)?,
            started_at: row.get(17)?,
            ended_at: row.get(18)?,
        })
    }

    fn into_task(self) -> Result<Task, DbError> {
        let actuals = match (
            self.actual_hours,
            self.actual_cost,
            self.time_variance_hours,
            self.cost_variance,
            self.variance_percent,
        ) {
            (
                Some(actual_hours),
                Some(actual_cost),
                Some(time_variance_hours),
                Some(cost_variance),
                Some(variance_percent),
            ) => Some(Actuals {
                actual_hours,
                actual_cost,
                time_variance_hours,
                cost_variance,
                variance_percent,
            }),
            (None, None, None, None, None) => None,
            _ => {
                return Err(DbError::InvalidStoredValue {
                    column: "actual_*",
                    message: format!("task {} has partially stored actuals", self.id),
                });
            }
        };

        Ok(Task {
            id: TaskId::new(self.id)?,
            order_id: OrderId::new(self.order_id)?,
            resource_id: ResourceId::new(self.resource_id)?,
            service_id: ServiceId::new(self.service_id)?,
            service_name: self.service_name,
            assigned_worker_id: self.assigned_worker_id.map(WorkerId::new).transpose()?,
            estimated_quantity: self.estimated_quantity,
            estimated_hours: self.estimated_hours,
            unit_price: self.unit_price,
            estimated_cost: self.estimated_cost,
            actuals,
            total_pause_duration_seconds: self.total_pause_duration_seconds,
            status: self.status.parse()?,
            started_at: self.started_at.map(Timestamp::from_epoch_seconds),
            ended_at: self.ended_at.map(Timestamp::from_epoch_seconds),
        })
    }
}

#[derive(Debug)]
struct EventRow {
    id: i64,
    task_id: String,
    user_id: String,
    event_type: String,
    event_timestamp: i64,
    elapsed_seconds: Option<i64>,
}

impl EventRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            task_id: row.get(1)?,
            user_id: row.get(2)?,
            event_type: row.get(3)?,
            event_timestamp: row.get(4)?,
            elapsed_seconds: row.get(5)?,
        })
    }

    fn into_event(self) -> Result<TaskEvent, DbError> {
        let event_type =
            self.event_type
                .parse::<EventType>()
                .map_err(|err| DbError::InvalidStoredValue {
                    column: "task_events.event_type",
                    message: err.to_string(),
                })?;
        Ok(TaskEvent {
            id: self.id,
            task_id: TaskId::new(self.task_id)?,
            user_id: WorkerId::new(self.user_id)?,
            event_type,
            event_timestamp: Timestamp::from_epoch_seconds(self.event_timestamp),
            elapsed_seconds: self.elapsed_seconds,
        })
    }
}

fn load_task(conn: &Connection, id: &TaskId) -> Result<Option<Task>, DbError> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?");
    conn.query_row(&sql, [id.as_str()], TaskRow::from_row)
        .optional()?
        .map(TaskRow::into_task)
        .transpose()
}

fn load_resource(conn: &Connection, id: &ResourceId) -> Result<Option<Resource>, DbError> {
    conn.query_row(
        "
        SELECT id, name, occupancy_status, current_task_id
        FROM resources
        WHERE id = ?
        ",
        [id.as_str()],
        ResourceRow::from_row,
    )
    .optional()?
    .map(ResourceRow::into_resource)
    .transpose()
}

fn load_service(conn: &Connection, id: &ServiceId) -> Result<Option<ServiceDefinition>, DbError> {
    let row: Option<(String, String, f64, f64, f64)> = conn
        .query_row(
            "
            SELECT id, name, default_quantity, default_hours, default_unit_price
            FROM services
            WHERE id = ?
            ",
            [id.as_str()],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            },
        )
        .optional()?;
    row.map(
        |(id, name, default_quantity, default_hours, default_unit_price)| -> Result<_, DbError> {
            Ok(ServiceDefinition {
                id: ServiceId::new(id)?,
                name,
                default_quantity,
                default_hours,
                default_unit_price,
            })
        },
    )
    .transpose()
}

fn order_exists(conn: &Connection, id: &OrderId) -> Result<bool, DbError> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM orders WHERE id = ?", [id.as_str()], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}

fn list_events(conn: &Connection, task_id: &TaskId) -> Result<Vec<TaskEvent>, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT id, task_id, user_id, event_type, event_timestamp, elapsed_seconds
        FROM task_events
        WHERE task_id = ?
        ORDER BY event_timestamp ASC, id ASC
        ",
    )?;
    let rows = stmt.query_map([task_id.as_str()], EventRow::from_row)?;
    let mut events = Vec::new();
    for row in rows {
        events.push(row?.into_event()?);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        assert_eq!(
            table_columns(&db.conn, "resources"),
            vec![
                "id",
                "name",
                "occupancy_status",
                "current_task_id",
                "updated_at"
            ]
        );
        assert_eq!(
            table_columns(&db.conn, "task_events"),
            vec![
                "id",
                "task_id",
                "user_id",
                "event_type",
                "event_timestamp",
                "elapsed_seconds",
            ]
        );
        let task_columns = table_columns(&db.conn, "tasks");
        for column in [
            "estimated_cost",
            "actual_hours",
            "variance_percent",
            "total_pause_duration_seconds",
            "started_at",
            "ended_at",
        ] {
            assert!(task_columns.iter().any(|c| c == column), "missing {column}");
        }

        let task_indexes = index_names(&db.conn, "tasks");
        assert!(task_indexes.contains("idx_tasks_active_resource"));
        let event_indexes = index_names(&db.conn, "task_events");
        assert!(event_indexes.contains("idx_task_events_open_pause"));
    }

    #[test]
    fn init_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        db.init().unwrap();
    }

    #[test]
    fn upsert_resource_keeps_occupancy_and_name() {
        let mut db = Database::open_in_memory().unwrap();
        let id = ResourceId::new("press-1").unwrap();
        db.upsert_resource(&id, Some("Press 1")).unwrap();
        db.conn
            .execute(
                "UPDATE resources SET occupancy_status = 'maintenance' WHERE id = ?",
                [id.as_str()],
            )
            .unwrap();
        db.upsert_resource(&id, None).unwrap();

        let resource = db.get_resource(&id).unwrap();
        assert_eq!(resource.name.as_deref(), Some("Press 1"));
        assert_eq!(resource.occupancy_status, ResourceStatus::Maintenance);
    }

    #[test]
    fn get_missing_entities_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = db.get_task(&TaskId::new("nope").unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "task not found: nope");

        let err = db
            .get_service(&ServiceId::new("weld").unwrap())
            .unwrap_err();
        assert_eq!(err.to_string(), "service not found: weld");
    }

    #[test]
    fn stored_garbage_status_is_an_inconsistency() {
        let mut db = Database::open_in_memory().unwrap();
        let id = ResourceId::new("lathe").unwrap();
        db.upsert_resource(&id, None).unwrap();
        db.conn
            .execute(
                "UPDATE resources SET occupancy_status = 'exploded' WHERE id = ?",
                [id.as_str()],
            )
            .unwrap();
        let err = db.get_resource(&id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inconsistency);
    }

    #[test]
    fn list_resources_orders_by_id() {
        let mut db = Database::open_in_memory().unwrap();
        for id in ["saw-2", "laser-1", "press-3"] {
            db.upsert_resource(&ResourceId::new(id).unwrap(), None)
                .unwrap();
        }
        let ids: Vec<String> = db
            .list_resources()
            .unwrap()
            .into_iter()
            .map(|resource| resource.id.to_string())
            .collect();
        assert_eq!(ids, vec!["laser-1", "press-3", "saw-2"]);
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }
}
