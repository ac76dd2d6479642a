//! Allocation engine: start, pause, resume, stop and cancel.
//!
//! Each operation is one `BEGIN IMMEDIATE` transaction: it takes the write
//! lock, reads current state, validates, writes task + workstation + event log
//! together and commits. Any error rolls everything back.

use rusqlite::{Connection, TransactionBehavior, params};
use serde::Serialize;
use uuid::Uuid;

use shop_core::{
    Actuals, EventType, Operation, OrderId, Resource, ResourceId, ResourceStatus, RunTime,
    ServiceId, Task, TaskEvent, TaskId, TaskStatus, Timestamp, WorkerId, reconstruct,
};

use crate::aggregate::recompute_order_actual_cost;
use crate::{
    Database, DbError, TASK_COLUMNS, TaskRow, list_events, load_resource, load_service,
    load_task, order_exists,
};

/// An operator asking to clock in on a workstation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub order_id: OrderId,
    pub resource_id: ResourceId,
    pub service_id: ServiceId,
    pub worker_id: WorkerId,
}

/// How a successful `start` obtained its task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartDisposition {
    /// A new planned task was created from the catalog and started.
    Created,
    /// A planned or paused task for the same context was started.
    Reused,
    /// The same context already holds the workstation; nothing changed.
    AlreadyRunning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartOutcome {
    pub task: Task,
    /// The session pointer clients keep for later pause/resume/stop calls.
    pub current_task_id: TaskId,
    pub disposition: StartDisposition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopOutcome {
    pub task: Task,
    pub run: RunTime,
    pub order_actual_cost_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelOutcome {
    pub task: Task,
    /// Active seconds recorded on the closing event, when the log allowed it.
    pub active_seconds: Option<i64>,
    pub order_actual_cost_total: f64,
}

impl Database {
    /// Clocks a worker in on a workstation.
    pub fn start_task(&mut self, request: &StartRequest) -> Result<StartOutcome, DbError> {
        self.start_task_at(request, Timestamp::now())
    }

    /// Clocks a worker in on a workstation at `now`.
    ///
    /// A busy workstation fails unless its task has the same order, service
    /// name and worker, in which case that task is returned unchanged.
    pub fn start_task_at(
        &mut self,
        request: &StartRequest,
        now: Timestamp,
    ) -> Result<StartOutcome, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let resource = load_resource(&tx, &request.resource_id)?
            .ok_or_else(|| DbError::not_found("resource", &request.resource_id))?;
        if !order_exists(&tx, &request.order_id)? {
            return Err(DbError::not_found("order", &request.order_id));
        }
        let service = load_service(&tx, &request.service_id)?
            .ok_or_else(|| DbError::not_found("service", &request.service_id))?;

        match resource.occupancy_status {
            ResourceStatus::Idle => {}
            ResourceStatus::Maintenance => {
                tracing::warn!(resource_id = %resource.id, "start rejected: resource under maintenance");
                return Err(DbError::ResourceUnavailable {
                    resource_id: resource.id,
                    status: resource.occupancy_status,
                });
            }
            ResourceStatus::Active | ResourceStatus::Paused => {
                let holder = holding_task(&tx, &resource)?;
                if holder.matches_context(&request.order_id, &service.name, &request.worker_id) {
                    tracing::info!(
                        task_id = %holder.id,
                        resource_id = %resource.id,
                        "start retried for the running task"
                    );
                    return Ok(StartOutcome {
                        current_task_id: holder.id.clone(),
                        task: holder,
                        disposition: StartDisposition::AlreadyRunning,
                    });
                }
                tracing::warn!(
                    resource_id = %resource.id,
                    task_id = %holder.id,
                    "start rejected: resource busy"
                );
                return Err(DbError::ResourceBusy {
                    resource_id: resource.id,
                    task_id: holder.id,
                    status: holder.status,
                });
            }
        }

        let (mut task, disposition) =
            match find_reusable_task(&tx, &request.order_id, &resource.id, &service.id)? {
                Some(task) => (task, StartDisposition::Reused),
                None => {
                    let id = TaskId::new(Uuid::new_v4().to_string())?;
                    let task = Task::planned(
                        id,
                        request.order_id.clone(),
                        resource.id.clone(),
                        &service,
                    );
                    insert_task(&tx, &task, now)?;
                    (task, StartDisposition::Created)
                }
            };

        if task.status == TaskStatus::Paused {
            if let Some(open) = find_open_pause(&tx, &task.id)? {
                close_pause(&tx, &open, now)?;
            }
        }

        task.status = transition(&task, Operation::Start)?;
        if task.started_at.is_none() {
            task.started_at = Some(now);
        }
        task.assigned_worker_id = Some(request.worker_id.clone());
        update_task(&tx, &task, now)?;
        set_occupancy(&tx, &resource.id, ResourceStatus::Active, Some(&task.id), now)?;
        append_event(&tx, &task.id, &request.worker_id, EventType::Start, now, None)?;
        tx.commit()?;

        tracing::info!(
            task_id = %task.id,
            resource_id = %task.resource_id,
            worker_id = %request.worker_id,
            ?disposition,
            "task started"
        );
        Ok(StartOutcome {
            current_task_id: task.id.clone(),
            task,
            disposition,
        })
    }

    /// Pauses a running task. The workstation stays reserved.
    pub fn pause_task(&mut self, task_id: &TaskId, actor: &WorkerId) -> Result<Task, DbError> {
        self.pause_task_at(task_id, actor, Timestamp::now())
    }

    pub fn pause_task_at(
        &mut self,
        task_id: &TaskId,
        actor: &WorkerId,
        now: Timestamp,
    ) -> Result<Task, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut task = require_task(&tx, task_id)?;
        let next = transition(&task, Operation::Pause)?;
        ensure_holds(&tx, &task)?;
        if let Some(open) = find_open_pause(&tx, &task.id)? {
            return Err(DbError::inconsistency(
                format!("task {task_id}"),
                format!("running task already has an open pause (event {})", open.id),
            ));
        }

        task.status = next;
        update_task(&tx, &task, now)?;
        set_occupancy(&tx, &task.resource_id, ResourceStatus::Paused, Some(&task.id), now)?;
        append_event(&tx, &task.id, actor, EventType::Pause, now, None)?;
        tx.commit()?;

        tracing::info!(task_id = %task.id, resource_id = %task.resource_id, "task paused");
        Ok(task)
    }

    /// Resumes a paused task, closing its open pause.
    pub fn resume_task(&mut self, task_id: &TaskId, actor: &WorkerId) -> Result<Task, DbError> {
        self.resume_task_at(task_id, actor, Timestamp::now())
    }

    pub fn resume_task_at(
        &mut self,
        task_id: &TaskId,
        actor: &WorkerId,
        now: Timestamp,
    ) -> Result<Task, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut task = require_task(&tx, task_id)?;
        let next = transition(&task, Operation::Resume)?;
        ensure_holds(&tx, &task)?;
        let open = find_open_pause(&tx, &task.id)?.ok_or_else(|| {
            DbError::inconsistency(format!("task {task_id}"), "paused task has no open pause")
        })?;
        let pause_seconds = close_pause(&tx, &open, now)?;

        task.status = next;
        update_task(&tx, &task, now)?;
        set_occupancy(&tx, &task.resource_id, ResourceStatus::Active, Some(&task.id), now)?;
        append_event(&tx, &task.id, actor, EventType::Resume, now, None)?;
        tx.commit()?;

        tracing::info!(task_id = %task.id, pause_seconds, "task resumed");
        Ok(task)
    }

    /// Clocks out: reconstructs active time, computes actuals and frees the workstation.
    pub fn stop_task(&mut self, task_id: &TaskId, actor: &WorkerId) -> Result<StopOutcome, DbError> {
        self.stop_task_at(task_id, actor, Timestamp::now())
    }

    pub fn stop_task_at(
        &mut self,
        task_id: &TaskId,
        actor: &WorkerId,
        now: Timestamp,
    ) -> Result<StopOutcome, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut task = require_task(&tx, task_id)?;
        let next = transition(&task, Operation::Stop)?;
        ensure_holds(&tx, &task)?;

        let events = list_events(&tx, &task.id)?;
        let paused = task.status == TaskStatus::Paused;
        let run = reconstruct(&events, paused, now)
            .map_err(|err| DbError::inconsistency(format!("task {task_id}"), err))?;
        if paused {
            if let Some(open) = last_open_pause(&events) {
                close_pause(&tx, open, now)?;
            }
        }

        task.actuals = Some(Actuals::from_active_seconds(
            run.active_seconds,
            &task.estimates(),
        ));
        task.status = next;
        task.ended_at = Some(now);
        task.total_pause_duration_seconds = run.total_pause_seconds();
        update_task(&tx, &task, now)?;
        set_occupancy(&tx, &task.resource_id, ResourceStatus::Idle, None, now)?;
        append_event(
            &tx,
            &task.id,
            actor,
            EventType::Stop,
            now,
            Some(run.active_seconds),
        )?;
        let order_actual_cost_total = recompute_order_actual_cost(&tx, &task.order_id, now)?;
        tx.commit()?;

        tracing::info!(
            task_id = %task.id,
            active_seconds = run.active_seconds,
            pause_seconds = run.total_pause_seconds(),
            order_actual_cost_total,
            "task completed"
        );
        Ok(StopOutcome {
            task,
            run,
            order_actual_cost_total,
        })
    }

    /// Administratively ends a stuck session without computing actuals.
    pub fn cancel_task(
        &mut self,
        task_id: &TaskId,
        actor: &WorkerId,
    ) -> Result<CancelOutcome, DbError> {
        self.cancel_task_at(task_id, actor, Timestamp::now())
    }

    /// Cancels an in-progress or paused task at `now`.
    ///
    /// A log that no longer reconstructs does not block the cancel; the
    /// closing event then carries no elapsed time. The workstation is released
    /// only if it still points at this task.
    pub fn cancel_task_at(
        &mut self,
        task_id: &TaskId,
        actor: &WorkerId,
        now: Timestamp,
    ) -> Result<CancelOutcome, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut task = require_task(&tx, task_id)?;
        let next = transition(&task, Operation::Cancel)?;

        let events = list_events(&tx, &task.id)?;
        let active_seconds = match reconstruct(&events, task.status == TaskStatus::Paused, now) {
            Ok(run) => {
                task.total_pause_duration_seconds = run.total_pause_seconds();
                Some(run.active_seconds)
            }
            Err(err) => {
                tracing::warn!(task_id = %task.id, error = %err, "cancelling task with unreadable log");
                None
            }
        };
        for event in events.iter().filter(|event| event.is_open_pause()) {
            close_pause(&tx, event, now)?;
        }

        task.status = next;
        task.ended_at = Some(now);
        update_task(&tx, &task, now)?;

        let resource = load_resource(&tx, &task.resource_id)?
            .ok_or_else(|| DbError::not_found("resource", &task.resource_id))?;
        if resource.current_task_id.as_ref() == Some(&task.id) {
            set_occupancy(&tx, &resource.id, ResourceStatus::Idle, None, now)?;
        } else {
            tracing::warn!(
                task_id = %task.id,
                resource_id = %resource.id,
                current_task_id = ?resource.current_task_id,
                "cancelled task did not hold its resource"
            );
        }
        append_event(&tx, &task.id, actor, EventType::Stop, now, active_seconds)?;
        let order_actual_cost_total = recompute_order_actual_cost(&tx, &task.order_id, now)?;
        tx.commit()?;

        tracing::info!(task_id = %task.id, actor = %actor, "task cancelled");
        Ok(CancelOutcome {
            task,
            active_seconds,
            order_actual_cost_total,
        })
    }

    /// Puts an idle workstation into maintenance, or returns it to service.
    pub fn set_maintenance(
        &mut self,
        resource_id: &ResourceId,
        maintenance: bool,
    ) -> Result<Resource, DbError> {
        let now = Timestamp::now();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut resource = load_resource(&tx, resource_id)?
            .ok_or_else(|| DbError::not_found("resource", resource_id))?;
        if resource.occupancy_status.is_occupied() {
            let holder = holding_task(&tx, &resource)?;
            return Err(DbError::ResourceBusy {
                resource_id: resource.id,
                task_id: holder.id,
                status: holder.status,
            });
        }

        let status = if maintenance {
            ResourceStatus::Maintenance
        } else {
            ResourceStatus::Idle
        };
        set_occupancy(&tx, &resource.id, status, None, now)?;
        tx.commit()?;

        tracing::info!(resource_id = %resource.id, %status, "resource status changed");
        resource.occupancy_status = status;
        Ok(resource)
    }
}

fn transition(task: &Task, operation: Operation) -> Result<TaskStatus, DbError> {
    task.status.after(operation).ok_or_else(|| {
        tracing::warn!(task_id = %task.id, status = %task.status, %operation, "illegal transition");
        DbError::InvalidTransition {
            task_id: task.id.clone(),
            operation,
            status: task.status,
        }
    })
}

fn require_task(conn: &Connection, task_id: &TaskId) -> Result<Task, DbError> {
    load_task(conn, task_id)?.ok_or_else(|| DbError::not_found("task", task_id))
}

/// Loads the task an occupied workstation points at.
fn holding_task(conn: &Connection, resource: &Resource) -> Result<Task, DbError> {
    let subject = format!("resource {}", resource.id);
    let Some(task_id) = resource.current_task_id.as_ref() else {
        return Err(DbError::inconsistency(
            subject,
            format!("{} without a current task", resource.occupancy_status),
        ));
    };
    load_task(conn, task_id)?.ok_or_else(|| {
        DbError::inconsistency(subject, format!("current task {task_id} does not exist"))
    })
}

/// Checks the Resource → Task ownership edge before changing either side.
fn ensure_holds(conn: &Connection, task: &Task) -> Result<(), DbError> {
    let resource = load_resource(conn, &task.resource_id)?
        .ok_or_else(|| DbError::not_found("resource", &task.resource_id))?;
    let expected = ResourceStatus::for_task(task.status);
    if resource.current_task_id.as_ref() != Some(&task.id)
        || Some(resource.occupancy_status) != expected
    {
        return Err(DbError::inconsistency(
            format!("resource {}", resource.id),
            format!(
                "expected task {} ({}) but found {} with current task {:?}",
                task.id, task.status, resource.occupancy_status, resource.current_task_id
            ),
        ));
    }
    Ok(())
}

fn find_reusable_task(
    conn: &Connection,
    order_id: &OrderId,
    resource_id: &ResourceId,
    service_id: &ServiceId,
) -> Result<Option<Task>, DbError> {
    let sql = format!(
        "
        SELECT {TASK_COLUMNS}
        FROM tasks
        WHERE order_id = ? AND resource_id = ? AND service_id = ?
        ORDER BY created_at DESC, id ASC
        "
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![order_id.as_str(), resource_id.as_str(), service_id.as_str()],
        TaskRow::from_row,
    )?;
    for row in rows {
        let task = row?.into_task()?;
        if task.status.is_reusable() {
            return Ok(Some(task));
        }
    }
    Ok(None)
}

fn insert_task(conn: &Connection, task: &Task, now: Timestamp) -> Result<(), DbError> {
    conn.execute(
        "
        INSERT INTO tasks (
            id, order_id, resource_id, service_id, service_name, assigned_worker_id,
            estimated_quantity, estimated_hours, unit_price, estimated_cost,
            total_pause_duration_seconds, status, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ",
        params![
            task.id.as_str(),
            task.order_id.as_str(),
            task.resource_id.as_str(),
            task.service_id.as_str(),
            task.service_name,
            task.assigned_worker_id.as_ref().map(WorkerId::as_str),
            task.estimated_quantity,
            task.estimated_hours,
            task.unit_price,
            task.estimated_cost,
            task.total_pause_duration_seconds,
            task.status.as_str(),
            now.epoch_seconds(),
            now.epoch_seconds(),
        ],
    )?;
    Ok(())
}

fn update_task(conn: &Connection, task: &Task, now: Timestamp) -> Result<(), DbError> {
    let actuals = task.actuals;
    conn.execute(
        "
        UPDATE tasks
        SET assigned_worker_id = ?,
            actual_hours = ?,
            actual_cost = ?,
            time_variance_hours = ?,
            cost_variance = ?,
            variance_percent = ?,
            total_pause_duration_seconds = ?,
            status = ?,
            started_at = ?,
            ended_at = ?,
            updated_at = ?
        WHERE id = ?
        ",
        params![
            task.assigned_worker_id.as_ref().map(WorkerId::as_str),
            actuals.map(|a| a.actual_hours),
            actuals.map(|a| a.actual_cost),
            actuals.map(|a| a.time_variance_hours),
            actuals.map(|a| a.cost_variance),
            actuals.map(|a| a.variance_percent),
            task.total_pause_duration_seconds,
            task.status.as_str(),
            task.started_at.map(Timestamp::epoch_seconds),
            task.ended_at.map(Timestamp::epoch_seconds),
            now.epoch_seconds(),
            task.id.as_str(),
        ],
    )?;
    Ok(())
}

fn set_occupancy(
    conn: &Connection,
    resource_id: &ResourceId,
    status: ResourceStatus,
    current_task_id: Option<&TaskId>,
    now: Timestamp,
) -> Result<(), DbError> {
    conn.execute(
        "
        UPDATE resources
        SET occupancy_status = ?, current_task_id = ?, updated_at = ?
        WHERE id = ?
        ",
        params![
            status.as_str(),
            current_task_id.map(TaskId::as_str),
            now.epoch_seconds(),
            resource_id.as_str(),
        ],
    )?;
    Ok(())
}

fn append_event(
    conn: &Connection,
    task_id: &TaskId,
    user_id: &WorkerId,
    event_type: EventType,
    at: Timestamp,
    elapsed_seconds: Option<i64>,
) -> Result<i64, DbError> {
    conn.execute(
        "
        INSERT INTO task_events (task_id, user_id, event_type, event_timestamp, elapsed_seconds)
        VALUES (?, ?, ?, ?, ?)
        ",
        params![
            task_id.as_str(),
            user_id.as_str(),
            event_type.as_str(),
            at.epoch_seconds(),
            elapsed_seconds,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// The most recent pause not yet closed by a resume or stop.
fn find_open_pause(conn: &Connection, task_id: &TaskId) -> Result<Option<TaskEvent>, DbError> {
    let events = list_events(conn, task_id)?;
    Ok(last_open_pause(&events).cloned())
}

fn last_open_pause(events: &[TaskEvent]) -> Option<&TaskEvent> {
    events.iter().rev().find(|event| event.is_open_pause())
}

/// Writes the pause length onto an open pause and returns it.
fn close_pause(conn: &Connection, pause: &TaskEvent, now: Timestamp) -> Result<i64, DbError> {
    let pause_seconds = now.seconds_since(pause.event_timestamp).max(0);
    conn.execute(
        "UPDATE task_events SET elapsed_seconds = ? WHERE id = ? AND elapsed_seconds IS NULL",
        params![pause_seconds, pause.id],
    )?;
    Ok(pause_seconds)
}
