//! Read-only consistency check between workstations and tasks.

use std::fmt;

use serde::Serialize;

use shop_core::{ResourceStatus, TaskStatus};

use crate::{Database, DbError, TASK_COLUMNS, TaskRow, load_resource, load_task};

/// One broken occupancy invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvariantViolation {
    pub subject: String,
    pub detail: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.detail)
    }
}

impl Database {
    /// Lists every place where workstation occupancy and task status disagree.
    ///
    /// Checks both directions: an occupied workstation must point at a task
    /// in the matching status on that workstation, and every in-progress or
    /// paused task must be the one its workstation points at.
    pub fn check_occupancy_invariants(&self) -> Result<Vec<InvariantViolation>, DbError> {
        let mut violations = Vec::new();
        let mut report = |subject: String, detail: String| {
            tracing::warn!(%subject, %detail, "occupancy invariant violated");
            violations.push(InvariantViolation { subject, detail });
        };

        for resource in self.list_resources()? {
            let subject = format!("resource {}", resource.id);
            match (resource.occupancy_status, &resource.current_task_id) {
                (ResourceStatus::Idle | ResourceStatus::Maintenance, None) => {}
                (status, Some(task_id)) if !status.is_occupied() => {
                    report(subject, format!("{status} but points at task {task_id}"));
                }
                (status, None) => {
                    report(subject, format!("{status} without a current task"));
                }
                (status, Some(task_id)) => match load_task(&self.conn, task_id)? {
                    None => report(subject, format!("current task {task_id} does not exist")),
                    Some(task) => {
                        if task.resource_id != resource.id {
                            report(
                                subject.clone(),
                                format!("current task {task_id} belongs to {}", task.resource_id),
                            );
                        }
                        if ResourceStatus::for_task(task.status) != Some(status) {
                            report(
                                subject,
                                format!("{status} but current task {task_id} is {}", task.status),
                            );
                        }
                    }
                },
            }
        }

        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE status IN ('in_progress', 'paused') ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], TaskRow::from_row)?;
        for row in rows {
            let task = row?.into_task()?;
            let subject = format!("task {}", task.id);
            match load_resource(&self.conn, &task.resource_id)? {
                None => report(subject, format!("resource {} does not exist", task.resource_id)),
                Some(resource) if resource.current_task_id.as_ref() != Some(&task.id) => {
                    report(
                        subject,
                        format!(
                            "{} but resource {} does not point at it",
                            task.status, resource.id
                        ),
                    );
                }
                Some(_) => {}
            }
        }

        let open_pauses: Vec<(String, String)> = {
            let mut stmt = self.conn.prepare(
                "
                SELECT e.task_id, t.status
                FROM task_events e
                JOIN tasks t ON t.id = e.task_id
                WHERE e.event_type = 'pause' AND e.elapsed_seconds IS NULL
                  AND t.status != 'paused'
                ORDER BY e.task_id
                ",
            )?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect::<Result<_, _>>()?
        };
        for (task_id, status) in open_pauses {
            let status: TaskStatus = status.parse()?;
            report(format!("task {task_id}"), format!("{status} but has an open pause"));
        }

        Ok(violations)
    }
}
