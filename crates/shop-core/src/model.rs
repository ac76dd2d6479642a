//! Workstations, tasks and the event log records they produce.

use serde::{Deserialize, Serialize};

use crate::costing::{Actuals, Estimates};
use crate::event_type::EventType;
use crate::status::{ResourceStatus, TaskStatus};
use crate::timing::TimedEvent;
use crate::types::{OrderId, ResourceId, ServiceId, TaskId, Timestamp, WorkerId};

/// A physical workstation with singleton occupancy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub occupancy_status: ResourceStatus,
    /// Weak reference to the holding task. Set iff the status is occupied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task_id: Option<TaskId>,
}

/// A catalog entry used to seed a new task's estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub id: ServiceId,
    pub name: String,
    pub default_quantity: f64,
    pub default_hours: f64,
    pub default_unit_price: f64,
}

/// One unit of scheduled shop-floor work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub order_id: OrderId,
    pub resource_id: ResourceId,
    pub service_id: ServiceId,
    pub service_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_worker_id: Option<WorkerId>,

    pub estimated_quantity: f64,
    pub estimated_hours: f64,
    pub unit_price: f64,
    /// `estimated_quantity × unit_price`, fixed at creation.
    pub estimated_cost: f64,

    /// Null until the task is stopped.
    pub actuals: Option<Actuals>,
    /// Paused time of the most recently completed run.
    pub total_pause_duration_seconds: i64,

    pub status: TaskStatus,
    /// Set by the first start and preserved across reuse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<Timestamp>,
}

impl Task {
    /// Creates a planned task seeded from a catalog entry.
    pub fn planned(
        id: TaskId,
        order_id: OrderId,
        resource_id: ResourceId,
        service: &ServiceDefinition,
    ) -> Self {
        Self {
            id,
            order_id,
            resource_id,
            service_id: service.id.clone(),
            service_name: service.name.clone(),
            assigned_worker_id: None,
            estimated_quantity: service.default_quantity,
            estimated_hours: service.default_hours,
            unit_price: service.default_unit_price,
            estimated_cost: service.default_quantity * service.default_unit_price,
            actuals: None,
            total_pause_duration_seconds: 0,
            status: TaskStatus::Planned,
            started_at: None,
            ended_at: None,
        }
    }

    pub const fn estimates(&self) -> Estimates {
        Estimates {
            estimated_hours: self.estimated_hours,
            unit_price: self.unit_price,
            estimated_cost: self.estimated_cost,
        }
    }

    /// Whether a start request for this context is a retry of the run that
    /// already holds the workstation.
    pub fn matches_context(
        &self,
        order_id: &OrderId,
        service_name: &str,
        worker_id: &WorkerId,
    ) -> bool {
        &self.order_id == order_id
            && self.service_name == service_name
            && self.assigned_worker_id.as_ref() == Some(worker_id)
    }
}

/// An immutable entry in a task's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEvent {
    /// Append sequence; breaks ties between equal timestamps.
    pub id: i64,
    pub task_id: TaskId,
    pub user_id: WorkerId,
    pub event_type: EventType,
    pub event_timestamp: Timestamp,
    /// PAUSE: null while open, then the pause length. STOP: active seconds.
    #[serde(default)]
    pub elapsed_seconds: Option<i64>,
}

impl TaskEvent {
    pub const fn is_open_pause(&self) -> bool {
        matches!(self.event_type, EventType::Pause) && self.elapsed_seconds.is_none()
    }
}

impl TimedEvent for TaskEvent {
    fn event_type(&self) -> EventType {
        self.event_type
    }

    fn timestamp(&self) -> Timestamp {
        self.event_timestamp
    }
}

/// A task plus its live duration, for timer displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    #[serde(flatten)]
    pub task: Task,
    pub live_duration_seconds: i64,
}

/// Answer to "does this worker have a session in flight?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTaskCheck {
    pub has_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
}
