//! Core domain logic for shop-floor time tracking.
//!
//! This crate contains the fundamental types and logic for:
//! - Identifiers and the epoch-second time base
//! - Task and workstation statuses, including the task state machine
//! - Active-time reconstruction from a task's event log
//! - Actual hours, cost and variance derived from active time

pub mod costing;
pub mod event_type;
pub mod model;
pub mod status;
pub mod timing;
pub mod types;

pub use costing::{Actuals, Estimates, round2};
pub use event_type::{EventType, UnknownEventType};
pub use model::{ActiveTaskCheck, Resource, ServiceDefinition, Task, TaskEvent, TaskSnapshot};
pub use status::{Operation, ResourceStatus, TaskStatus};
pub use timing::{RunTime, TimedEvent, TimingError, reconstruct};
pub use types::{OrderId, ResourceId, ServiceId, TaskId, Timestamp, ValidationError, WorkerId};
