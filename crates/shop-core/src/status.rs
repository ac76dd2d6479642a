//! Task and workstation status enums, and the task state machine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// Lifecycle status of a task.
///
/// ```text
/// PLANNED ──start──▶ IN_PROGRESS ──pause──▶ PAUSED
///                     ▲    │  ◀──resume───┘  │
///                     │    stop/cancel       stop/cancel
///          start (reuse)   ▼                 ▼
///  PAUSED ────────────┘  COMPLETED / CANCELLED (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Planned,
    InProgress,
    Paused,
    Completed,
    Cancelled,
}

/// A mutating request against a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Start,
    Pause,
    Resume,
    Stop,
    Cancel,
}

impl TaskStatus {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the task currently holds its workstation.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::InProgress | Self::Paused)
    }

    /// Completed and cancelled tasks are retained for audit and never reused.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Statuses an idle-resource `start` may pick up instead of creating a task.
    #[must_use]
    pub const fn is_reusable(self) -> bool {
        matches!(self, Self::Planned | Self::Paused)
    }

    /// The status reached by applying `op`, or `None` if the transition is illegal.
    #[must_use]
    pub const fn after(self, op: Operation) -> Option<Self> {
        match (self, op) {
            (Self::Planned | Self::Paused, Operation::Start)
            | (Self::Paused, Operation::Resume) => Some(Self::InProgress),
            (Self::InProgress, Operation::Pause) => Some(Self::Paused),
            (Self::InProgress | Self::Paused, Operation::Stop) => Some(Self::Completed),
            (Self::InProgress | Self::Paused, Operation::Cancel) => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(Self::Planned),
            "in_progress" => Ok(Self::InProgress),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ValidationError::UnknownStatus {
                field: "task status",
                value: s.to_string(),
            }),
        }
    }
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
            Self::Cancel => "cancel",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Occupancy status of a workstation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Idle,
    Active,
    Paused,
    Maintenance,
}

impl ResourceStatus {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Maintenance => "maintenance",
        }
    }

    /// Whether a task holds the workstation (`current_task_id` must be set).
    #[must_use]
    pub const fn is_occupied(self) -> bool {
        matches!(self, Self::Active | Self::Paused)
    }

    /// The occupancy status mirroring a holding task's status.
    #[must_use]
    pub const fn for_task(status: TaskStatus) -> Option<Self> {
        match status {
            TaskStatus::InProgress => Some(Self::Active),
            TaskStatus::Paused => Some(Self::Paused),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "maintenance" => Ok(Self::Maintenance),
            _ => Err(ValidationError::UnknownStatus {
                field: "resource status",
                value: s.to_string(),
            }),
        }
    }
}
