//! Active-time reconstruction from a task's event log.
//!
//! The log is the source of truth: nothing accumulates a running counter.
//! Every read recomputes from the events.
//!
//! # Algorithm Summary
//!
//! 1. The run starts at the most recent `START` (`t0`).
//! 2. Gross elapsed time is `now - t0`.
//! 3. `PAUSE` and `RESUME` events after `t0` are each sorted ascending and
//!    paired by position; each pair contributes `resume - pause`.
//! 4. A trailing unpaired `PAUSE` is the open pause. It only counts when the
//!    task is paused, as `now - pause`.
//! 5. Active time is gross time minus all paused time, floored at zero.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event_type::EventType;
use crate::types::Timestamp;

/// An event usable for time reconstruction.
///
/// Lets the algorithm run over stored `TaskEvent`s as well as test fixtures.
pub trait TimedEvent {
    fn event_type(&self) -> EventType;
    fn timestamp(&self) -> Timestamp;
}

/// The event log contradicts the task's state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimingError {
    #[error("event log has no start event")]
    MissingStart,

    #[error("{resumes} resume events follow only {pauses} pause events")]
    UnmatchedResume { pauses: usize, resumes: usize },

    #[error("{open} pause events are open at once")]
    MultipleOpenPauses { open: usize },

    #[error("task is paused but its log has no open pause")]
    MissingOpenPause,

    #[error("task is running but a pause opened at {at} was never closed")]
    UnexpectedOpenPause { at: Timestamp },
}

/// Breakdown of one run's elapsed time, all in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTime {
    pub started_at: Timestamp,
    pub gross_seconds: i64,
    pub closed_pause_seconds: i64,
    pub open_pause_seconds: i64,
    pub active_seconds: i64,
}

impl RunTime {
    pub const fn total_pause_seconds(&self) -> i64 {
        self.closed_pause_seconds + self.open_pause_seconds
    }
}

/// Reconstructs the active time of the current run as of `now`.
///
/// `events` must be in log order (timestamp, then append sequence). `paused`
/// is the task's status at `now`.
pub fn reconstruct<E: TimedEvent>(
    events: &[E],
    paused: bool,
    now: Timestamp,
) -> Result<RunTime, TimingError> {
    let start_index = events
        .iter()
        .rposition(|event| event.event_type() == EventType::Start)
        .ok_or(TimingError::MissingStart)?;
    let started_at = events[start_index].timestamp();
    let run = &events[start_index + 1..];

    let mut pauses: Vec<Timestamp> = run
        .iter()
        .filter(|event| event.event_type() == EventType::Pause)
        .map(TimedEvent::timestamp)
        .collect();
    let mut resumes: Vec<Timestamp> = run
        .iter()
        .filter(|event| event.event_type() == EventType::Resume)
        .map(TimedEvent::timestamp)
        .collect();
    pauses.sort_unstable();
    resumes.sort_unstable();

    if resumes.len() > pauses.len() {
        return Err(TimingError::UnmatchedResume {
            pauses: pauses.len(),
            resumes: resumes.len(),
        });
    }
    let unpaired = pauses.len() - resumes.len();
    if unpaired > 1 {
        return Err(TimingError::MultipleOpenPauses { open: unpaired });
    }

    let closed_pause_seconds: i64 = pauses
        .iter()
        .zip(&resumes)
        .map(|(pause, resume)| resume.seconds_since(*pause))
        .sum();

    let open_pause = if unpaired == 1 { pauses.last().copied() } else { None };
    let open_pause_seconds = match (paused, open_pause) {
        (true, Some(opened_at)) => now.seconds_since(opened_at),
        (true, None) => return Err(TimingError::MissingOpenPause),
        (false, Some(at)) => return Err(TimingError::UnexpectedOpenPause { at }),
        (false, None) => 0,
    };

    let gross_seconds = now.seconds_since(started_at);
    let active_seconds = (gross_seconds - closed_pause_seconds - open_pause_seconds).max(0);

    Ok(RunTime {
        started_at,
        gross_seconds,
        closed_pause_seconds,
        open_pause_seconds,
        active_seconds,
    })
}
