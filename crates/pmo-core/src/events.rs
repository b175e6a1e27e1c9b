use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerState;

/// Every applied command produces an Event.
/// The shell prints them; a `None` in place of an event means the command
/// was a no-op and left the state untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TaskChanged {
        task: String,
        at: DateTime<Utc>,
    },
    TimerStarted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        configured_secs: u64,
        at: DateTime<Utc>,
    },
    RemainingUpdated {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        task: String,
        phase: TimerState,
        seconds: u64,
        configured_secs: u64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionSaved {
        id: i64,
        task: String,
        completed_cycles: u32,
        is_completed: bool,
        at: DateTime<Utc>,
    },
}
