//! Timer engine implementation.
//!
//! The timer engine is a passive state machine. It never ticks on its own:
//! the shell drives the countdown and reports it back through
//! [`TimerEngine::update_remaining`], or simply polls the engine at
//! transition points.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running -> ... -> (reset) -> Idle
//! ```
//!
//! Every command is total. Calls that make no sense in the current state
//! (pausing while idle, starting while running) return `None` and leave the
//! state untouched.
//!
//! ## Usage
//!
//! ```
//! use pmo_core::timer::{TimerEngine, TimerState};
//!
//! let mut engine = TimerEngine::new();
//! engine.set_task("Write report");
//! engine.start(1500);
//! engine.pause();
//! // Resuming ignores the new duration.
//! engine.start(900);
//! assert_eq!(engine.reading().seconds, 1500);
//! assert_eq!(engine.state(), TimerState::Running);
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;

/// Duration armed on a fresh engine: 25 minutes.
pub const DEFAULT_DURATION_SECS: u64 = 25 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    /// Not started yet, or reset. Also covers "stopped at zero" since the
    /// engine never transitions on expiry by itself.
    Idle,
    Running,
    Paused,
}

/// What the display should show.
///
/// `seconds` is the configured duration while idle and the remaining time
/// once started or paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerReading {
    pub phase: TimerState,
    pub seconds: u64,
}

/// Core timer engine.
///
/// Single owned instance per process; wrap it in a lock if it has to be
/// shared across threads (see [`crate::app::App`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredEngine")]
pub struct TimerEngine {
    task: String,
    state: TimerState,
    /// Duration last set by a start from idle, in seconds.
    configured_secs: u64,
    /// Countdown value in seconds. Never exceeds `configured_secs`.
    remaining_secs: u64,
}

/// Persisted form. Restoring goes through [`From`] so a hand-edited value
/// cannot break the `remaining <= configured` invariant.
#[derive(Deserialize)]
struct StoredEngine {
    #[serde(default)]
    task: String,
    state: TimerState,
    configured_secs: u64,
    remaining_secs: u64,
}

impl From<StoredEngine> for TimerEngine {
    fn from(stored: StoredEngine) -> Self {
        let remaining_secs = match stored.state {
            TimerState::Idle => stored.configured_secs,
            TimerState::Running | TimerState::Paused => {
                stored.remaining_secs.min(stored.configured_secs)
            }
        };
        Self {
            task: stored.task,
            state: stored.state,
            configured_secs: stored.configured_secs,
            remaining_secs,
        }
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerEngine {
    /// Create an idle engine armed with [`DEFAULT_DURATION_SECS`] and no task.
    pub fn new() -> Self {
        Self {
            task: String::new(),
            state: TimerState::Idle,
            configured_secs: DEFAULT_DURATION_SECS,
            remaining_secs: DEFAULT_DURATION_SECS,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn configured_secs(&self) -> u64 {
        self.configured_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == TimerState::Paused
    }

    /// Tagged display value.
    pub fn reading(&self) -> TimerReading {
        let seconds = match self.state {
            TimerState::Idle => self.configured_secs,
            TimerState::Running | TimerState::Paused => self.remaining_secs,
        };
        TimerReading {
            phase: self.state,
            seconds,
        }
    }

    /// The untagged display value: configured duration while idle,
    /// remaining time otherwise.
    pub fn timer_secs(&self) -> u64 {
        self.reading().seconds
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let reading = self.reading();
        Event::StateSnapshot {
            task: self.task.clone(),
            phase: reading.phase,
            seconds: reading.seconds,
            configured_secs: self.configured_secs,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Overwrite the current task. An empty name means "no active task".
    pub fn set_task(&mut self, name: impl Into<String>) -> Event {
        self.task = name.into();
        tracing::debug!(task = %self.task, "task changed");
        Event::TaskChanged {
            task: self.task.clone(),
            at: Utc::now(),
        }
    }

    /// Start from idle, or resume from paused.
    ///
    /// `duration_secs` only applies when starting from idle; a resume keeps
    /// the paused progress. Starting while running is a no-op.
    pub fn start(&mut self, duration_secs: u64) -> Option<Event> {
        match self.state {
            TimerState::Running => None,
            TimerState::Paused => {
                self.state = TimerState::Running;
                tracing::debug!(remaining_secs = self.remaining_secs, "timer resumed");
                Some(Event::TimerResumed {
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            TimerState::Idle => {
                self.configured_secs = duration_secs;
                self.remaining_secs = duration_secs;
                self.state = TimerState::Running;
                tracing::debug!(duration_secs, "timer started");
                Some(Event::TimerStarted {
                    duration_secs,
                    at: Utc::now(),
                })
            }
        }
    }

    /// Pause a running timer, keeping `remaining` as the snapshot of time left.
    pub fn pause(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Running => {
                self.state = TimerState::Paused;
                tracing::debug!(remaining_secs = self.remaining_secs, "timer paused");
                Some(Event::TimerPaused {
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    /// Re-arm at the last configured duration and clear the task.
    pub fn reset(&mut self) -> Event {
        self.state = TimerState::Idle;
        self.remaining_secs = self.configured_secs;
        self.task.clear();
        tracing::debug!(configured_secs = self.configured_secs, "timer reset");
        Event::TimerReset {
            configured_secs: self.configured_secs,
            at: Utc::now(),
        }
    }

    /// Report the shell's countdown back to the engine.
    ///
    /// Only applies while running. Values above the configured duration are
    /// clamped to it.
    pub fn update_remaining(&mut self, remaining_secs: u64) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.remaining_secs = remaining_secs.min(self.configured_secs);
        Some(Event::RemainingUpdated {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }
}
