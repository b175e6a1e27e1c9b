//! Command surface exposed to the shell.
//!
//! One [`TimerEngine`] and one [`SessionStore`] per process, each behind a
//! single coarse lock so the surface can be shared across threads. Timer
//! commands never fail; session commands surface storage errors verbatim.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;
use crate::events::Event;
use crate::storage::{Config, SessionRecord, SessionStore, DEFAULT_HISTORY_LIMIT};
use crate::timer::{TimerEngine, TimerReading};

pub struct App {
    engine: Mutex<TimerEngine>,
    store: Mutex<SessionStore>,
    history_limit: usize,
}

impl App {
    /// Fresh engine over an already opened store.
    pub fn new(store: SessionStore) -> Self {
        Self {
            engine: Mutex::new(TimerEngine::new()),
            store: Mutex::new(store),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Startup path: load the configuration, resolve the data directory and
    /// open the store.
    ///
    /// # Errors
    /// Fatal: the data directory cannot be created or the store cannot be
    /// opened. There is no degraded mode.
    pub fn open() -> Result<Self> {
        Self::open_with(&Config::load_or_default())
    }

    /// Same as [`App::open`] with an already loaded configuration.
    ///
    /// # Errors
    /// See [`App::open`].
    pub fn open_with(config: &Config) -> Result<Self> {
        let store = SessionStore::open()?;
        Ok(Self::new(store).with_history_limit(config.history.recent_limit))
    }

    /// Cap used by [`App::get_session_history`].
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Copy of the current engine state, for persistence.
    pub fn engine(&self) -> TimerEngine {
        self.lock_engine().clone()
    }

    /// Replace the engine with a previously persisted one.
    pub fn restore_engine(&self, engine: TimerEngine) {
        *self.lock_engine() = engine;
    }

    /// Direct access to the store (kv state, ad-hoc queries).
    pub fn store(&self) -> MutexGuard<'_, SessionStore> {
        lock_recovering(&self.store, "session store")
    }

    fn lock_engine(&self) -> MutexGuard<'_, TimerEngine> {
        lock_recovering(&self.engine, "timer engine")
    }

    // ── Timer commands ───────────────────────────────────────────────

    pub fn set_task(&self, task: &str) -> Event {
        self.lock_engine().set_task(task)
    }

    pub fn get_task(&self) -> String {
        self.lock_engine().task().to_string()
    }

    pub fn start_timer(&self, duration_secs: u64) -> Option<Event> {
        self.lock_engine().start(duration_secs)
    }

    pub fn pause_timer(&self) -> Option<Event> {
        self.lock_engine().pause()
    }

    pub fn reset_timer(&self) -> Event {
        self.lock_engine().reset()
    }

    pub fn get_timer(&self) -> TimerReading {
        self.lock_engine().reading()
    }

    pub fn update_remaining(&self, remaining_secs: u64) -> Option<Event> {
        self.lock_engine().update_remaining(remaining_secs)
    }

    pub fn snapshot(&self) -> Event {
        self.lock_engine().snapshot()
    }

    // ── Session commands ─────────────────────────────────────────────

    /// Record a completed session for the current task.
    ///
    /// Returns `Ok(None)` when nothing was recorded because no task is set.
    pub fn save_completed_session(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        completed_cycles: u32,
    ) -> Result<Option<Event>> {
        let task = self.get_task();
        let id = self.store().save_completed(&task, start, end, completed_cycles)?;
        Ok(id.map(|id| saved_event(id, task, completed_cycles, true)))
    }

    /// Record a partial session for the current task.
    ///
    /// Returns `Ok(None)` when no task is set or no cycle was completed.
    pub fn save_partial_session(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        completed_cycles: u32,
    ) -> Result<Option<Event>> {
        let task = self.get_task();
        let id = self.store().save_partial(&task, start, end, completed_cycles)?;
        Ok(id.map(|id| saved_event(id, task, completed_cycles, false)))
    }

    pub fn get_sessions_by_date(&self, date: NaiveDate) -> Result<Vec<SessionRecord>> {
        self.store().query_by_date(date)
    }

    pub fn get_session_history(&self) -> Result<Vec<SessionRecord>> {
        self.store().query_recent(self.history_limit)
    }
}

fn saved_event(id: i64, task: String, completed_cycles: u32, is_completed: bool) -> Event {
    Event::SessionSaved {
        id,
        task,
        completed_cycles,
        is_completed,
        at: Utc::now(),
    }
}

/// Every operation leaves the state consistent, so a panic in another
/// holder doesn't invalidate it.
fn lock_recovering<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
        tracing::warn!(what, "recovering poisoned lock");
        poisoned.into_inner()
    })
}
