//! Shell-side session tracking.
//!
//! The CLI is a one-shot process, so everything the desktop shell would
//! keep in memory (the engine, when the session started, how many cycles
//! finished) is persisted in the store's kv table between invocations.
//! The shell also owns the countdown: the engine never ticks, so every
//! command first advances `remaining` by the wall-clock time elapsed since
//! the timer was last started or resumed.

use chrono::{DateTime, Duration, Utc};
use pmo_core::{App, Config, CoreError, Event, SessionStore, TimerEngine, TimerState};
use serde::{Deserialize, Serialize};

const SHELL_KEY: &str = "shell_state";

/// What survives between CLI invocations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShellState {
    pub engine: TimerEngine,
    /// First start from idle of the current session.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// Last start or resume; `None` unless running.
    #[serde(default)]
    pub resumed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_cycles: u32,
}

impl ShellState {
    fn load(store: &SessionStore) -> Result<Self, CoreError> {
        let Some(json) = store.kv_get(SHELL_KEY)? else {
            return Ok(Self::default());
        };
        match serde_json::from_str(&json) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable shell state");
                store.kv_delete(SHELL_KEY)?;
                Ok(Self::default())
            }
        }
    }
}

pub struct Shell {
    app: App,
    started_at: Option<DateTime<Utc>>,
    resumed_at: Option<DateTime<Utc>>,
    completed_cycles: u32,
    focus_duration_secs: u64,
}

impl Shell {
    /// Open the default store and restore the previous shell state.
    pub fn open() -> Result<Self, CoreError> {
        let config = Config::load_or_default();
        let app = App::open_with(&config)?;
        Self::attach(app, &config)
    }

    /// Restore the shell over an already opened store.
    pub fn restore(store: SessionStore, config: &Config) -> Result<Self, CoreError> {
        let app = App::new(store).with_history_limit(config.history.recent_limit);
        Self::attach(app, config)
    }

    fn attach(app: App, config: &Config) -> Result<Self, CoreError> {
        let state = ShellState::load(&app.store())?;
        app.restore_engine(state.engine);
        Ok(Self {
            app,
            started_at: state.started_at,
            resumed_at: state.resumed_at,
            completed_cycles: state.completed_cycles,
            focus_duration_secs: config.focus_duration_secs(),
        })
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn state(&self) -> ShellState {
        ShellState {
            engine: self.app.engine(),
            started_at: self.started_at,
            resumed_at: self.resumed_at,
            completed_cycles: self.completed_cycles,
        }
    }

    /// Write the shell state back to the store.
    pub fn persist(&self) -> Result<(), CoreError> {
        let json = serde_json::to_string(&self.state())?;
        self.app.store().kv_set(SHELL_KEY, &json)
    }

    /// Advance the countdown to `now`. Returns the number of cycles that
    /// finished in the meantime.
    ///
    /// Only whole seconds are consumed; `resumed_at` moves forward by exactly
    /// that much so the sub-second remainder carries over to the next call.
    pub fn sync(&mut self, now: DateTime<Utc>) -> u32 {
        let engine = self.app.engine();
        if engine.state() != TimerState::Running {
            return 0;
        }
        let Some(resumed_at) = self.resumed_at else {
            self.resumed_at = Some(now);
            return 0;
        };

        let elapsed_secs = (now - resumed_at).num_seconds().max(0);
        let elapsed = u64::try_from(elapsed_secs).unwrap_or(0);
        let (remaining, finished) =
            countdown(engine.remaining_secs(), engine.configured_secs(), elapsed);

        self.app.update_remaining(remaining);
        self.completed_cycles = self.completed_cycles.saturating_add(finished);
        self.resumed_at = Some(resumed_at + Duration::seconds(elapsed_secs));
        if finished > 0 {
            tracing::info!(finished, total = self.completed_cycles, "pomodoro cycle finished");
        }
        finished
    }

    pub fn set_task(&mut self, task: &str, now: DateTime<Utc>) -> Event {
        self.sync(now);
        self.app.set_task(task)
    }

    /// Start or resume. Without a duration the configured focus duration is used.
    pub fn start(&mut self, duration_secs: Option<u64>, now: DateTime<Utc>) -> Option<Event> {
        self.sync(now);
        let was_idle = self.app.get_timer().phase == TimerState::Idle;
        let event = self
            .app
            .start_timer(duration_secs.unwrap_or(self.focus_duration_secs))?;

        self.resumed_at = Some(now);
        if was_idle {
            self.started_at = Some(now);
            self.completed_cycles = 0;
        }
        Some(event)
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.sync(now);
        let event = self.app.pause_timer()?;
        self.resumed_at = None;
        Some(event)
    }

    /// Record whatever the session achieved as a partial session, then reset.
    pub fn reset(&mut self, now: DateTime<Utc>) -> Result<(Option<Event>, Event), CoreError> {
        self.sync(now);
        let saved = match self.started_at {
            Some(start) => self
                .app
                .save_partial_session(start, now, self.completed_cycles)?,
            None => None,
        };
        Ok((saved, self.clear()))
    }

    /// Record the session as completed, then reset.
    pub fn complete(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<(Option<Event>, Event), Box<dyn std::error::Error>> {
        self.sync(now);
        let start = self
            .started_at
            .ok_or("no session in progress; start the timer first")?;
        let saved = self
            .app
            .save_completed_session(start, now, self.completed_cycles)?;
        Ok((saved, self.clear()))
    }

    pub fn completed_cycles(&self) -> u32 {
        self.completed_cycles
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    fn clear(&mut self) -> Event {
        self.started_at = None;
        self.resumed_at = None;
        self.completed_cycles = 0;
        self.app.reset_timer()
    }
}

/// Run `elapsed` seconds off a countdown that re-arms at `configured` every
/// time it reaches zero. Returns the new remaining time and how many times
/// zero was reached. A zero-length timer never finishes a cycle.
fn countdown(remaining: u64, configured: u64, elapsed: u64) -> (u64, u32) {
    if configured == 0 {
        return (0, 0);
    }
    if elapsed == 0 || elapsed < remaining {
        return (remaining.saturating_sub(elapsed), 0);
    }
    let overshoot = elapsed - remaining;
    let finished = 1 + overshoot / configured;
    let remaining = configured - overshoot % configured;
    (remaining, u32::try_from(finished).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    fn shell() -> Shell {
        Shell::restore(SessionStore::open_memory().unwrap(), &Config::default()).unwrap()
    }

    #[test]
    fn countdown_within_cycle() {
        assert_eq!(countdown(1500, 1500, 100), (1400, 0));
    }

    #[test]
    fn countdown_rearms_on_zero() {
        assert_eq!(countdown(100, 1500, 100), (1500, 1));
        assert_eq!(countdown(100, 1500, 1600), (1500, 2));
        assert_eq!(countdown(100, 1500, 700), (900, 1));
    }

    #[test]
    fn countdown_with_zero_duration() {
        assert_eq!(countdown(0, 0, 10), (0, 0));
        assert_eq!(countdown(1500, 1500, 0), (1500, 0));
    }

    #[test]
    fn start_uses_configured_focus_duration() {
        let mut shell = shell();
        shell.start(None, t0()).unwrap();
        assert_eq!(shell.app().get_timer().seconds, 1500);
        assert_eq!(shell.started_at(), Some(t0()));
    }

    #[test]
    fn sync_counts_cycles_and_decrements() {
        let mut shell = shell();
        shell.set_task("Write report", t0());
        shell.start(Some(600), t0());

        assert_eq!(shell.sync(t0() + Duration::seconds(200)), 0);
        assert_eq!(shell.app().get_timer().seconds, 400);

        assert_eq!(shell.sync(t0() + Duration::seconds(700)), 1);
        assert_eq!(shell.app().get_timer().seconds, 500);
        assert_eq!(shell.completed_cycles(), 1);
    }

    #[test]
    fn frequent_polls_keep_sub_second_remainders() {
        let mut shell = shell();
        shell.start(Some(600), t0());

        let step = Duration::milliseconds(900);
        let mut now = t0();
        for _ in 0..67 {
            now += step;
            shell.sync(now);
        }

        // 67 * 0.9 s = 60.3 s of wall-clock time
        assert_eq!(shell.app().get_timer().seconds, 540);
    }

    #[test]
    fn frequent_polls_still_finish_cycles() {
        let mut shell = shell();
        shell.set_task("Read", t0());
        shell.start(Some(2), t0());

        let mut now = t0();
        for _ in 0..10 {
            now += Duration::milliseconds(500);
            shell.sync(now);
        }
        assert_eq!(shell.completed_cycles(), 2);

        let (saved, _) = shell.reset(now).unwrap();
        assert!(saved.is_some());
    }

    #[test]
    fn paused_time_does_not_count() {
        let mut shell = shell();
        shell.start(Some(600), t0());
        shell.pause(t0() + Duration::seconds(100));
        assert_eq!(shell.sync(t0() + Duration::hours(5)), 0);
        assert_eq!(shell.app().get_timer().seconds, 500);

        let resumed = t0() + Duration::hours(5);
        shell.start(Some(60), resumed);
        shell.sync(resumed + Duration::seconds(50));
        assert_eq!(shell.app().get_timer().seconds, 450);
        assert_eq!(shell.app().engine().configured_secs(), 600);
    }

    #[test]
    fn reset_saves_partial_session_with_cycles() {
        let mut shell = shell();
        shell.set_task("Read", t0());
        shell.start(Some(60), t0());

        let (saved, _) = shell.reset(t0() + Duration::seconds(150)).unwrap();
        assert!(matches!(
            saved,
            Some(Event::SessionSaved { completed_cycles: 2, is_completed: false, .. })
        ));
        assert_eq!(shell.app().get_task(), "");
        assert_eq!(shell.completed_cycles(), 0);
        assert_eq!(shell.started_at(), None);
    }

    #[test]
    fn reset_without_cycles_saves_nothing() {
        let mut shell = shell();
        shell.set_task("Read", t0());
        shell.start(Some(600), t0());

        let (saved, _) = shell.reset(t0() + Duration::seconds(30)).unwrap();
        assert!(saved.is_none());
        assert_eq!(shell.app().store().session_count().unwrap(), 0);
    }

    #[test]
    fn complete_saves_and_resets() {
        let mut shell = shell();
        shell.set_task("Write report", t0());
        shell.start(Some(1500), t0());

        let end = t0() + Duration::minutes(26);
        let (saved, _) = shell.complete(end).unwrap();
        assert!(saved.is_some());

        let history = shell.app().get_session_history().unwrap();
        assert_eq!(history[0].duration_min, 26);
        assert_eq!(history[0].completed_cycles, 1);
        assert!(history[0].is_completed);
        assert_eq!(shell.app().get_timer().phase, TimerState::Idle);
    }

    #[test]
    fn complete_without_session_is_an_error() {
        let mut shell = shell();
        assert!(shell.complete(t0()).is_err());
    }

    #[test]
    fn state_survives_persist_and_restore() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("pmo.db");
        let config = Config::default();

        {
            let mut shell = Shell::restore(SessionStore::open_at(&path).unwrap(), &config).unwrap();
            shell.set_task("Persist", t0());
            shell.start(Some(300), t0());
            shell.persist().unwrap();
        }

        let mut shell = Shell::restore(SessionStore::open_at(&path).unwrap(), &config).unwrap();
        assert_eq!(shell.app().get_task(), "Persist");
        assert_eq!(shell.started_at(), Some(t0()));
        shell.sync(t0() + Duration::seconds(100));
        assert_eq!(shell.app().get_timer().seconds, 200);
    }

    #[test]
    fn restored_engine_is_clamped_to_its_duration() {
        let store = SessionStore::open_memory().unwrap();
        store
            .kv_set(
                SHELL_KEY,
                r#"{"engine":{"task":"Edited","state":"paused","configured_secs":60,"remaining_secs":9000}}"#,
            )
            .unwrap();
        let shell = Shell::restore(store, &Config::default()).unwrap();
        let engine = shell.app().engine();
        assert_eq!(engine.task(), "Edited");
        assert_eq!(engine.remaining_secs(), 60);
    }

    #[test]
    fn unreadable_state_falls_back_to_default() {
        let store = SessionStore::open_memory().unwrap();
        store.kv_set(SHELL_KEY, "{not json").unwrap();
        let shell = Shell::restore(store, &Config::default()).unwrap();
        assert_eq!(shell.state(), ShellState::default());
        assert!(shell.app().store().kv_get(SHELL_KEY).unwrap().is_none());
    }
}
