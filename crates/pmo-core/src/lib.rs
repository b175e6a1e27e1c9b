//! # pmo Core Library
//!
//! Core logic for the pmo Pomodoro timer. The shell (the `pmo` CLI, or any
//! GUI) issues commands against a single timer and polls it for display
//! state; finished sessions are appended to a local SQLite store.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a passive state machine (`Idle`, `Running`, `Paused`).
//!   It never ticks by itself; the shell owns the countdown.
//! - **Storage**: SQLite-based session log plus TOML configuration
//! - **App**: the command surface, sharing one engine and one store handle
//!   behind coarse locks
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`SessionStore`]: Session persistence and history queries
//! - [`App`]: Command surface for shells
//! - [`Config`]: Application configuration management

pub mod app;
pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use app::App;
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use events::Event;
pub use storage::{Config, SessionRecord, SessionStore};
pub use timer::{TimerEngine, TimerReading, TimerState};
