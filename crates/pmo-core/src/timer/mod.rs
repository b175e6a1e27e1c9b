mod engine;

pub use engine::{TimerEngine, TimerReading, TimerState, DEFAULT_DURATION_SECS};
