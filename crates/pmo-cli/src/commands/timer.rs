use chrono::Utc;
use clap::Subcommand;

use super::{print_event_or_snapshot, print_json};
use crate::shell::Shell;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the timer, or resume it when paused
    Start {
        /// Duration in seconds (defaults to timer.focus_duration from config).
        /// Ignored when resuming.
        #[arg(long)]
        duration: Option<u64>,
    },
    /// Pause the running timer
    Pause,
    /// Record a partial session if a cycle finished, then reset to idle
    Reset,
    /// Print current timer state as JSON
    Status,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut shell = Shell::open()?;
    let now = Utc::now();

    match action {
        TimerAction::Start { duration } => {
            let event = shell.start(duration, now);
            print_event_or_snapshot(&shell, event)?;
        }
        TimerAction::Pause => {
            let event = shell.pause(now);
            print_event_or_snapshot(&shell, event)?;
        }
        TimerAction::Reset => {
            let (saved, reset) = shell.reset(now)?;
            if let Some(saved) = saved {
                print_json(&saved)?;
            }
            print_json(&reset)?;
        }
        TimerAction::Status => {
            shell.sync(now);
            let reading = shell.app().get_timer();
            print_json(&serde_json::json!({
                "task": shell.app().get_task(),
                "phase": reading.phase,
                "seconds": reading.seconds,
                "completed_cycles": shell.completed_cycles(),
                "started_at": shell.started_at(),
            }))?;
        }
    }

    shell.persist()?;
    Ok(())
}
