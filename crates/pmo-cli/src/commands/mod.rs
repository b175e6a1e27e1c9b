pub mod config;
pub mod history;
pub mod session;
pub mod task;
pub mod timer;

use pmo_core::Event;
use serde::Serialize;

use crate::shell::Shell;

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the event a command produced, or the current snapshot when the
/// command was a no-op.
pub(crate) fn print_event_or_snapshot(
    shell: &Shell,
    event: Option<Event>,
) -> Result<(), Box<dyn std::error::Error>> {
    match event {
        Some(event) => print_json(&event),
        None => print_json(&shell.app().snapshot()),
    }
}
