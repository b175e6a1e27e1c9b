use chrono::Utc;
use clap::Subcommand;

use super::print_json;
use crate::shell::Shell;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Set the current task (an empty name clears it)
    Set {
        /// Task name
        name: String,
    },
    /// Print the current task
    Get,
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut shell = Shell::open()?;

    match action {
        TaskAction::Set { name } => {
            let event = shell.set_task(&name, Utc::now());
            print_json(&event)?;
        }
        TaskAction::Get => {
            shell.sync(Utc::now());
            print_json(&serde_json::json!({ "task": shell.app().get_task() }))?;
        }
    }

    shell.persist()?;
    Ok(())
}
