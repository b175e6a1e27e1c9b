use chrono::Utc;
use clap::Subcommand;

use super::print_json;
use crate::shell::Shell;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Record the current session as completed and reset the timer
    Complete,
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut shell = Shell::open()?;

    match action {
        SessionAction::Complete => {
            let (saved, reset) = shell.complete(Utc::now())?;
            match saved {
                Some(saved) => print_json(&saved)?,
                None => eprintln!("session has no task; nothing recorded"),
            }
            print_json(&reset)?;
        }
    }

    shell.persist()?;
    Ok(())
}
