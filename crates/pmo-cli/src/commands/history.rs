use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use pmo_core::{Config, SessionStore};

use super::print_json;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Most recent sessions, newest first
    Recent {
        /// Maximum number of sessions (defaults to history.recent_limit from config)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Sessions started on a given day (UTC), newest first
    Date {
        /// Day as YYYY-MM-DD (defaults to today)
        date: Option<NaiveDate>,
    },
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = SessionStore::open()?;

    let sessions = match action {
        HistoryAction::Recent { limit } => {
            let limit = limit.unwrap_or_else(|| Config::load_or_default().history.recent_limit);
            store.query_recent(limit)?
        }
        HistoryAction::Date { date } => {
            store.query_by_date(date.unwrap_or_else(|| Utc::now().date_naive()))?
        }
    };

    print_json(&sessions)
}
