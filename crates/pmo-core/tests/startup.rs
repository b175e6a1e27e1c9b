//! Startup through the per-user data directory.
//!
//! Both cases live in one test because they mutate PMO_DATA_DIR for the
//! whole process.

use pmo_core::{App, CoreError, DatabaseError, TimerState};
use tempfile::TempDir;

#[test]
fn app_open_creates_data_dir_or_fails_fatally() {
    let temp_dir = TempDir::new().unwrap();
    let data = temp_dir.path().join("nested").join("pmo");
    std::env::set_var("PMO_DATA_DIR", &data);

    let app = App::open().unwrap();
    assert!(data.join("pmo.db").is_file());
    assert!(data.join("config.toml").is_file());
    assert_eq!(
        app.store().path(),
        Some(data.join("pmo.db").as_path())
    );
    assert_eq!(app.get_timer().phase, TimerState::Idle);
    assert!(app.get_session_history().unwrap().is_empty());
    drop(app);

    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, b"file").unwrap();
    std::env::set_var("PMO_DATA_DIR", blocker.join("data"));

    let err = App::open().err().unwrap();
    assert!(matches!(
        err,
        CoreError::Database(DatabaseError::DataDirUnavailable { .. })
    ));

    std::env::remove_var("PMO_DATA_DIR");
}
