/// End-to-end tests for the config file watcher.
///
/// These use a real temporary directory and the real polling thread, so
/// they exercise metadata polling, the rendezvous notification channel and
/// the blocking close handshake with no mocking.
use pdmlview_core::watcher::{ConfigWatcher, POLL_INTERVAL};
use std::fs;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Generous upper bound for anything the watcher should do promptly.
const DEADLINE: Duration = Duration::from_secs(5);

#[test]
fn change_is_reported() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let path = tmp.path().join("pdmlview.json");
    fs::write(&path, "{}").unwrap();

    let watcher = ConfigWatcher::new(path.clone()).unwrap();
    fs::write(&path, r#"{ "indent_width": 4 }"#).unwrap();

    watcher
        .config_changed()
        .recv_timeout(DEADLINE)
        .expect("change notification not delivered");
    watcher.close().unwrap();
}

#[test]
fn creation_of_missing_file_is_reported() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let path = tmp.path().join("pdmlview.json");

    let watcher = ConfigWatcher::new(path.clone()).unwrap();
    fs::write(&path, "{}").unwrap();

    assert!(watcher.config_changed().recv_timeout(DEADLINE).is_ok());
    watcher.close().unwrap();
}

#[test]
fn no_change_no_notification() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let path = tmp.path().join("pdmlview.json");
    fs::write(&path, "{}").unwrap();

    let watcher = ConfigWatcher::new(path).unwrap();
    assert!(watcher
        .config_changed()
        .recv_timeout(POLL_INTERVAL * 3)
        .is_err());
    watcher.close().unwrap();
}

/// The thread is parked delivering a notification nobody reads; close must
/// still get through.
#[test]
fn close_with_unread_change_does_not_block() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let path = tmp.path().join("pdmlview.json");
    fs::write(&path, "{}").unwrap();

    let watcher = ConfigWatcher::new(path.clone()).unwrap();
    fs::write(&path, "{ }").unwrap();
    std::thread::sleep(POLL_INTERVAL * 3);

    let start = Instant::now();
    watcher.close().unwrap();
    assert!(start.elapsed() < DEADLINE, "close took {:?}", start.elapsed());
}

#[test]
fn drop_stops_the_thread() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let path = tmp.path().join("pdmlview.json");

    let watcher = ConfigWatcher::new(path).unwrap();
    let changes = watcher.config_changed().clone();
    drop(watcher);

    // The sender went away with the thread.
    assert!(matches!(
        changes.recv_timeout(DEADLINE),
        Err(crossbeam_channel::RecvTimeoutError::Disconnected)
    ));
}

#[test]
fn unwatchable_path_is_an_error() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let file = tmp.path().join("plain");
    fs::write(&file, "x").unwrap();

    // A path below a regular file cannot exist.
    assert!(ConfigWatcher::new(file.join("pdmlview.json")).is_err());
}
