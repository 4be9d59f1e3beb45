/// End-to-end tests for the `pdmlview` binary.
///
/// These run the built executable against a `tshark -T pdml` style capture
/// in a temporary directory and check what it prints and persists.
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const DEADLINE: Duration = Duration::from_secs(10);

const CAPTURE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<pdml version="0" creator="wireshark/4.2.2">
<packet>
  <proto name="geninfo" pos="0" showname="General information" size="66"/>
  <proto name="frame" showname="Frame 1: 66 bytes on wire" size="66" pos="0"/>
  <proto name="tcp" showname="Transmission Control Protocol" size="20" pos="34">
    <field name="tcp.srcport" showname="Source Port: 443" size="2" pos="34" show="443"/>
  </proto>
</packet>
<packet>
  <proto name="udp" showname="User Datagram Protocol" size="8" pos="34"/>
</packet>
</pdml>"#;

fn pdmlview(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pdmlview"));
    cmd.arg(dir.join("capture.pdml"))
        .arg("--config")
        .arg(dir.join("pdmlview.json"));
    cmd
}

fn setup() -> TempDir {
    let tmp = TempDir::new().expect("failed to create temp dir");
    fs::write(tmp.path().join("capture.pdml"), CAPTURE).unwrap();
    tmp
}

#[test]
fn capture_resolves_layers_of_its_first_packet() {
    let tmp = setup();
    let output = pdmlview(tmp.path())
        .args(["--offset", "35", "--all"])
        .output()
        .expect("failed to run pdmlview");
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let layers: Vec<&str> = stdout.lines().filter(|l| l.starts_with("byte 35:")).collect();
    assert_eq!(layers.len(), 2, "{stdout}");
    assert!(layers[0].contains("coarse") && layers[0].ends_with(" tcp"));
    assert!(layers[1].contains("fine") && layers[1].ends_with(" tcp.srcport"));

    assert!(stdout.contains("[Source Port: 443]"));
    assert!(!stdout.contains("User Datagram Protocol"));
    assert!(!stdout.contains("General information"));
}

#[test]
fn expansion_state_is_rooted_at_the_packet() {
    let tmp = setup();
    let state = tmp.path().join("state.json");
    let status = pdmlview(tmp.path())
        .args(["--expand", "tcp", "--state"])
        .arg(&state)
        .stdout(Stdio::null())
        .status()
        .expect("failed to run pdmlview");
    assert!(status.success());

    let saved: Vec<Vec<String>> =
        serde_json::from_str(&fs::read_to_string(&state).unwrap()).unwrap();
    assert_eq!(saved, vec![vec![""], vec!["", "tcp"]]);
}

#[test]
fn watch_mode_saves_state_before_any_config_change() {
    let tmp = setup();
    let state = tmp.path().join("state.json");
    let mut child = pdmlview(tmp.path())
        .args(["--watch", "--expand", "tcp", "--state"])
        .arg(&state)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn pdmlview");

    let start = Instant::now();
    let saved = loop {
        let parsed = fs::read_to_string(&state)
            .ok()
            .and_then(|text| serde_json::from_str::<Vec<Vec<String>>>(&text).ok());
        if let Some(saved) = parsed {
            break Some(saved);
        }
        if start.elapsed() > DEADLINE {
            break None;
        }
        thread::sleep(Duration::from_millis(50));
    };
    let _ = child.kill();
    let _ = child.wait();

    assert_eq!(
        saved.expect("state not written while watching"),
        vec![vec![""], vec!["", "tcp"]]
    );
}
