use std::{fs, process::Command};

fn run(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_gridsnake"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to invoke the gridsnake binary")
}

#[test]
fn prints_toml_summary_for_autopilot_run() {
    let output = run(&[
        "--topology",
        "hexagonal",
        "--radius",
        "6",
        "--autopilot",
        "--ticks",
        "60",
    ]);
    assert!(output.status.success(), "gridsnake exited with {:?}", output.status);

    let stdout = String::from_utf8(output.stdout).expect("utf-8 summary");
    let summary: toml::Value = toml::from_str(&stdout).expect("summary is toml");
    let ticks = summary
        .get("ticks")
        .and_then(toml::Value::as_integer)
        .expect("ticks field");
    assert!((1..=60).contains(&ticks));
    assert!(summary.get("level").and_then(toml::Value::as_str).is_some());
}

#[test]
fn reads_session_from_config_file() {
    let dir = std::env::temp_dir().join(format!("gridsnake-cli-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("session.toml");
    fs::write(
        &path,
        "seed = 5\n\n[topology]\nkind = \"square\"\nwidth = 6\nheight = 3\n",
    )
    .expect("write config");

    let output = run(&["--config", path.to_str().expect("utf-8 path")]);
    assert!(output.status.success());
    let summary: toml::Value =
        toml::from_str(&String::from_utf8_lossy(&output.stdout)).expect("summary is toml");
    // The player starts at (3, 1) heading east and leaves the board on tick 3.
    assert_eq!(summary.get("ticks").and_then(toml::Value::as_integer), Some(3));
    assert_eq!(summary.get("state").and_then(toml::Value::as_str), Some("GameOver"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_config_file_fails_with_context() {
    let output = run(&["--config", "/nonexistent/gridsnake/session.toml"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read session config"));
}

#[test]
fn score_race_without_tick_limit_is_rejected() {
    let output = run(&["--mode", "score-race"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("session configuration rejected"), "{stderr}");
}
