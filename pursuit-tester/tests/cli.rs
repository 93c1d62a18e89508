use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "pursuit-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_pursuit-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("wall-stun"));
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_runs_all_scenarios_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_pursuit-tester");
    let output_path = temp_path("scenarios.json");
    let state_dir = temp_path("scenario-state");
    let output = Command::new(exe)
        .args(["--episodes", "0", "--scenarios", "all", "--report", "json"])
        .arg("--state-file")
        .arg(state_dir.join("SceneRotationData.json"))
        .arg("--output")
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let content = std::fs::read_to_string(&output_path).expect("read report");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let scenarios = report["scenarios"].as_array().expect("scenario list");
    assert_eq!(scenarios.len(), 6);
    assert!(scenarios.iter().all(|s| s["passed"] == true));
    assert!(report["run"].is_null());
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_unknown_scenario_exits_with_failure() {
    let exe = env!("CARGO_BIN_EXE_pursuit-tester");
    let state_dir = temp_path("unknown-state");
    let output = Command::new(exe)
        .args(["--episodes", "0", "--scenarios", "nope", "--report", "json"])
        .arg("--state-file")
        .arg(state_dir.join("SceneRotationData.json"))
        .output()
        .expect("run cli");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("unknown scenario 'nope'"));
}

#[test]
fn cli_reset_writes_zeroed_state() {
    let exe = env!("CARGO_BIN_EXE_pursuit-tester");
    let state_dir = temp_path("reset");
    let state_file = state_dir.join("SceneRotationData.json");
    std::fs::create_dir_all(&state_dir).expect("create state dir");
    std::fs::write(
        &state_file,
        r#"{"totalEpisodes":900,"currentSceneIndex":4,"chaserWins":500,"evaderWins":400}"#,
    )
    .expect("seed state");

    let status = Command::new(exe)
        .arg("--reset")
        .arg("--state-file")
        .arg(&state_file)
        .status()
        .expect("run cli");
    assert!(status.success());

    let content = std::fs::read_to_string(&state_file).expect("read state");
    let record: serde_json::Value = serde_json::from_str(&content).expect("state json");
    assert_eq!(record["totalEpisodes"], 0);
    assert_eq!(record["currentSceneIndex"], 0);
    assert_eq!(record["chaserWins"], 0);
    assert_eq!(record["evaderWins"], 0);
    let _ = std::fs::remove_dir_all(state_dir);
}

#[test]
fn cli_episodes_write_csv_and_persist_progress() {
    let exe = env!("CARGO_BIN_EXE_pursuit-tester");
    let output_path = temp_path("episodes.csv");
    let state_dir = temp_path("episodes-state");
    let state_file = state_dir.join("SceneRotationData.json");
    let output = Command::new(exe)
        .args([
            "--episodes",
            "3",
            "--episodes-per-scene",
            "2",
            "--chaser-policy",
            "pursue",
            "--evader-policy",
            "idle",
            "--report",
            "csv",
        ])
        .arg("--state-file")
        .arg(&state_file)
        .arg("--output")
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let csv = std::fs::read_to_string(&output_path).expect("read csv");
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 4);
    assert!(rows[1].starts_with("1,Scene 1,chaser_caught_evader,"));
    assert!(rows[3].starts_with("3,Scene 2,"));

    let state: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&state_file).expect("read state"))
            .expect("state json");
    assert_eq!(state["totalEpisodes"], 3);
    assert_eq!(state["currentSceneIndex"], 1);
    let _ = std::fs::remove_file(output_path);
    let _ = std::fs::remove_dir_all(state_dir);
}
