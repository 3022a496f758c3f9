//! Integration tests for the courtsync CLI
//!
//! These tests exercise the full CLI workflow using a temporary store and a
//! directory of scraped JSON dumps. They verify that commands work end-to-end
//! without mocking.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A temp working directory with a store path and a dump directory
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn db_path(&self) -> PathBuf {
        self.path().join("store").join("nba.db")
    }

    fn dumps(&self) -> PathBuf {
        self.path().join("scraped")
    }

    /// Run courtsync inside the workspace with the store pinned to `db_path`
    fn run(&self, args: &[&str]) -> std::process::Output {
        Command::new(env!("CARGO_BIN_EXE_courtsync"))
            .args(args)
            .current_dir(self.path())
            .env("COURTSYNC_DB_PATH", self.db_path())
            .env("COURTSYNC_LOG", "error")
            .env("NO_COLOR", "1")
            .output()
            .expect("Failed to execute courtsync")
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.dumps().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// Season stats, a two-game schedule and full per-game data for G1 only
    fn seed_dumps(&self) {
        self.write(
            "season_stats.json",
            r#"[["Rk","Player","Age","Team","Pos","G"],["1","Jane Doe",25,"BOS","PG",82]]"#,
        );
        self.write(
            "schedule.json",
            r#"[
                ["Tue, Oct 22, 2024","7:30p","New York Knicks","109","Boston Celtics","132","/boxscores/G1.html","","19,156","","TD Garden"],
                ["Wed, Oct 23, 2024","7:00p","Miami Heat","","Orlando Magic","","/boxscores/G2.html","","","","Kia Center"]
            ]"#,
        );
        self.write(
            "play_by_play/G1.json",
            r#"[["Q1","12:00","Jump ball","","0-0","","","G1"],["Q1","11:30","Jump shot","+2","2-0","+0","","G1"]]"#,
        );
        self.write(
            "box_scores/G1.json",
            r#"{"box-BOS-game-basic": [["Jane Doe","34:12","9","17",".529","3","7",".429","4","4","1.000","1","6","7","5","1","0","2","3","25","Starter","BOS","NYK","regular","G1"]]}"#,
        );
    }
}

/// Helper to get stdout as string
fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Helper to get stderr as string
fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

// =============================================================================
// Basic Command Tests
// =============================================================================

#[test]
fn test_help_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_courtsync"))
        .arg("--help")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("courtsync"));
    assert!(out.contains("sync"));
}

#[test]
fn test_version_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_courtsync"))
        .arg("--version")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    assert!(stdout(&output).contains("courtsync"));
}

// =============================================================================
// Shell Completion Tests
// =============================================================================

#[test]
fn test_completion_zsh() {
    let output = Command::new(env!("CARGO_BIN_EXE_courtsync"))
        .args(["completion", "zsh"])
        .output()
        .expect("Failed to execute");

    assert!(
        output.status.success(),
        "completion zsh failed: {}",
        stderr(&output)
    );
    assert!(
        stdout(&output).contains("#compdef courtsync"),
        "zsh completion should contain #compdef"
    );
}

#[test]
fn test_completion_bash() {
    let output = Command::new(env!("CARGO_BIN_EXE_courtsync"))
        .args(["completion", "bash"])
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    assert!(stdout(&output).contains("_courtsync"));
}

// =============================================================================
// Store Lifecycle Tests
// =============================================================================

#[test]
fn test_init_creates_store_and_config() {
    let ws = Workspace::new();

    let output = ws.run(&["init"]);
    assert!(output.status.success(), "init failed: {}", stderr(&output));
    assert!(ws.db_path().exists());

    let config = ws.path().join(".courtsync").join("config.toml");
    let contents = std::fs::read_to_string(&config).unwrap();
    assert!(contents.contains("fetch_delay_ms = 3000"));

    let again = ws.run(&["init"]);
    assert!(again.status.success());
    assert!(stdout(&again).contains("already exists"));
}

#[test]
fn test_status_on_empty_store() {
    let ws = Workspace::new();

    let output = ws.run(&["status", "--json"]);
    assert!(output.status.success(), "status failed: {}", stderr(&output));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["counts"]["play_by_play"], 0);
    assert_eq!(value["pending"].as_array().unwrap().len(), 0);
}

// =============================================================================
// Sync Tests
// =============================================================================

#[test]
fn test_sync_then_resync() {
    let ws = Workspace::new();
    ws.seed_dumps();
    let dumps = ws.dumps();
    let sync_args = [
        "sync",
        "--no-archive",
        "--source",
        dumps.to_str().unwrap(),
        "--fetch-delay-ms",
        "0",
        "--backoff-ms",
        "0",
    ];

    let output = ws.run(&sync_args);
    assert!(output.status.success(), "sync failed: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("SUCCESS: G1 (2 events, 1 box-score lines)"), "got: {}", out);
    // G2 has no dumps yet: processed, nothing stored
    assert!(out.contains("SUCCESS: G2 (0 events, 0 box-score lines)"), "got: {}", out);

    let check = ws.run(&["check", "G1"]);
    assert!(stdout(&check).contains("G1 complete"));
    let check = ws.run(&["check", "G2"]);
    assert!(stdout(&check).contains("G2 incomplete"));

    let status = ws.run(&["status", "--json"]);
    let value: serde_json::Value = serde_json::from_str(&stdout(&status)).unwrap();
    assert_eq!(value["counts"]["season_stats"], 1);
    assert_eq!(value["counts"]["play_by_play"], 2);
    assert_eq!(value["counts"]["box_score_basic"], 1);
    assert_eq!(value["pending"][0]["game_id"], "G2");

    // second run only revisits the game that is still missing data
    let output = ws.run(&sync_args);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(!out.contains("SUCCESS: G1"));
    assert!(out.contains("SUCCESS: G2"));

    let status = ws.run(&["status", "--json"]);
    let value: serde_json::Value = serde_json::from_str(&stdout(&status)).unwrap();
    assert_eq!(value["counts"]["play_by_play"], 2);
}

#[test]
fn test_sync_with_archive_round_trip() {
    let ws = Workspace::new();
    ws.seed_dumps();
    let dumps = ws.dumps();
    let archive = ws.path().join("docs").join("store.db.gz");
    let sync_args = [
        "sync",
        "--source",
        dumps.to_str().unwrap(),
        "--archive",
        archive.to_str().unwrap(),
        "--fetch-delay-ms",
        "0",
    ];

    let output = ws.run(&sync_args);
    assert!(output.status.success(), "sync failed: {}", stderr(&output));
    assert!(stdout(&output).contains("starting fresh"));
    assert!(archive.exists());

    // the archive, not the working copy, carries the store between runs
    std::fs::remove_file(ws.db_path()).unwrap();
    let output = ws.run(&sync_args);
    assert!(output.status.success(), "resync failed: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Unpacked"));
    assert!(!out.contains("SUCCESS: G1"));
}

#[test]
fn test_sync_without_source_fails() {
    let ws = Workspace::new();
    let missing = ws.path().join("nowhere");

    let output = ws.run(&["sync", "--no-archive", "--source", missing.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("season stats"));

    let runs = ws.run(&["runs", "--json"]);
    assert!(runs.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&runs)).unwrap();
    assert_eq!(value[0]["status"], "failed");
    assert!(value[0]["error"].as_str().unwrap().contains("season_stats.json"));
}

#[test]
fn test_runs_lists_newest_first() {
    let ws = Workspace::new();
    ws.seed_dumps();
    let dumps = ws.dumps();

    for _ in 0..2 {
        let output = ws.run(&[
            "sync",
            "--no-archive",
            "--source",
            dumps.to_str().unwrap(),
            "--fetch-delay-ms",
            "0",
        ]);
        assert!(output.status.success());
    }

    let output = ws.run(&["runs", "-n", "1"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("completed"));
    assert_eq!(out.lines().count(), 1);

    let empty = Workspace::new();
    let output = empty.run(&["runs"]);
    assert!(stdout(&output).contains("No sync runs recorded."));
}
