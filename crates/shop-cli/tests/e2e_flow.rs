//! End-to-end tests driving the `shop` binary.
//!
//! Each test gets its own HOME and database so no user config leaks in.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn shop_binary() -> String {
    env!("CARGO_BIN_EXE_shop").to_string()
}

struct Floor {
    home: TempDir,
    db_path: PathBuf,
}

impl Floor {
    fn new() -> Self {
        let home = TempDir::new().unwrap();
        let db_path = home.path().join("data/shop.db");
        Self { home, db_path }
    }

    fn home(&self) -> &Path {
        self.home.path()
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(shop_binary())
            .env("HOME", self.home())
            .env("XDG_CONFIG_HOME", self.home().join(".config"))
            .env("SHOP_DATABASE_PATH", &self.db_path)
            .env_remove("SHOP_DEFAULT_WORKER")
            .args(args)
            .output()
            .expect("failed to run shop")
    }

    fn ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "shop {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    fn fails(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(!output.status.success(), "shop {args:?} should fail");
        String::from_utf8(output.stderr).unwrap()
    }

    fn seed(&self) {
        self.ok(&["init"]);
        self.ok(&["order", "add", "WO-1", "--name", "Brackets"]);
        self.ok(&[
            "service", "add", "laser-cut", "--name", "Laser cutting", "--quantity", "1.5",
            "--hours", "1.5", "--price", "100",
        ]);
        self.ok(&["resource", "add", "laser-1"]);
    }

    fn active_task(&self, worker: &str) -> Option<String> {
        let stdout = self.ok(&["active", "--worker", worker, "--json"]);
        let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        json["task_id"].as_str().map(str::to_string)
    }
}

#[test]
fn clock_in_pause_resume_clock_out() {
    let floor = Floor::new();
    floor.seed();

    let started = floor.ok(&[
        "start", "laser-1", "--order", "WO-1", "--service", "laser-cut", "--worker", "ana",
    ]);
    assert!(started.starts_with("Started task "), "{started}");
    let task_id = floor.active_task("ana").expect("ana should have a task");

    floor.ok(&["pause", &task_id, "--worker", "ana"]);
    let board = floor.ok(&["resource", "list", "--json"]);
    let board: serde_json::Value = serde_json::from_str(&board).unwrap();
    assert_eq!(board[0]["occupancy_status"], "paused");
    assert_eq!(board[0]["current_task_id"], task_id.as_str());

    floor.ok(&["resume", &task_id, "--worker", "ana"]);
    let stopped = floor.ok(&["stop", &task_id, "--worker", "ana"]);
    assert!(stopped.contains("Completed task"), "{stopped}");
    assert!(stopped.contains("Order WO-1 actual cost:"), "{stopped}");

    assert_eq!(floor.active_task("ana"), None);
    let events = floor.ok(&["task", "events", &task_id]);
    let kinds: Vec<&str> = events
        .lines()
        .map(|line| line.split_whitespace().nth(1).unwrap())
        .collect();
    assert_eq!(kinds, vec!["start", "pause", "resume", "stop"]);

    let show = floor.ok(&["task", "show", &task_id, "--json"]);
    let show: serde_json::Value = serde_json::from_str(&show).unwrap();
    assert_eq!(show["status"], "completed");

    assert_eq!(floor.ok(&["doctor"]).trim(), "No occupancy problems found.");
}

#[test]
fn second_operator_is_turned_away() {
    let floor = Floor::new();
    floor.seed();
    floor.ok(&[
        "start", "laser-1", "--order", "WO-1", "--service", "laser-cut", "--worker", "ana",
    ]);

    let stderr = floor.fails(&[
        "start", "laser-1", "--order", "WO-1", "--service", "laser-cut", "--worker", "ben",
    ]);
    assert!(stderr.contains("resource laser-1 is busy"), "{stderr}");
    assert_eq!(floor.active_task("ben"), None);
}

#[test]
fn worker_comes_from_config_file() {
    let floor = Floor::new();
    floor.seed();
    let config_path = floor.home().join("terminal.toml");
    std::fs::write(&config_path, "default_worker = \"cy\"\n").unwrap();
    let config = config_path.to_str().unwrap();

    floor.ok(&[
        "--config", config, "start", "laser-1", "--order", "WO-1", "--service", "laser-cut",
    ]);
    assert!(floor.active_task("cy").is_some());

    let stderr = floor.fails(&["start", "laser-1", "--order", "WO-1", "--service", "laser-cut"]);
    assert!(stderr.contains("no worker given"), "{stderr}");
}

#[test]
fn maintenance_blocks_clock_in() {
    let floor = Floor::new();
    floor.seed();
    floor.ok(&["resource", "maintenance", "laser-1"]);

    let stderr = floor.fails(&[
        "start", "laser-1", "--order", "WO-1", "--service", "laser-cut", "--worker", "ana",
    ]);
    assert!(stderr.contains("unavailable: maintenance"), "{stderr}");

    floor.ok(&["resource", "maintenance", "laser-1", "--off"]);
    floor.ok(&[
        "start", "laser-1", "--order", "WO-1", "--service", "laser-cut", "--worker", "ana",
    ]);
}

#[test]
fn each_clock_command_reaches_its_own_operation() {
    let floor = Floor::new();
    floor.seed();
    floor.ok(&[
        "start", "laser-1", "--order", "WO-1", "--service", "laser-cut", "--worker", "ana",
    ]);
    let task_id = floor.active_task("ana").expect("ana should have a task");

    floor.ok(&["pause", &task_id, "--worker", "ana"]);
    let cancelled = floor.ok(&["cancel", &task_id, "--worker", "ana"]);
    assert!(cancelled.starts_with("Cancelled task"), "{cancelled}");
    assert!(cancelled.contains("(not billed)"), "{cancelled}");

    let show = floor.ok(&["task", "show", &task_id, "--json"]);
    let show: serde_json::Value = serde_json::from_str(&show).unwrap();
    assert_eq!(show["status"], "cancelled");

    let board = floor.ok(&["resource", "list", "--json"]);
    let board: serde_json::Value = serde_json::from_str(&board).unwrap();
    assert_eq!(board[0]["occupancy_status"], "idle");
}
