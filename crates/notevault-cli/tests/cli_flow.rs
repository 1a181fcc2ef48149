use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const PASSWORD: &str = "Str0ng!Pass";

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_notevault"))
}

/// Isolated XDG config/data directories for one test.
struct Home {
    dir: TempDir,
}

impl Home {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir should be created"),
        }
    }

    fn config_home(&self) -> PathBuf {
        self.dir.path().join("config")
    }

    fn data_home(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    fn vault_path(&self) -> PathBuf {
        self.data_home().join("notevault").join("notes.vault")
    }

    fn command(&self, password: Option<&str>) -> Command {
        let mut cmd = Command::new(bin());
        cmd.env("XDG_CONFIG_HOME", self.config_home())
            .env("XDG_DATA_HOME", self.data_home())
            .env("HOME", self.dir.path())
            .env_remove("NOTEVAULT_PATH")
            .env_remove("NOTEVAULT_CONFIG")
            .env_remove("NOTEVAULT_PASSWORD")
            .stdin(Stdio::null());
        if let Some(password) = password {
            cmd.env("NOTEVAULT_PASSWORD", password);
        }
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command(Some(PASSWORD))
            .args(args)
            .output()
            .expect("binary should run")
    }

    fn init(&self) {
        let output = self.run(&["init"]);
        assert_success(&output);
    }

    fn add(&self, title: &str, body: &str) -> String {
        let output = self.run(&["--quiet", "add", "--title", title, "--body", body]);
        assert_success(&output);
        stdout(&output).trim().to_string()
    }

    fn list_json(&self) -> Vec<serde_json::Value> {
        let output = self.run(&["list", "--json"]);
        assert_success(&output);
        serde_json::from_slice(&output.stdout).expect("list should print JSON")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "command failed: {}\nstdout: {}\nstderr: {}",
        output.status,
        stdout(output),
        stderr(output)
    );
}

fn assert_exit_code(output: &Output, code: i32) {
    assert_eq!(
        output.status.code(),
        Some(code),
        "stdout: {}\nstderr: {}",
        stdout(output),
        stderr(output)
    );
}

#[test]
fn test_init_writes_vault_and_config() {
    let home = Home::new();
    home.init();

    assert!(home.vault_path().exists());
    let config = std::fs::read_to_string(home.config_home().join("notevault").join("config.toml"))
        .expect("config should be written");
    assert!(config.contains("notes.vault"));
    assert!(config.contains("timeout_minutes = 30"));
}

#[test]
fn test_note_lifecycle() {
    let home = Home::new();
    home.init();

    let groceries = home.add("Groceries", "Milk, eggs");
    home.add("Ideas", "Write a vault");

    let notes = home.list_json();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0]["title"], "Groceries");
    assert_eq!(notes[0]["id"], groceries.as_str());
    assert_eq!(notes[1]["body"], "Write a vault");

    let found = home.run(&["search", "MILK", "--json"]);
    assert_success(&found);
    let found: Vec<serde_json::Value> = serde_json::from_slice(&found.stdout).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["title"], "Groceries");

    let edited = home.run(&["edit", &groceries[..8], "--body", "Milk, eggs, bread"]);
    assert_success(&edited);

    let shown = home.run(&["show", &groceries, "--json"]);
    assert_success(&shown);
    let shown: serde_json::Value = serde_json::from_slice(&shown.stdout).unwrap();
    assert_eq!(shown["title"], "Groceries");
    assert_eq!(shown["body"], "Milk, eggs, bread");

    assert_success(&home.run(&["rm", &groceries]));
    let notes = home.list_json();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["title"], "Ideas");
}

#[test]
fn test_plaintext_never_reaches_the_vault_file() {
    let home = Home::new();
    home.init();
    home.add("Secret title", "classified body text");

    let bytes = std::fs::read(home.vault_path()).expect("vault should exist");
    let haystack = String::from_utf8_lossy(&bytes);
    assert!(!haystack.contains("Secret title"));
    assert!(!haystack.contains("classified body text"));
}

#[test]
fn test_wrong_password_exits_with_auth_code() {
    let home = Home::new();
    home.init();

    let output = home
        .command(Some("Wr0ng!Pass"))
        .args(["list"])
        .output()
        .expect("binary should run");

    assert_exit_code(&output, 5);
    assert!(stderr(&output).contains("Invalid credential"));
}

#[test]
fn test_missing_password_without_tty_fails() {
    let home = Home::new();
    home.init();

    let output = home
        .command(None)
        .args(["list"])
        .output()
        .expect("binary should run");

    assert_exit_code(&output, 5);
    assert!(stderr(&output).contains("NOTEVAULT_PASSWORD"));
}

#[test]
fn test_missing_vault_exits_with_not_found() {
    let home = Home::new();

    let output = home.run(&["list"]);

    assert_exit_code(&output, 3);
    assert!(stderr(&output).contains("notevault init"));
}

#[test]
fn test_init_twice_is_rejected() {
    let home = Home::new();
    home.init();

    let output = home.run(&["init"]);

    assert_exit_code(&output, 4);
}

#[test]
fn test_weak_password_is_rejected_on_init() {
    let home = Home::new();

    let output = home
        .command(Some("short"))
        .args(["init"])
        .output()
        .expect("binary should run");

    assert_exit_code(&output, 4);
    assert!(stderr(&output).contains("at least 8 characters"));
}

#[test]
fn test_out_of_range_timeout_is_rejected_on_init() {
    let home = Home::new();

    let output = home.run(&["init", "--timeout", "99999999999"]);

    assert_exit_code(&output, 4);
    assert!(stderr(&output).contains("--timeout"));
    assert!(!home.vault_path().exists());
}

#[test]
fn test_out_of_range_config_timeout_is_rejected() {
    let home = Home::new();
    home.init();
    let config_path = home.config_home().join("notevault").join("config.toml");
    let config = std::fs::read_to_string(&config_path).expect("config should be written");
    std::fs::write(
        &config_path,
        config.replace("timeout_minutes = 30", "timeout_minutes = 1000000000000"),
    )
    .expect("config should be rewritten");

    let output = home.run(&["list"]);

    assert_exit_code(&output, 4);
    assert!(stderr(&output).contains("session.timeout_minutes"));
}

#[test]
fn test_list_last_out_of_range_is_invalid_input() {
    let home = Home::new();
    home.init();

    let output = home.run(&["list", "--last", "99999999999999999d"]);

    assert_exit_code(&output, 4);
}

#[test]
fn test_unknown_note_and_empty_edit() {
    let home = Home::new();
    home.init();
    home.add("Only", "one");

    let missing = home.run(&["show", "00000000-0000-4000-8000-000000000000"]);
    assert_exit_code(&missing, 3);

    let empty_edit = home.run(&["edit", "00000000-0000-4000-8000-000000000000"]);
    assert_exit_code(&empty_edit, 4);

    let bad_id = home.run(&["rm", "xyz"]);
    assert_exit_code(&bad_id, 4);
}

#[test]
fn test_export_then_import_restores_notes() {
    let home = Home::new();
    home.init();
    let first = home.add("First", "alpha");
    let second = home.add("Second", "beta");
    let export = home.dir.path().join("backup.json");
    let export_arg = export.to_string_lossy().to_string();

    assert_success(&home.run(&["export", &export_arg]));
    let text = std::fs::read_to_string(&export).expect("export should exist");
    assert!(!text.contains("alpha"));

    assert_success(&home.run(&["rm", &first]));
    assert_success(&home.run(&["rm", &second]));
    assert!(home.list_json().is_empty());

    assert_success(&home.run(&["import", &export_arg]));
    let titles: Vec<_> = home
        .list_json()
        .iter()
        .map(|note| note["title"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(titles, vec!["First", "Second"]);
}

#[test]
fn test_import_missing_file_is_not_found() {
    let home = Home::new();
    home.init();

    let output = home.run(&["import", "/definitely/not/here.json"]);

    assert_exit_code(&output, 3);
}

#[test]
fn test_check_and_status_need_no_password() {
    let home = Home::new();
    home.init();
    home.add("t", "b");

    let check = home
        .command(None)
        .args(["check"])
        .output()
        .expect("binary should run");
    assert_success(&check);
    assert!(stdout(&check).contains("Integrity check: OK"));

    let status = home
        .command(None)
        .args(["status", "--json"])
        .output()
        .expect("binary should run");
    assert_success(&status);
    let status: serde_json::Value = serde_json::from_slice(&status.stdout).unwrap();
    assert_eq!(status["setup_required"], false);
    assert_eq!(status["metadata"]["record_count"], 1);
    assert_eq!(status["session"]["state"], "unauthenticated");
}

#[test]
fn test_check_reports_damaged_vault() {
    let home = Home::new();
    home.init();
    let id = home.add("Damaged", "soon");

    let conn = rusqlite::Connection::open(home.vault_path()).expect("raw open should succeed");
    conn.execute(
        "UPDATE records SET body_nonce = x'0102' WHERE id = ?1",
        [&id],
    )
    .expect("update should succeed");
    drop(conn);

    let output = home.run(&["check"]);

    assert_exit_code(&output, 6);
    assert!(stdout(&output).contains("Integrity check: FAILED"));
}

#[test]
fn test_vault_flag_overrides_config() {
    let home = Home::new();
    home.init();
    let other = home.dir.path().join("other.vault");
    let other_arg = other.to_string_lossy().to_string();

    assert_success(&home.run(&["init", &other_arg]));
    assert_success(&home.run(&["--vault", &other_arg, "add", "--title", "elsewhere", "--body", ""]));

    assert!(home.list_json().is_empty());
    let output = home.run(&["--vault", &other_arg, "list", "--json"]);
    let notes: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(notes.len(), 1);
}

#[test]
fn test_shell_runs_piped_commands() {
    let home = Home::new();
    home.init();

    let mut child = home
        .command(Some(PASSWORD))
        .arg("shell")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("shell should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(b"add \"Shell note\" \"from the shell\"\nlist\nlogout\nlist\nquit\n")
        .expect("commands should be written");
    let output = child.wait_with_output().expect("shell should exit");

    assert_success(&output);
    assert!(stdout(&output).contains("Added note"));
    assert!(stdout(&output).contains("Shell note"));
    assert!(stdout(&output).contains("Locked."));
    assert!(stderr(&output).contains("Not authenticated"));

    let notes = home.list_json();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["body"], "from the shell");
}

#[test]
fn test_completions_generate() {
    let home = Home::new();
    let output = home.run(&["completions", "bash"]);
    assert_success(&output);
    assert!(stdout(&output).contains("notevault"));
}
