use std::path::{Path, PathBuf};
use std::process::{Command, Output};

struct Workspace {
    _dir: tempfile::TempDir,
    config_path: PathBuf,
}

impl Workspace {
    fn new(editor: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let config = format!(
            "database_path = {:?}\nlog_dir = {:?}\nlog_level = \"debug\"\neditor = {:?}\n",
            dir.path().join("data").join("daynote.db"),
            dir.path().join("logs"),
            editor,
        );
        std::fs::write(&config_path, config).unwrap();
        Self {
            _dir: dir,
            config_path,
        }
    }

    fn run(&self, args: &[&str]) -> Output {
        run_with_config(&self.config_path, args)
    }

    fn stdout(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "daynote {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }
}

fn run_with_config(config_path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_daynote"))
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("DAYNOTE_DB")
        .output()
        .unwrap()
}

#[test]
fn note_lifecycle_through_the_cli() {
    let ws = Workspace::new("true");

    assert!(ws.stdout(&["new", "buy milk"]).contains("Added note 1"));
    let shown = ws.stdout(&["show"]);
    assert!(shown.starts_with("Today: "));
    assert!(shown.contains(" - [ ] :1: buy milk"));

    assert!(ws.stdout(&["complete", "1"]).contains("Completed note 1"));
    assert!(ws.stdout(&["show"]).contains(" - [x] :1: buy milk"));

    ws.stdout(&["delete", "1"]);
    assert!(ws.stdout(&["show"]).contains("No notes."));
    assert!(ws.stdout(&["doctor"]).contains("consistent"));

    let second_delete = ws.run(&["delete", "1"]);
    assert!(!second_delete.status.success());
    assert!(String::from_utf8_lossy(&second_delete.stderr).contains("note 1 not found"));
}

#[test]
fn notes_for_other_days_show_in_ranges() {
    let ws = Workspace::new("true");

    ws.stdout(&["new", "yesterday's task", "--day", "-1"]);
    ws.stdout(&["new", "today's task"]);

    let yesterday = ws.stdout(&["show", "--day", "-1"]);
    assert!(yesterday.starts_with("Day: "));
    assert!(yesterday.contains("yesterday's task"));

    let week = ws.stdout(&["show", "week"]);
    assert!(week.contains("yesterday's task"));
    assert!(week.contains("today's task"));
}

#[test]
fn schedules_round_trip_through_the_cli() {
    let ws = Workspace::new("true");

    assert!(ws.stdout(&["schedule", "list"]).contains("No schedules."));
    ws.stdout(&["schedule", "add", "09", "mon", "odd"]);
    let listed = ws.stdout(&["schedule", "list"]);
    assert!(listed.contains("hour=09\tday=mon\tweek=odd"));
}

#[cfg(unix)]
#[test]
fn edit_with_unchanged_sheet_keeps_notes() {
    let ws = Workspace::new("true");
    ws.stdout(&["new", "stays"]);

    let edited = ws.stdout(&["edit"]);
    assert!(edited.contains(" - [ ] :1: stays"));
    assert!(ws.stdout(&["doctor"]).contains("consistent"));
}

#[cfg(unix)]
#[test]
fn failing_editor_aborts_edit() {
    let ws = Workspace::new("false");
    let output = ws.run(&["check"]);
    assert!(!output.status.success());
}
