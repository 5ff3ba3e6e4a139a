use assert_cmd::Command;
use hotexit::hash::path_hash;
use predicates::prelude::*;
use std::path::Path;

fn hotexit(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hotexit").unwrap();
    cmd.env("HOTEXIT_HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("HOTEXIT_LOG");
    cmd
}

fn seed_untitled(home: &Path, workspace: &str, name: &str, content: &str) {
    let dir = home.join(path_hash(workspace)).join("untitled");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), content).unwrap();
}

#[test]
fn test_list_empty() {
    let temp_dir = tempfile::tempdir().unwrap();
    hotexit(temp_dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No tracked workspaces"));
}

#[test]
fn test_track_list_untrack() {
    let temp_dir = tempfile::tempdir().unwrap();

    hotexit(temp_dir.path())
        .args(["track", "/proj", "/other", "/proj"])
        .assert()
        .success();

    let registry = std::fs::read_to_string(temp_dir.path().join("workspaces.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&registry).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!({ "folderWorkspaces": ["/proj", "/other"] })
    );

    seed_untitled(temp_dir.path(), "/proj", "Untitled-1", "hello");
    hotexit(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("/proj"))
        .stdout(predicate::str::contains("1 backup(s)"))
        .stdout(predicate::str::contains("/other"));

    hotexit(temp_dir.path())
        .args(["untrack", "/other"])
        .assert()
        .success();
    hotexit(temp_dir.path())
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("/other").not());
}

#[test]
fn test_show_and_untitled() {
    let temp_dir = tempfile::tempdir().unwrap();
    seed_untitled(temp_dir.path(), "/proj", "Untitled-1", "draft text");

    hotexit(temp_dir.path())
        .args(["show", "/proj", "untitled:Untitled-1"])
        .assert()
        .success()
        .stdout("draft text");

    hotexit(temp_dir.path())
        .args(["untitled", "/proj"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Untitled-1"));

    hotexit(temp_dir.path())
        .args(["show", "/proj", "untitled:Untitled-2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No backup for untitled:Untitled-2"));
}

#[test]
fn test_location_is_hashed_for_files() {
    let temp_dir = tempfile::tempdir().unwrap();
    let expected = temp_dir
        .path()
        .join(path_hash("/proj"))
        .join("file")
        .join(path_hash("/proj/a.ts"));

    hotexit(temp_dir.path())
        .args(["location", "/proj", "file:///proj/a.ts"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.to_string_lossy().as_ref()))
        .stdout(predicate::str::contains("a.ts").not());
}

#[test]
fn test_invalid_resource() {
    let temp_dir = tempfile::tempdir().unwrap();
    hotexit(temp_dir.path())
        .args(["location", "/proj", "ftp:/x"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));
}

#[test]
fn test_discard_removes_backups_and_untracks() {
    let temp_dir = tempfile::tempdir().unwrap();
    hotexit(temp_dir.path())
        .args(["track", "/proj"])
        .assert()
        .success();
    seed_untitled(temp_dir.path(), "/proj", "Untitled-1", "a");
    seed_untitled(temp_dir.path(), "/proj", "Untitled-2", "b");

    hotexit(temp_dir.path())
        .args(["discard", "/proj"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Discarded 2 backup(s)"));

    assert!(!temp_dir.path().join(path_hash("/proj")).exists());
    hotexit(temp_dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No tracked workspaces"));
}

#[test]
fn test_config_hot_exit() {
    let temp_dir = tempfile::tempdir().unwrap();

    hotexit(temp_dir.path())
        .args(["config", "hot-exit"])
        .assert()
        .success()
        .stdout("on\n");

    hotexit(temp_dir.path())
        .args(["config", "hot-exit", "off"])
        .assert()
        .success();

    hotexit(temp_dir.path())
        .args(["config", "hot-exit"])
        .assert()
        .success()
        .stdout("off\n");

    hotexit(temp_dir.path())
        .args(["config", "hot-exit", "sometimes"])
        .assert()
        .failure();

    hotexit(temp_dir.path())
        .args(["config", "colour", "red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown setting"));
}

#[test]
fn test_home_flag_overrides_env() {
    let env_home = tempfile::tempdir().unwrap();
    let flag_home = tempfile::tempdir().unwrap();

    hotexit(env_home.path())
        .arg("--home")
        .arg(flag_home.path())
        .args(["track", "/proj"])
        .assert()
        .success();

    assert!(flag_home.path().join("workspaces.json").exists());
    assert!(!env_home.path().join("workspaces.json").exists());
}
