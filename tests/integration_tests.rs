//! Integration tests for the itree CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get an itree command isolated from the caller's environment
fn itree() -> Command {
    let mut cmd = Command::cargo_bin("itree").unwrap();
    cmd.env_remove("ITREE_FORMAT")
        .env_remove("ITREE_DATABASE")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create a workspace in a temp directory
fn setup_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    itree().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

/// Run a command with `-f id` and return the single ID it prints
fn create(tmp: &TempDir, args: &[&str]) -> String {
    let output = itree()
        .current_dir(tmp.path())
        .args(args)
        .args(["-f", "id"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn stdout_json(tmp: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = itree()
        .current_dir(tmp.path())
        .args(args)
        .args(["-f", "json"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    itree()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("category"))
        .stdout(predicate::str::contains("project"));
}

#[test]
fn test_version_flag() {
    itree()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("itree"));
}

#[test]
fn test_version_command_outside_workspace() {
    let tmp = TempDir::new().unwrap();
    itree()
        .current_dir(tmp.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.8 pre"))
        .stdout(predicate::str::contains("1008"));
}

#[test]
fn test_version_command_json_reports_instance() {
    let tmp = TempDir::new().unwrap();
    itree()
        .current_dir(tmp.path())
        .args(["init", "--instance", "Workshop"])
        .assert()
        .success();

    let info = stdout_json(&tmp, &["version"]);
    assert_eq!(info["version"], "0.1.8 pre");
    assert_eq!(info["api_version"], 2);
    assert_eq!(info["version_tuple"], serde_json::json!([0, 1, 8]));
    assert_eq!(info["instance_name"], "Workshop");
}

#[test]
fn test_completions_bash() {
    itree()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("itree"));
}

// ============================================================================
// Init Tests
// ============================================================================

#[test]
fn test_init_creates_workspace() {
    let tmp = TempDir::new().unwrap();
    itree()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized itree workspace"));

    assert!(tmp.path().join(".itree").is_dir());
    assert!(tmp.path().join(".itree/config.yaml").is_file());
    assert!(tmp.path().join(".itree/inventory.db").is_file());
}

#[test]
fn test_init_twice_warns() {
    let tmp = setup_workspace();
    itree()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_commands_fail_outside_workspace() {
    let tmp = TempDir::new().unwrap();
    itree()
        .current_dir(tmp.path())
        .args(["category", "list"])
        .assert()
        .failure();
}

#[test]
fn test_workspace_option_from_elsewhere() {
    let tmp = setup_workspace();
    let elsewhere = TempDir::new().unwrap();
    itree()
        .current_dir(elsewhere.path())
        .args(["category", "new", "Remote", "-C"])
        .arg(tmp.path())
        .assert()
        .success();

    itree()
        .current_dir(tmp.path())
        .args(["category", "list", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Remote"));
}

// ============================================================================
// Category Tests
// ============================================================================

#[test]
fn test_category_tree_and_path() {
    let tmp = setup_workspace();
    let top = create(&tmp, &["category", "new", "Electronics"]);
    let child = create(&tmp, &["category", "new", "Boards", "--parent", &top]);
    assert!(top.starts_with("CAT-"));

    itree()
        .current_dir(tmp.path())
        .args(["category", "tree"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Electronics"))
        .stdout(predicate::str::contains("Boards"));

    itree()
        .current_dir(tmp.path())
        .args(["category", "show", &child])
        .assert()
        .success()
        .stdout(predicate::str::contains("Electronics/Boards"));
}

#[test]
fn test_category_duplicate_sibling_rejected() {
    let tmp = setup_workspace();
    create(&tmp, &["category", "new", "Tools"]);
    itree()
        .current_dir(tmp.path())
        .args(["category", "new", "Tools"])
        .assert()
        .failure();
}

#[test]
fn test_category_move_into_descendant_rejected() {
    let tmp = setup_workspace();
    let top = create(&tmp, &["category", "new", "Top"]);
    let child = create(&tmp, &["category", "new", "Child", "--parent", &top]);

    itree()
        .current_dir(tmp.path())
        .args(["category", "move", &top, "--parent", &child])
        .assert()
        .failure();

    itree()
        .current_dir(tmp.path())
        .args(["category", "move", &child, "--root"])
        .assert()
        .success();
}

#[test]
fn test_category_delete_cascades() {
    let tmp = setup_workspace();
    let top = create(&tmp, &["category", "new", "Top"]);
    let child = create(&tmp, &["category", "new", "Child", "--parent", &top]);
    let project = create(&tmp, &["project", "new", "--name", "Lamp", "--category", &child]);
    let part = create(&tmp, &["part", "new", "Bulb"]);
    create(&tmp, &["project", "add-part", &project, &part]);
    create(&tmp, &["run", "record", &project]);

    let report = stdout_json(&tmp, &["category", "delete", &top, "--yes"]);
    assert_eq!(report["categories"], 2);
    assert_eq!(report["projects"], 1);
    assert_eq!(report["project_parts"], 1);
    assert_eq!(report["runs"], 1);

    itree()
        .current_dir(tmp.path())
        .args(["project", "show", &project])
        .assert()
        .failure();

    // Parts are not owned by categories
    itree()
        .current_dir(tmp.path())
        .args(["part", "list", "-f", "id"])
        .assert()
        .success()
        .stdout(predicate::str::contains(part.as_str()));
}

#[test]
fn test_category_delete_requires_confirmation() {
    let tmp = setup_workspace();
    let top = create(&tmp, &["category", "new", "Top"]);
    itree()
        .current_dir(tmp.path())
        .args(["category", "delete", &top])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
}

// ============================================================================
// Project and Project Part Tests
// ============================================================================

#[test]
fn test_project_add_part_reuses_existing_association() {
    let tmp = setup_workspace();
    let cat = create(&tmp, &["category", "new", "Kits"]);
    let project = create(&tmp, &["project", "new", "--name", "Kit", "--category", &cat]);
    create(&tmp, &["part", "new", "Screw"]);

    let first = create(&tmp, &["project", "add-part", &project, "Screw", "-n", "4"]);
    let second = create(&tmp, &["project", "add-part", &project, "Screw", "-n", "9"]);
    assert!(first.starts_with("PP-"));
    assert_eq!(first, second);

    itree()
        .current_dir(tmp.path())
        .args(["project", "add-part", &project, "Screw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already on project"))
        .stdout(predicate::str::contains("4 x Screw"));

    let parts = stdout_json(&tmp, &["project", "parts", &project]);
    assert_eq!(parts.as_array().unwrap().len(), 1);
    assert_eq!(parts[0]["quantity"], 4);
}

#[test]
fn test_project_add_unknown_part_fails() {
    let tmp = setup_workspace();
    let cat = create(&tmp, &["category", "new", "Kits"]);
    let project = create(&tmp, &["project", "new", "--name", "Kit", "--category", &cat]);

    itree()
        .current_dir(tmp.path())
        .args([
            "project",
            "add-part",
            &project,
            "PART-01ARZ3NDEKTSV4RRFFQ69G5FAV",
        ])
        .assert()
        .failure();
}

#[test]
fn test_project_with_missing_category_fails() {
    let tmp = setup_workspace();
    itree()
        .current_dir(tmp.path())
        .args([
            "project",
            "new",
            "--name",
            "Orphan",
            "--category",
            "CAT-01ARZ3NDEKTSV4RRFFQ69G5FAV",
        ])
        .assert()
        .failure();
}

#[test]
fn test_project_id_of_wrong_kind_rejected() {
    let tmp = setup_workspace();
    let cat = create(&tmp, &["category", "new", "Kits"]);
    itree()
        .current_dir(tmp.path())
        .args(["project", "show", &cat])
        .assert()
        .failure();
}

#[test]
fn test_project_list_by_category() {
    let tmp = setup_workspace();
    let a = create(&tmp, &["category", "new", "A"]);
    let b = create(&tmp, &["category", "new", "B", "--parent", &a]);
    create(&tmp, &["project", "new", "--name", "InA", "--category", &a]);
    create(&tmp, &["project", "new", "--name", "InB", "--category", &b]);

    itree()
        .current_dir(tmp.path())
        .args(["project", "list", "--category", &a, "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("InA"))
        .stdout(predicate::str::contains("InB").not());
}

#[test]
fn test_project_import_bom() {
    let tmp = setup_workspace();
    let cat = create(&tmp, &["category", "new", "Kits"]);
    let project = create(&tmp, &["project", "new", "--name", "Kit", "--category", &cat]);

    fs::write(
        tmp.path().join("parts.csv"),
        "name,description\nResistor,10k\nBoard,\n",
    )
    .unwrap();
    itree()
        .current_dir(tmp.path())
        .args(["part", "import", "parts.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 part(s)"));

    fs::write(
        tmp.path().join("bom.csv"),
        "part,quantity,output\nResistor,3,\nBoard,1,yes\nResistor,7,\n",
    )
    .unwrap();
    itree()
        .current_dir(tmp.path())
        .args(["project", "import-bom", &project, "bom.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 added, 1 already present"));

    let parts = stdout_json(&tmp, &["project", "parts", &project]);
    let parts = parts.as_array().unwrap();
    assert_eq!(parts.len(), 2);
    let resistor = parts.iter().find(|p| p["part_name"] == "Resistor").unwrap();
    assert_eq!(resistor["quantity"], 3);
    assert_eq!(resistor["output"], false);
    let board = parts.iter().find(|p| p["part_name"] == "Board").unwrap();
    assert_eq!(board["output"], true);
}

// ============================================================================
// Run Tests
// ============================================================================

#[test]
fn test_run_show_stock_deltas() {
    let tmp = setup_workspace();
    let cat = create(&tmp, &["category", "new", "Assembly"]);
    let project = create(&tmp, &["project", "new", "--name", "Lamp", "--category", &cat]);
    create(&tmp, &["part", "new", "Bulb"]);
    create(&tmp, &["part", "new", "Lamp unit"]);
    create(&tmp, &["project", "add-part", &project, "Bulb", "-n", "2"]);
    create(&tmp, &["project", "add-part", &project, "Lamp unit", "--output"]);

    let run = create(&tmp, &["run", "record", &project, "-n", "3"]);
    assert!(run.starts_with("RUN-"));

    let detail = stdout_json(&tmp, &["run", "show", &run]);
    assert_eq!(detail["quantity"], 3);
    let deltas = detail["deltas"].as_array().unwrap();
    let bulb = deltas.iter().find(|d| d["part_name"] == "Bulb").unwrap();
    assert_eq!(bulb["delta"], -6);
    let lamp = deltas.iter().find(|d| d["part_name"] == "Lamp unit").unwrap();
    assert_eq!(lamp["delta"], 3);

    itree()
        .current_dir(tmp.path())
        .args(["run", "list", "--project", &project, "-f", "id"])
        .assert()
        .success()
        .stdout(predicate::str::contains(run.as_str()));
}

#[test]
fn test_run_zero_quantity_rejected() {
    let tmp = setup_workspace();
    let cat = create(&tmp, &["category", "new", "Assembly"]);
    let project = create(&tmp, &["project", "new", "--name", "Lamp", "--category", &cat]);
    itree()
        .current_dir(tmp.path())
        .args(["run", "record", &project, "-n", "0"])
        .assert()
        .failure();
}

// ============================================================================
// Setting and Status Tests
// ============================================================================

#[test]
fn test_setting_get_and_set() {
    let tmp = setup_workspace();
    itree()
        .current_dir(tmp.path())
        .args(["setting", "get", "INVENTREE_INSTANCE", "--default", "none"])
        .assert()
        .success()
        .stdout("none\n");

    itree()
        .current_dir(tmp.path())
        .args(["setting", "set", "INVENTREE_INSTANCE", "Lab"])
        .assert()
        .success();

    itree()
        .current_dir(tmp.path())
        .args(["setting", "get", "INVENTREE_INSTANCE"])
        .assert()
        .success()
        .stdout("Lab\n");
}

#[test]
fn test_status_counts() {
    let tmp = setup_workspace();
    let cat = create(&tmp, &["category", "new", "Assembly"]);
    create(&tmp, &["project", "new", "--name", "Lamp", "--category", &cat]);
    create(&tmp, &["part", "new", "Bulb"]);

    let status = stdout_json(&tmp, &["status"]);
    assert_eq!(status["categories"], 1);
    assert_eq!(status["projects"], 1);
    assert_eq!(status["parts"], 1);
    assert_eq!(status["runs"], 0);
}

#[test]
fn test_configured_default_format() {
    let tmp = setup_workspace();
    create(&tmp, &["category", "new", "Assembly"]);
    fs::write(tmp.path().join(".itree/config.yaml"), "default_format: tsv\n").unwrap();

    itree()
        .current_dir(tmp.path())
        .args(["category", "list"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ID\tPATH"));
}

// ============================================================================
// Import Atomicity, Quiet Output and Git Edge Cases
// ============================================================================

fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .is_ok()
}

#[test]
fn test_import_bom_with_bad_row_writes_nothing() {
    let tmp = setup_workspace();
    let cat = create(&tmp, &["category", "new", "Kits"]);
    let project = create(&tmp, &["project", "new", "--name", "Kit", "--category", &cat]);
    create(&tmp, &["part", "new", "Resistor"]);

    fs::write(
        tmp.path().join("bom.csv"),
        "part,quantity\nResistor,3\nGhost,1\n",
    )
    .unwrap();
    itree()
        .current_dir(tmp.path())
        .args(["project", "import-bom", &project, "bom.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("row 3"));

    itree()
        .current_dir(tmp.path())
        .args(["project", "parts", &project, "-f", "id"])
        .assert()
        .success()
        .stdout("");

    // The corrected file imports cleanly
    fs::write(tmp.path().join("bom.csv"), "part,quantity\nResistor,3\n").unwrap();
    itree()
        .current_dir(tmp.path())
        .args(["project", "import-bom", &project, "bom.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 added, 0 already present"));
}

#[test]
fn test_import_bom_rejects_zero_quantity_before_writing() {
    let tmp = setup_workspace();
    let cat = create(&tmp, &["category", "new", "Kits"]);
    let project = create(&tmp, &["project", "new", "--name", "Kit", "--category", &cat]);
    create(&tmp, &["part", "new", "Resistor"]);
    create(&tmp, &["part", "new", "Board"]);

    fs::write(
        tmp.path().join("bom.csv"),
        "part,quantity\nResistor,2\nBoard,0\n",
    )
    .unwrap();
    itree()
        .current_dir(tmp.path())
        .args(["project", "import-bom", &project, "bom.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid quantity"));

    let parts = stdout_json(&tmp, &["project", "parts", &project]);
    assert!(parts.as_array().unwrap().is_empty());
}

#[test]
fn test_part_import_with_blank_name_writes_nothing() {
    let tmp = setup_workspace();
    fs::write(
        tmp.path().join("parts.csv"),
        "name,description\nResistor,10k\n,missing name\n",
    )
    .unwrap();
    itree()
        .current_dir(tmp.path())
        .args(["part", "import", "parts.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("row 3"));

    itree()
        .current_dir(tmp.path())
        .args(["part", "list", "-f", "id"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_quiet_suppresses_confirmations() {
    let tmp = setup_workspace();
    itree()
        .current_dir(tmp.path())
        .args(["category", "new", "Quiet", "-q"])
        .assert()
        .success()
        .stdout("");
    let cat = create(&tmp, &["category", "new", "Loud"]);

    itree()
        .current_dir(tmp.path())
        .args(["category", "edit", &cat, "--name", "Renamed", "-q"])
        .assert()
        .success()
        .stdout("");
    itree()
        .current_dir(tmp.path())
        .args(["project", "new", "--name", "Kit", "--category", &cat, "-q"])
        .assert()
        .success()
        .stdout("");
    itree()
        .current_dir(tmp.path())
        .args(["part", "new", "Screw", "-q"])
        .assert()
        .success()
        .stdout("");

    // Explicit machine formats still print
    itree()
        .current_dir(tmp.path())
        .args(["part", "new", "Nut", "-q", "-f", "id"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("PART-"));
}

#[test]
fn test_version_in_repository_without_commits() {
    if !git_available() {
        return;
    }
    let tmp = setup_workspace();
    let init = std::process::Command::new("git")
        .args(["init", "-q"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(init.status.success());

    let info = stdout_json(&tmp, &["version"]);
    assert_eq!(info["version"], "0.1.8 pre");
    assert!(info["commit_hash"].is_null());
}

#[test]
fn test_renamed_database_is_git_ignored() {
    if !git_available() {
        return;
    }
    let tmp = TempDir::new().unwrap();
    let git = |args: &[&str]| {
        std::process::Command::new("git")
            .args(args)
            .current_dir(tmp.path())
            .output()
            .unwrap()
    };
    assert!(git(&["init", "-q"]).status.success());
    itree().current_dir(tmp.path()).arg("init").assert().success();
    fs::write(tmp.path().join(".itree/config.yaml"), "database: stock.sqlite\n").unwrap();
    create(&tmp, &["part", "new", "Bolt"]);
    assert!(tmp.path().join(".itree/stock.sqlite").is_file());

    assert!(git(&["check-ignore", "-q", ".itree/stock.sqlite"]).status.success());
    assert!(!git(&["check-ignore", "-q", ".itree/config.yaml"]).status.success());
}
