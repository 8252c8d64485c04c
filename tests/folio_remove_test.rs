use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const PAGE: &str = "<h5 id=\"prev-title\">x</h5>\n<h5 id=\"next-title\">x</h5>\n";

fn record(id: &str, folder: &str, prev: &str, next: &str) -> Value {
    json!({
        "brief": "demo",
        "demo-url": format!("/{folder}/"),
        "docs-url": format!("/{folder}/docs/"),
        "gif-url": format!("imgs/{id}.gif"),
        "id": id,
        "name": folder,
        "next-id": next,
        "pic-url": format!("imgs/{id}.jpg"),
        "prev-id": prev,
        "status": "active",
        "tags": [],
        "vid-url": format!("vids/{id}.mp4"),
    })
}

fn write_site(root: &Path) {
    fs::create_dir_all(root.join("imgs")).expect("mkdir imgs");
    for (id, folder) in [("p_000", "alpha"), ("p_001", "beta"), ("p_002", "gamma")] {
        fs::create_dir_all(root.join(folder)).expect("mkdir project");
        fs::write(root.join(folder).join("index.html"), PAGE).expect("write page");
        fs::write(root.join(format!("imgs/{id}.jpg")), b"jpg").expect("write image");
    }
    let registry = json!({
        "projects": {
            "p_000": record("p_000", "alpha", "p_002", "p_001"),
            "p_001": record("p_001", "beta", "p_000", "p_002"),
            "p_002": record("p_002", "gamma", "p_001", "p_000"),
        }
    });
    fs::write(
        root.join("projects.json"),
        serde_json::to_string_pretty(&registry).expect("serialize"),
    )
    .expect("write registry");
}

fn folio(root: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("folio");
    cmd.current_dir(root)
        .env("FOLIO_CONFIG_PATH", root.join("no-such-config.toml"))
        .env("FOLIO_LOGS_DIR", root.join("logs"))
        .arg("--root")
        .arg(root);
    cmd
}

fn snapshot(root: &Path) -> Vec<Vec<u8>> {
    [
        "projects.json",
        "alpha/index.html",
        "beta/index.html",
        "gamma/index.html",
        "imgs/p_001.jpg",
    ]
    .iter()
    .map(|f| fs::read(root.join(f)).expect("read"))
    .collect()
}

#[test]
fn declined_remove_leaves_everything_untouched() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    write_site(root);
    let before = snapshot(root);

    folio(root)
        .args(["remove", "beta"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicates::str::contains("deletion aborted"));

    assert_eq!(snapshot(root), before);
    assert!(!root.join("logs/audit.log").exists());
}

#[test]
fn closed_stdin_declines_remove() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    write_site(root);
    let before = snapshot(root);

    folio(root)
        .args(["remove", "beta"])
        .write_stdin("")
        .assert()
        .success();

    assert_eq!(snapshot(root), before);
}

#[test]
fn confirmed_remove_deletes_project_and_reserves_its_id() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    write_site(root);

    folio(root)
        .args(["remove", "gamma"])
        .write_stdin("y\n")
        .assert()
        .success();

    assert!(!root.join("gamma").exists());
    assert!(!root.join("imgs/p_002.jpg").exists());
    let raw = fs::read_to_string(root.join("projects.json")).expect("read");
    let reg: Value = serde_json::from_str(&raw).expect("parse");
    assert!(reg["projects"].get("p_002").is_none());
    assert_eq!(reg["last-id"], "p_002");
    assert_eq!(reg["projects"]["p_001"]["next-id"], "p_000");
    assert_eq!(reg["projects"]["p_000"]["prev-id"], "p_001");

    folio(root)
        .args(["add", "delta", "new"])
        .assert()
        .success()
        .stdout(predicates::str::contains("id=p_003"));
}

#[test]
fn remove_with_yes_skips_prompt() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    write_site(root);

    folio(root)
        .args(["remove", "beta", "--yes"])
        .assert()
        .success()
        .stdout(predicates::str::contains("deleted="));

    assert!(!root.join("beta").exists());
    folio(root).arg("verify").assert().success();
}

#[test]
fn removing_unknown_project_fails_without_prompting() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    write_site(root);

    folio(root)
        .args(["remove", "nope"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("(y/n)").not())
        .stderr(predicates::str::contains("E003_NOT_FOUND"));
}

#[test]
fn json_report_stays_parseable_when_prompting() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    write_site(root);

    let output = folio(root)
        .args(["--json", "remove", "beta"])
        .write_stdin("n\n")
        .output()
        .expect("run");

    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["command"], "remove");
    assert!(String::from_utf8_lossy(&output.stderr).contains("(y/n)"));
    assert!(root.join("beta").exists());
}
