//! CLI surface tests for the shunter binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn shunter() -> Command {
    Command::cargo_bin("shunter").expect("shunter binary")
}

// ---------------------------------------------------------------------------
// resolve
// ---------------------------------------------------------------------------

#[test]
fn resolve_substitutes_images_from_stdin_to_stdout() {
    let input = "\
apiVersion: apps/v1
kind: Deployment
metadata:
  name: app
spec:
  containers:
  - name: c
    image: myimage
";

    shunter()
        .args(["resolve", "--image", "myimage=replaced:latest"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("image: replaced:latest"));
}

#[test]
fn resolve_reads_and_writes_files() {
    let tmp = TempDir::new().unwrap();
    let infile = tmp.path().join("in.yaml");
    let outfile = tmp.path().join("out.yaml");
    std::fs::write(
        &infile,
        "kind: ConfigMap\nmetadata:\n  name: cm\ndata:\n  k: v\n",
    )
    .unwrap();

    shunter()
        .args([
            "resolve",
            "--infile",
            &infile.to_string_lossy(),
            "--outfile",
            &outfile.to_string_lossy(),
        ])
        .assert()
        .success();

    let out = std::fs::read_to_string(&outfile).unwrap();
    assert!(out.contains("kind: ConfigMap"));
}

#[test]
fn resolve_rejects_malformed_image_flag() {
    shunter()
        .args(["resolve", "--image", "missing-equals"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("imagename=imagevalue"));
}

#[test]
fn resolve_fails_on_unresolved_build_label() {
    let input = "\
kind: Deployment
metadata:
  name: app
spec:
  containers:
  - name: c
    image: \"//bazel/target:image\"
";

    shunter()
        .arg("resolve")
        .write_stdin(input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unresolved image"));
}

// ---------------------------------------------------------------------------
// filter
// ---------------------------------------------------------------------------

#[test]
fn filter_drops_pvc_documents() {
    let input = "\
kind: PersistentVolumeClaim
metadata:
  name: data
---
kind: Service
metadata:
  name: svc
";

    shunter()
        .arg("filter")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("kind: Service"))
        .stdout(predicate::str::contains("PersistentVolumeClaim").not());
}

#[test]
fn filter_reports_documents_without_kind() {
    shunter()
        .arg("filter")
        .write_stdin("metadata:\n  name: x\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing kind"));
}

// ---------------------------------------------------------------------------
// expand
// ---------------------------------------------------------------------------

#[test]
fn expand_substitutes_variables_and_preserves_unknowns() {
    let tmp = TempDir::new().unwrap();
    let tpl = tmp.path().join("tpl.txt");
    std::fs::write(&tpl, "{{known}} and {{unknown}}").unwrap();

    shunter()
        .args([
            "expand",
            "--template",
            &tpl.to_string_lossy(),
            "--variable",
            "known=yes",
        ])
        .assert()
        .success()
        .stdout("yes and {{unknown}}");
}

#[test]
fn expand_writes_output_file_with_stamps() {
    let tmp = TempDir::new().unwrap();
    let status = tmp.path().join("status.txt");
    let tpl = tmp.path().join("tpl.txt");
    let out = tmp.path().join("out.txt");
    std::fs::write(&status, "STABLE_GIT_COMMIT abc123\n").unwrap();
    std::fs::write(&tpl, "commit={{STABLE_GIT_COMMIT}}").unwrap();

    shunter()
        .args([
            "expand",
            "--template",
            &tpl.to_string_lossy(),
            "--output",
            &out.to_string_lossy(),
            "--stamp_info_file",
            &status.to_string_lossy(),
        ])
        .assert()
        .success();

    assert_eq!(std::fs::read_to_string(&out).unwrap(), "commit=abc123");
}

#[test]
fn expand_rejects_malformed_variable() {
    let tmp = TempDir::new().unwrap();
    let tpl = tmp.path().join("tpl.txt");
    std::fs::write(&tpl, "x").unwrap();

    shunter()
        .args([
            "expand",
            "--template",
            &tpl.to_string_lossy(),
            "--variable",
            "NOEQUALS",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NAME=VALUE"));
}

// ---------------------------------------------------------------------------
// stamp
// ---------------------------------------------------------------------------

#[test]
fn stamp_expands_single_brace_placeholders() {
    let tmp = TempDir::new().unwrap();
    let status = tmp.path().join("status.txt");
    std::fs::write(&status, "STABLE_GIT_BRANCH main\n").unwrap();

    shunter()
        .args([
            "stamp",
            "--stamp-info-file",
            &status.to_string_lossy(),
            "--format",
            "branch={STABLE_GIT_BRANCH}",
        ])
        .assert()
        .success()
        .stdout("branch=main");
}

#[test]
fn stamp_rejects_both_format_and_format_file() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("fmt.txt");
    std::fs::write(&file, "x").unwrap();

    shunter()
        .args([
            "stamp",
            "--format",
            "x",
            "--format-file",
            &file.to_string_lossy(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("only one of"));
}

// ---------------------------------------------------------------------------
// create-prs
// ---------------------------------------------------------------------------

#[test]
fn create_prs_requires_provider_credentials() {
    shunter()
        .args(["create-prs", "--git_server", "github"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be set"));
}

#[test]
fn create_prs_rejects_unknown_git_server() {
    shunter()
        .args(["create-prs", "--git_server", "sourcehut"])
        .assert()
        .failure();
}

#[test]
#[cfg(unix)]
fn create_prs_with_no_matching_targets_succeeds_without_cloning() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    let bazel = tmp.path().join("bazel");
    std::fs::write(&bazel, "#!/bin/sh\nprintf '%s' '{\"results\":[]}'\n").unwrap();
    std::fs::set_permissions(&bazel, std::fs::Permissions::from_mode(0o755)).unwrap();

    shunter()
        .args([
            "create-prs",
            "--bazel_cmd",
            &bazel.to_string_lossy(),
            "--target",
            "//...",
            "--release_branch",
            "release/v1",
            "--github_repo_owner",
            "acme",
            "--github_repo",
            "manifests",
            "--github_access_token",
            "token",
        ])
        .assert()
        .success();
}
