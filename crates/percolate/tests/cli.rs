use std::path::PathBuf;
use std::process::Command;

fn percolate_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_percolate"))
}

#[test]
fn help_lists_subcommands() {
    let output = Command::new(percolate_binary())
        .arg("--help")
        .output()
        .expect("failed to run percolate");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("serve"), "stdout: {stdout}");
    assert!(stdout.contains("watch"), "stdout: {stdout}");
}

#[test]
fn watch_missing_root_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");

    let output = Command::new(percolate_binary())
        .arg("watch")
        .arg(&missing)
        .output()
        .expect("failed to run percolate");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Cannot watch"), "stderr: {stderr}");
}

#[test]
fn quiet_and_verbose_conflict() {
    let output = Command::new(percolate_binary())
        .args(["watch", "--quiet", "--verbose"])
        .output()
        .expect("failed to run percolate");

    assert!(!output.status.success());
}
