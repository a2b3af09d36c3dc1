// CLI integration tests for tree-cache

use std::process::Command;

fn tree_cache() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_tree-cache"));
    // Keep the user's configuration out of the tests
    command.env("XDG_CONFIG_HOME", "/nonexistent/tree-cache-tests");
    command
}

/// Test that --help flag shows the declarations subcommand
#[test]
fn test_help_flag_shows_help_message() {
    let output = tree_cache()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "Help should exit with success");
    assert!(
        stdout.contains("declarations"),
        "Help should show declarations subcommand. Got: {}",
        stdout
    );
}

#[test]
fn test_declarations_text_output() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("lib.rs");
    std::fs::write(&file, "const LIMIT: u32 = 3;\n\nfn run() {}\n").unwrap();

    let output = tree_cache()
        .current_dir(dir.path())
        .args(["declarations"])
        .arg(&file)
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("1:7\tconst\tLIMIT"), "Got: {}", stdout);
    assert!(stdout.contains("3:4\tfunction\trun"), "Got: {}", stdout);
}

#[test]
fn test_declarations_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("lib.rs");
    std::fs::write(&file, "static COUNT: u8 = 0;\n").unwrap();

    let output = tree_cache()
        .current_dir(dir.path())
        .args(["declarations", "--json"])
        .arg(&file)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let declarations = &json[0]["declarations"];
    assert_eq!(declarations[0]["capture"], "globalVar");
    assert_eq!(declarations[0]["text"], "COUNT");
    assert_eq!(declarations[0]["range"]["start"]["column"], 7);
}

#[test]
fn test_config_file_overrides_declaration_patterns() {
    let dir = tempfile::tempdir().unwrap();
    let patterns = "(const_item name: (identifier) @const)";
    std::fs::write(dir.path().join("consts.scm"), patterns).unwrap();
    let config = dir.path().join("custom.toml");
    let settings = "capacity = 4\n\n[declarations]\npath = \"consts.scm\"\n";
    std::fs::write(&config, settings).unwrap();
    let file = dir.path().join("lib.rs");
    std::fs::write(&file, "fn skipped() {}\nconst KEPT: u8 = 1;\n").unwrap();

    let output = tree_cache()
        .arg("--config")
        .arg(&config)
        .arg("declarations")
        .arg(&file)
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("KEPT"), "Got: {}", stdout);
    assert!(!stdout.contains("skipped"), "Got: {}", stdout);
}

#[test]
fn test_missing_file_fails() {
    let output = tree_cache()
        .args(["declarations", "/nonexistent/tree-cache/lib.rs"])
        .output()
        .expect("Failed to execute command");
    assert!(!output.status.success());
}
