//! CLI smoke tests against the built binary

use anyhow::Result;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn gofacts(dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_gofacts"));
    command.current_dir(dir).env_remove("RUST_LOG");
    command
}

fn fixtures() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/go")
}

#[test]
fn test_tags_command_prints_entries() -> Result<()> {
    let temp = TempDir::new()?;
    let output = gofacts(temp.path())
        .args(["tags", r#"json:"-," xml:"x,attr""#])
        .output()?;
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["entries"][0]["name"], "-");
    assert_eq!(value["entries"][0]["skip"], false);
    assert_eq!(value["entries"][1]["options"][0], "attr");
    Ok(())
}

#[test]
fn test_malformed_tag_fails() -> Result<()> {
    let temp = TempDir::new()?;
    let output = gofacts(temp.path()).args(["tags", "json:\"abc"]).output()?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Malformed struct tag"));
    Ok(())
}

#[test]
fn test_report_walks_directories() -> Result<()> {
    let temp = TempDir::new()?;
    let output = gofacts(temp.path())
        .arg("types")
        .arg(fixtures())
        .output()?;
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let files = value.as_array().unwrap();
    assert_eq!(files.len(), 5);
    // sorted by file name: embedded_field, invalid, json, promotion, simple
    assert!(files[4]["path"].as_str().unwrap().ends_with("simple.go"));
    Ok(())
}

#[test]
fn test_unparsable_file_sets_exit_code() -> Result<()> {
    let temp = TempDir::new()?;
    std::fs::write(temp.path().join("broken.go"), "package p\n\ntype S struct {\n")?;
    std::fs::copy(fixtures().join("simple.go"), temp.path().join("simple.go"))?;

    let output = gofacts(temp.path()).args(["report", "."]).output()?;
    assert_eq!(output.status.code(), Some(1));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value[0]["error"]["code"], "SYNTAX_ERROR");
    assert!(value[1]["scopes"].is_array());
    Ok(())
}

#[test]
fn test_init_then_config() -> Result<()> {
    let temp = TempDir::new()?;
    let init = gofacts(temp.path()).arg("init").output()?;
    assert!(init.status.success());
    assert!(temp.path().join(".gofacts/settings.toml").exists());

    let again = gofacts(temp.path()).arg("init").output()?;
    assert!(!again.status.success());

    let config = gofacts(temp.path())
        .arg("config")
        .env("GOFACTS_REPORT__MAX_PROMOTION_DEPTH", "3")
        .output()?;
    let stdout = String::from_utf8_lossy(&config.stdout);
    assert!(stdout.contains("max_promotion_depth = 3"), "{stdout}");
    Ok(())
}
