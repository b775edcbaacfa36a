use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_cli_writes_text_tzip_in_working_directory() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Setup: a source directory with two text files and one ignored file
    let source_dir = tempdir()?;
    fs::write(source_dir.path().join("b.txt"), "aaa aaa aaa aaa aaa aaa aaa aaa")?;
    fs::write(source_dir.path().join("a.txt"), "bbb bbb bbb bbb bbb bbb bbb bbb")?;
    fs::write(source_dir.path().join("skip.log"), "ignored")?;
    let work_dir = tempdir()?;

    // 2. Run with only the positional argument
    let mut cmd = Command::cargo_bin("tzip")?;
    cmd.current_dir(work_dir.path()).arg(source_dir.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::is_match(r"^Compression rate: -?\d+\.\d{2}%\n$")?);

    // 3. Two records, nothing else
    let archive = fs::read(work_dir.path().join("text.tzip"))?;
    let records = tzip::archive::ArchiveReader::new(archive.as_slice()).collect::<Result<Vec<_>, _>>()?;
    assert_eq!(records.len(), 2);
    assert_eq!(tzip::compress::inflate(&records[0])?, b"bbb bbb bbb bbb bbb bbb bbb bbb");

    Ok(())
}

#[test]
fn test_cli_missing_directory_fails_without_archive() -> Result<(), Box<dyn std::error::Error>> {
    let work_dir = tempdir()?;
    let mut cmd = Command::cargo_bin("tzip")?;
    cmd.current_dir(work_dir.path()).arg(work_dir.path().join("absent"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot open directory"));

    assert!(!work_dir.path().join("text.tzip").exists());
    Ok(())
}

#[test]
fn test_cli_empty_directory_reports_undefined_ratio() -> Result<(), Box<dyn std::error::Error>> {
    let source_dir = tempdir()?;
    let out_dir = tempdir()?;
    let archive = out_dir.path().join("none.tzip");

    let mut cmd = Command::cargo_bin("tzip")?;
    cmd.arg(source_dir.path()).arg("--output").arg(&archive);
    cmd.assert().success().stdout("Compression rate: n/a\n");

    assert_eq!(fs::metadata(&archive)?.len(), 0);
    Ok(())
}

#[test]
fn test_cli_json_report() -> Result<(), Box<dyn std::error::Error>> {
    let source_dir = tempdir()?;
    for i in 0..5 {
        fs::write(source_dir.path().join(format!("{i}.txt")), "line\n".repeat(100 * (i + 1)))?;
    }
    let out_dir = tempdir()?;
    let archive = out_dir.path().join("report.tzip");

    let mut cmd = Command::cargo_bin("tzip")?;
    cmd.arg(source_dir.path())
        .args(["-o"])
        .arg(&archive)
        .args(["--threads", "2", "--verify", "--report", "json"]);
    let output = cmd.assert().success().get_output().stdout.clone();

    let report: serde_json::Value = serde_json::from_slice(&output)?;
    assert_eq!(report["files"], 5);
    assert_eq!(report["records"], 5);
    assert_eq!(report["threads"], 2);
    assert_eq!(report["total_in"], 7500);
    assert!(report["ratio_percent"].as_f64().unwrap() > 50.0);
    Ok(())
}

#[test]
fn test_cli_rejects_bad_level() -> Result<(), Box<dyn std::error::Error>> {
    let source_dir = tempdir()?;
    let mut cmd = Command::cargo_bin("tzip")?;
    cmd.arg(source_dir.path()).args(["--level", "12"]);
    cmd.assert().failure();
    Ok(())
}
