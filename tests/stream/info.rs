use std::path::Path;

use anyhow::Result;
use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

const SUBCOMMAND: &str = "info";

fn generate(output: &Path) -> Result<()> {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;

    cmd.arg("generate")
        .arg("--config")
        .arg("assets/generator_examples/default.json")
        .arg("--output")
        .arg(output)
        .assert()
        .success();

    Ok(())
}

#[test]
fn help() -> Result<()> {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    let assert = cmd.arg(SUBCOMMAND).arg("--help").assert();

    assert
        .success()
        .stderr(predicate::str::is_empty())
        .stdout(predicate::str::contains("hevc_packer info [OPTIONS]"));
    Ok(())
}

#[test]
fn summary() -> Result<()> {
    let temp = assert_fs::TempDir::new().unwrap();
    let stream = temp.child("skip.hevc");
    generate(stream.path())?;

    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    let assert = cmd.arg(SUBCOMMAND).arg(stream.path()).arg("--summary").assert();

    assert.success().stderr(predicate::str::is_empty()).stdout(
        predicate::str::contains("Summary:")
            .and(predicate::str::contains("  NAL units: 11"))
            .and(predicate::str::contains("  Pictures: 4"))
            .and(predicate::str::contains("TRAIL_R"))
            .and(predicate::str::contains("\"sps\"").not()),
    );

    Ok(())
}

#[test]
fn parameter_sets_json() -> Result<()> {
    let temp = assert_fs::TempDir::new().unwrap();
    let stream = temp.child("skip.hevc");
    generate(stream.path())?;

    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    let assert = cmd.arg(SUBCOMMAND).arg("-i").arg(stream.path()).assert();

    assert.success().stderr(predicate::str::is_empty()).stdout(
        predicate::str::contains("\"vps\"")
            .and(predicate::str::contains("\"pic_width_in_luma_samples\": 320"))
            .and(predicate::str::contains("\"pps_pic_parameter_set_id\": 0")),
    );

    Ok(())
}

#[test]
fn not_annexb() -> Result<()> {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = temp.child("garbage.bin");
    input.write_binary(&[0xFF; 64])?;

    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    let assert = cmd.arg(SUBCOMMAND).arg(input.path()).assert();

    assert
        .failure()
        .stderr(predicate::str::contains("No NALU start codes found"));

    Ok(())
}
