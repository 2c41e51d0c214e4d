use std::path::Path;

use anyhow::Result;
use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

use hevc_bitstream::bits::BitReader;
use hevc_bitstream::header_reader::{nal_units, read_sps};
use hevc_bitstream::hevc::*;

const SUBCOMMAND: &str = "generate";

#[test]
fn help() -> Result<()> {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    let assert = cmd.arg(SUBCOMMAND).arg("--help").assert();

    assert
        .success()
        .stderr(predicate::str::is_empty())
        .stdout(predicate::str::contains("hevc_packer generate [OPTIONS]"));
    Ok(())
}

#[test]
fn generate_default() -> Result<()> {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    let temp = assert_fs::TempDir::new().unwrap();

    let config = Path::new("assets/generator_examples/default.json");
    let output = temp.child("skip.hevc");

    let assert = cmd
        .arg(SUBCOMMAND)
        .arg("--config")
        .arg(config)
        .arg("--output")
        .arg(output.as_ref())
        .assert();

    assert
        .success()
        .stderr(predicate::str::is_empty())
        .stdout(predicate::str::contains("Done."));

    output.assert(predicate::path::is_file());

    let data = std::fs::read(output.path())?;
    let types: Vec<u8> = nal_units(&data).iter().map(|n| n.header.nal_unit_type).collect();

    // AUD and parameter sets, then one AUD and slice per picture
    assert_eq!(
        types,
        vec![
            NAL_AUD, NAL_VPS, NAL_SPS, NAL_PPS, NAL_TRAIL_R, NAL_AUD, NAL_TRAIL_R, NAL_AUD,
            NAL_TRAIL_R, NAL_AUD, NAL_TRAIL_R
        ]
    );
    assert_eq!(&data[..4], &[0, 0, 0, 1]);

    let sps = read_sps(&mut BitReader::new(&data))?;
    assert_eq!(sps.pic_width_in_luma_samples, 320);
    assert_eq!(sps.pic_height_in_luma_samples, 240);
    assert!(!sps.short_term_ref_pic_sets.is_empty());

    Ok(())
}

#[test]
fn generate_hrd_b_frames() -> Result<()> {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    let temp = assert_fs::TempDir::new().unwrap();

    let config = Path::new("assets/generator_examples/hrd_b_frames.json");
    let output = temp.child("skip.hevc");

    let assert = cmd
        .arg(SUBCOMMAND)
        .arg("-c")
        .arg(config)
        .arg("-o")
        .arg(output.as_ref())
        .assert();

    assert.success().stderr(predicate::str::is_empty());

    let data = std::fs::read(output.path())?;
    let nals = nal_units(&data);

    let count = |nal_unit_type: u8| {
        nals.iter()
            .filter(|n| n.header.nal_unit_type == nal_unit_type)
            .count()
    };

    assert_eq!(count(NAL_AUD), 8);
    assert_eq!(count(NAL_SEI_PREFIX), 8);
    // 2 anchors and 6 B pictures, 3 slices each
    assert_eq!(count(NAL_TRAIL_R), 6);
    assert_eq!(count(NAL_TRAIL_N), 18);

    let sps = read_sps(&mut BitReader::new(&data))?;
    assert!(sps.vui_parameters.hrd_parameters_present_flag);
    // 1080 is padded to the 8 sample minimum CU size
    assert_eq!(sps.pic_height_in_luma_samples, 1088);
    assert!(sps.conformance_window_flag);

    Ok(())
}

#[test]
fn invalid_config() -> Result<()> {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    let temp = assert_fs::TempDir::new().unwrap();

    let config = temp.child("config.json");
    config.write_str(r#"{ "width": 640, "height": 480, "qp": 80 }"#)?;

    let assert = cmd
        .arg(SUBCOMMAND)
        .arg("--config")
        .arg(config.as_ref())
        .arg("--output")
        .arg(temp.child("out.hevc").as_ref())
        .assert();

    assert
        .failure()
        .stderr(predicate::str::contains("qp must be between 0 and 51"));

    Ok(())
}
