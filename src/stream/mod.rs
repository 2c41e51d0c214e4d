pub mod generator;
pub mod stream_info;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

/// Raw streams above this size are most likely a mistake for this tool.
const MAX_INPUT_SIZE: u64 = 1_000_000_000;

pub fn input_from_either(cmd: &str, in1: Option<PathBuf>, in2: Option<PathBuf>) -> Result<PathBuf> {
    match in1 {
        Some(in1) => Ok(in1),
        None => match in2 {
            Some(in2) => Ok(in2),
            None => bail!("No input file provided. See `{} --help`", cmd),
        },
    }
}

pub fn initialize_progress_bar(len: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:60.cyan} {percent}%")?,
    );

    Ok(pb)
}

/// Reads a whole Annex-B file into memory.
pub fn read_annexb_file(input: &Path) -> Result<Vec<u8>> {
    let file = File::open(input).with_context(|| format!("Can't open {}", input.display()))?;
    let metadata = file.metadata()?;

    if metadata.len() > MAX_INPUT_SIZE {
        bail!("Input file probably too large");
    }

    let mut reader = BufReader::new(file);
    let mut data = Vec::with_capacity(metadata.len() as usize);
    reader.read_to_end(&mut data)?;

    Ok(data)
}
