use clap::{Args, ValueHint};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    #[arg(
        id = "config",
        long,
        short = 'c',
        help = "Sets the generator config JSON file to use",
        value_hint = ValueHint::FilePath
    )]
    pub config: PathBuf,

    #[arg(
        long,
        short = 'o',
        help = "Generated HEVC output file location",
        value_hint = ValueHint::FilePath
    )]
    pub output: Option<PathBuf>,
}
