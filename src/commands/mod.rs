use clap::Parser;

mod generate;
mod info;

pub use generate::GenerateArgs;
pub use info::InfoArgs;

#[derive(Parser, Debug)]
pub enum Command {
    #[command(about = "Lists the NAL units of an Annex-B HEVC file and prints its parameter sets as JSON")]
    Info(InfoArgs),

    #[command(about = "Generates skip pictures with their parameter sets from a JSON config")]
    Generate(GenerateArgs),
}
