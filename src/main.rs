use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
use commands::Command;

mod stream;
use stream::{generator::Generator, stream_info::StreamInfo};

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    about = "Packs and inspects HEVC parameter sets, SEI and skip pictures",
    author = "quietvoid",
    version = option_env!("VERGEN_GIT_DESCRIBE").unwrap_or(env!("CARGO_PKG_VERSION"))
)]
struct Opt {
    #[arg(long, short = 'v', global = true, help = "Log progress details to stderr")]
    verbose: bool,

    #[arg(
        long,
        short = 'd',
        global = true,
        help = "Log bitstream level details to stderr"
    )]
    debug: bool,

    #[command(subcommand)]
    cmd: Command,
}

fn main() -> Result<()> {
    let opt = Opt::parse();

    init_logging(opt.verbose, opt.debug);

    match opt.cmd {
        Command::Info(args) => StreamInfo::info(args),
        Command::Generate(args) => Generator::generate(args),
    }
}

fn init_logging(verbose: bool, debug: bool) {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        return;
    };

    // RUST_LOG still wins when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
