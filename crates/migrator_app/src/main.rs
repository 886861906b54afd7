mod cli;
mod effects;
mod logging;
mod render;
mod session;

use std::process::ExitCode;

use clap::Parser;

fn main() -> anyhow::Result<ExitCode> {
    let args = cli::Cli::parse();
    logging::initialize(
        args.log_destination(),
        logging::level_for_verbosity(args.verbose),
    );
    cli::run(args)
}
