//! mockkit CLI: generates trait mocks for the mockkit runtime.
//!
//! `mockkit gen` renders one mock, `mockkit batch` regenerates every mock
//! listed in `mockkit.json`. See `mockkit --help` for usage.

use clap::Parser;

mod cli_args;
mod commands;
mod logging;

use cli_args::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let exit_code = match cli.command {
        Commands::Gen(args) => commands::gen_cmd::run(args),
        Commands::Batch { config } => commands::batch::run(config),
    };
    std::process::exit(exit_code);
}
