//! nogo-builder CLI entry point.

use clap::Parser;
use nogo_builder::cli::{self, Cli, Commands, EXIT_ERROR};
use nogo_builder::params;

fn main() {
    // Parameter files are expanded before any flag is parsed.
    let args = match params::expand_args(std::env::args()) {
        Ok(args) => cli::normalize_flags(args),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_ERROR);
        }
    };
    let cli = Cli::parse_from(args);

    let verbose = matches!(&cli.command, Commands::Nogo(args) if args.verbose);
    cli::init_tracing(&cli.log_level, verbose);

    let exit_code = match cli.command {
        Commands::Nogo(args) => match cli::run_nogo(&args) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                EXIT_ERROR
            }
        },
        Commands::Validate(args) => match cli::run_validate(&args) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                EXIT_ERROR
            }
        },
    };

    std::process::exit(exit_code);
}
