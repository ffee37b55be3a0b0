//! Binary entry point for the `shutter` CLI.

use std::io;
use std::process;

use clap::Parser;

fn main() {
    let cli = shutter_cli::Cli::parse();
    let exit_code = match shutter_cli::run(cli, &mut io::stdout().lock()) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error}");
            1
        }
    };
    process::exit(exit_code);
}
