//! skinsheet - command-line spritesheet exporter and importer

use std::process::ExitCode;

use skinsheet::cli;

fn main() -> ExitCode {
    cli::run()
}
