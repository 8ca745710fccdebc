//! Spriteforge - command-line sprite sheet generator

use std::process::ExitCode;

use spriteforge::cli;

fn main() -> ExitCode {
    cli::run()
}
