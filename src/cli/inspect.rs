//! Inspect command implementation

use std::path::PathBuf;
use std::process::ExitCode;

use crate::inspect::inspect_png;

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Execute the inspect command
pub fn run_inspect(files: &[PathBuf], tile: u32) -> ExitCode {
    let mut failed = false;

    for path in files {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("Error: Cannot read '{}': {}", path.display(), e);
                failed = true;
                continue;
            }
        };
        match inspect_png(&bytes) {
            Ok(info) => match info.grid((tile, tile)) {
                Some((frames, rows)) => println!(
                    "{}: {}, {} frames x {} rows of {}px tiles",
                    path.display(),
                    info,
                    frames,
                    rows,
                    tile
                ),
                None => println!("{}: {}, not a {}px tile grid", path.display(), info, tile),
            },
            Err(e) => {
                eprintln!("Error: {}: {}", path.display(), e);
                failed = true;
            }
        }
    }

    ExitCode::from(if failed { EXIT_ERROR } else { EXIT_SUCCESS })
}
