//! Slice command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::catalog::builtin::ROW_NAMES;
use crate::encoder;
use crate::spritesheet::slice_frame;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Row index from a number or a built-in row name.
fn parse_row(row: &str) -> Option<u32> {
    row.parse::<u32>()
        .ok()
        .or_else(|| ROW_NAMES.iter().position(|n| *n == row).map(|i| i as u32))
}

/// Execute the slice command
pub fn run_slice(sheet: &Path, row: &str, col: u32, tile: u32, output: &Path) -> ExitCode {
    let Some(row_index) = parse_row(row) else {
        eprintln!("Error: Unknown row '{}' (use an index or one of: {})", row, ROW_NAMES.join(", "));
        return ExitCode::from(EXIT_INVALID_ARGS);
    };

    let image = match image::open(sheet) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            eprintln!("Error: Cannot open '{}': {}", sheet.display(), e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let frame = match slice_frame(&image, (tile, tile), row_index, col) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let mut log = crate::resolver::GenerationLog::new();
    let written = encoder::encode(&frame, &mut log).and_then(|png| encoder::save(&png.bytes, output));
    if let Err(e) = written {
        eprintln!("Error: Failed to write '{}': {}", output.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    println!("Saved: {} (row {}, frame {})", output.display(), row_index, col);
    ExitCode::from(EXIT_SUCCESS)
}
