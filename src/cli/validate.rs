//! Validate command implementation

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::CliOverrides;

use super::{load_index, load_settings, EXIT_ERROR, EXIT_SUCCESS};

/// Execute the validate command
pub fn run_validate(config: Option<&Path>, library: Option<PathBuf>) -> ExitCode {
    let overrides = CliOverrides { library, ..Default::default() };
    let settings = match load_settings(config, &overrides) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let index = match load_index(&settings) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let geometry = index.geometry();
    println!(
        "Library '{}': {}x{} tiles, {} frames x {} rows ({}x{} sheet)",
        index.name(),
        geometry.frame_width,
        geometry.frame_height,
        geometry.frames,
        geometry.rows,
        geometry.sheet_width(),
        geometry.sheet_height()
    );
    for category in index.categories() {
        let values: Vec<String> =
            category.values.iter().map(|v| format!("{} ({})", v.name, v.weight)).collect();
        println!("  {} [z {}]: {}", category.name, category.z, values.join(", "));
    }
    for overlay in index.overlays() {
        println!(
            "  overlay {}: {} frames {}-{}",
            overlay.name,
            geometry.row_label(overlay.row),
            overlay.frames.0,
            overlay.frames.1
        );
    }
    println!("OK: {} assets", index.asset_count());

    ExitCode::from(EXIT_SUCCESS)
}
