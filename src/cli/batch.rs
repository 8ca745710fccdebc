//! Batch command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::batch::{generate_batch, write_outputs};
use crate::config::CliOverrides;
use crate::resolver::GenerationOptions;
use crate::rng::Seed;

use super::{load_index, load_settings, EXIT_ERROR, EXIT_SUCCESS};

/// Execute the batch command
pub fn run_batch(
    config: Option<&Path>,
    overrides: &CliOverrides,
    traits: Vec<(String, String)>,
) -> ExitCode {
    let settings = match load_settings(config, overrides) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let problems = settings.validate();
    if !problems.is_empty() {
        for problem in problems {
            eprintln!("Error: {}", problem);
        }
        return ExitCode::from(EXIT_ERROR);
    }
    let index = match load_index(&settings) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let options: GenerationOptions = traits.into_iter().collect();
    let seeds: Vec<Seed> = settings.batch_seeds().map(Seed::Number).collect();
    println!(
        "Generating {} sheets from '{}' into {}",
        seeds.len(),
        index.name(),
        settings.output.dir.display()
    );

    let report = match generate_batch(&index, &seeds, &options, settings.batch.jobs) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let written = match write_outputs(
        &report,
        &settings.output.dir,
        settings.output.metadata,
        &settings.output.name_prefix,
    ) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    for item in report.failures() {
        eprintln!("  seed {}: {}", item.seed, item.status);
    }
    for group in &report.duplicates {
        let seeds: Vec<String> = group.seeds.iter().map(Seed::to_string).collect();
        eprintln!("Warning: identical sheets for seeds {}", seeds.join(", "));
    }
    println!("{} ({} files written)", report.summary(), written.len());

    if report.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}
