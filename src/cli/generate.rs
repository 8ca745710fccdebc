//! Generate command implementation

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::api::{self, GenerateRequest};
use crate::batch::output_path;
use crate::config::CliOverrides;
use crate::encoder;
use crate::generator::generate;
use crate::metadata::ItemMetadata;
use crate::resolver::GenerationOptions;
use crate::rng::Seed;

use super::{generate_exit_code, load_index, load_settings, EXIT_ERROR, EXIT_SUCCESS};

/// Execute the generate command
pub fn run_generate(
    config: Option<&Path>,
    seed: &str,
    traits: Vec<(String, String)>,
    output: Option<&Path>,
    library: Option<PathBuf>,
    json: bool,
    metadata: bool,
) -> ExitCode {
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

    let seed = Seed::parse(seed);
    let options: GenerationOptions = traits.into_iter().collect();

    if json {
        let response = api::handle(&index, &GenerateRequest { seed, options });
        return match serde_json::to_string_pretty(&response) {
            Ok(body) => {
                println!("{}", body);
                ExitCode::from(if response.success { EXIT_SUCCESS } else { EXIT_ERROR })
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    let generation = match generate(&index, &seed, &options) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Error: {} (failed while {})", e, e.stage());
            return generate_exit_code(&e);
        }
    };

    for line in generation.logs.lines() {
        println!("{}", line);
    }

    let sheet_path = match output {
        Some(path) => path.to_path_buf(),
        None => output_path(&settings.output.dir, &seed, generation.format.extension()),
    };
    if let Err(e) = encoder::save(&generation.buffer, &sheet_path) {
        eprintln!("Error: Failed to write '{}': {}", sheet_path.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }
    println!("Saved: {}", sheet_path.display());

    if metadata || (settings.output.metadata && output.is_none()) {
        let image_name = sheet_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let meta = ItemMetadata::from_generation(&generation, &settings.output.name_prefix, &image_name);
        let json_path = sheet_path.with_extension("json");
        let written = serde_json::to_vec_pretty(&meta)
            .map_err(std::io::Error::from)
            .map_err(encoder::EncodeError::from)
            .and_then(|bytes| encoder::save(&bytes, &json_path));
        if let Err(e) = written {
            eprintln!("Error: Failed to write '{}': {}", json_path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
        println!("Saved: {}", json_path.display());
    }

    ExitCode::from(EXIT_SUCCESS)
}
