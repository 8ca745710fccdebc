//! Configuration loading and discovery for `forge.toml`

use super::schema::ForgeConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Project configuration file name
pub const CONFIG_FILE: &str = "forge.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse {}: {0}", CONFIG_FILE)]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override asset library directory
    pub library: Option<PathBuf>,
    /// Override output directory
    pub out: Option<PathBuf>,
    /// Override metadata output
    pub metadata: Option<bool>,
    /// Override batch size
    pub count: Option<u64>,
    /// Override first batch seed
    pub start_seed: Option<u64>,
    /// Number of parallel jobs
    pub jobs: Option<usize>,
}

/// Find forge.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for forge.toml
/// 2. Check XDG_CONFIG_HOME/spriteforge/forge.toml (or ~/.config/spriteforge/forge.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find forge.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("spriteforge").join(CONFIG_FILE);
    config_path.exists().then_some(config_path)
}

/// Find forge.toml by walking up from `start`.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from `path`, or from the discovered forge.toml.
///
/// Relative paths inside the file are resolved against the file's directory.
/// With no file anywhere, returns [`default_config`].
///
/// # Example
/// ```ignore
/// let config = load_config(None)?;
/// let config = load_config(Some(Path::new("collection/forge.toml")))?;
/// ```
pub fn load_config(path: Option<&Path>) -> Result<ForgeConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(default_config()),
    }
}

fn load_config_file(path: &Path) -> Result<ForgeConfig, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let contents = fs::read_to_string(path)?;
    let mut config: ForgeConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    if let Some(root) = path.parent() {
        config.output.dir = resolve_path(root, &config.output.dir);
        config.library.path = config.library.path.map(|p| resolve_path(root, &p));
    }
    Ok(config)
}

/// Configuration used when no forge.toml exists.
pub fn default_config() -> ForgeConfig {
    ForgeConfig::default()
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut ForgeConfig, overrides: &CliOverrides) {
    if let Some(ref library) = overrides.library {
        config.library.path = Some(library.clone());
    }
    if let Some(ref out) = overrides.out {
        config.output.dir = out.clone();
    }
    if let Some(metadata) = overrides.metadata {
        config.output.metadata = metadata;
    }
    if let Some(count) = overrides.count {
        config.batch.count = count;
    }
    if let Some(start_seed) = overrides.start_seed {
        config.batch.start_seed = start_seed;
    }
    if let Some(jobs) = overrides.jobs {
        config.batch.jobs = jobs;
    }
}

/// Resolve a path relative to the project root.
///
/// If the path is absolute, returns it unchanged.
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}
