//! Configuration schema types for `forge.toml`
//!
//! ```toml
//! [library]
//! path = "assets/dragons"     # omit to use the built-in dragons
//!
//! [output]
//! dir = "build"
//! metadata = true
//! name_prefix = "Forge"
//!
//! [batch]
//! count = 300
//! start_seed = 0
//! jobs = 0                    # 0 = one worker per core
//!
//! [audit]
//! required_traits = ["dragonType", "weapon"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Asset library selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibraryConfig {
    /// Library directory holding `assets.toml`; `None` selects the built-in library
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Where and how sheets are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_out")]
    pub dir: PathBuf,
    /// Write a metadata JSON next to each sheet
    #[serde(default = "default_true")]
    pub metadata: bool,
    /// Item name prefix in metadata (`<prefix> #<seed>`)
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: default_out(), metadata: true, name_prefix: default_name_prefix() }
    }
}

fn default_out() -> PathBuf {
    PathBuf::from("build")
}

fn default_true() -> bool {
    true
}

fn default_name_prefix() -> String {
    "Forge".to_string()
}

/// Collection generation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    #[serde(default = "default_count")]
    pub count: u64,
    #[serde(default)]
    pub start_seed: u64,
    /// Worker threads; 0 uses every core
    #[serde(default)]
    pub jobs: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { count: default_count(), start_seed: 0, jobs: 0 }
    }
}

fn default_count() -> u64 {
    300
}

/// Metadata audit settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    #[serde(default = "default_required_traits")]
    pub required_traits: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { required_traits: default_required_traits() }
    }
}

fn default_required_traits() -> Vec<String> {
    vec!["dragonType".to_string(), "weapon".to_string()]
}

/// Complete forge.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForgeConfig {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "batch.count")
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "forge.toml: '{}' {}", self.field, self.message)
    }
}

impl ForgeConfig {
    /// Every problem with the configuration
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let mut error = |field: &str, message: &str| {
            errors.push(ConfigValidationError {
                field: field.to_string(),
                message: message.to_string(),
            })
        };

        if self.library.path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            error("library.path", "must not be empty; omit it to use the built-in library");
        }
        if self.output.dir.as_os_str().is_empty() {
            error("output.dir", "must not be empty");
        }
        if self.output.name_prefix.trim().is_empty() {
            error("output.name_prefix", "must be a non-empty string");
        }
        if self.batch.count == 0 {
            error("batch.count", "must be a positive integer");
        }
        if self.batch.start_seed.checked_add(self.batch.count).is_none() {
            error("batch.start_seed", "start_seed + count overflows the seed range");
        }
        for (i, name) in self.audit.required_traits.iter().enumerate() {
            if name.trim().is_empty() {
                error(&format!("audit.required_traits[{}]", i), "must be a non-empty string");
            }
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Seeds of the configured batch, in order
    pub fn batch_seeds(&self) -> std::ops::Range<u64> {
        let start = self.batch.start_seed;
        start..start.saturating_add(self.batch.count)
    }
}
