//! Item metadata documents and trait audits over generated output.

use std::fs;
use std::path::{Path, PathBuf};

use glob::glob;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::generator::Generation;

/// One `{trait_type, value}` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
}

/// JSON document written next to each generated sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub name: String,
    pub seed: String,
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl ItemMetadata {
    pub fn from_generation(generation: &Generation, name_prefix: &str, image: &str) -> Self {
        let attributes: Vec<Attribute> = generation
            .traits
            .iter()
            .map(|t| Attribute { trait_type: t.category.clone(), value: t.value.clone() })
            .collect();
        let summary = attributes
            .iter()
            .map(|a| format!("{} {}", a.trait_type, a.value))
            .collect::<Vec<_>>()
            .join(", ");
        let seed = generation.seed.slug();
        Self {
            name: format!("{} #{}", name_prefix, seed),
            description: format!(
                "{}x{} sprite sheet from seed {}: {}",
                generation.width, generation.height, generation.seed, summary
            ),
            seed,
            image: image.to_string(),
            attributes,
        }
    }

    pub fn attribute(&self, trait_type: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.trait_type == trait_type)
            .map(|a| a.value.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Invalid audit path '{0}': {1}")]
    Pattern(String, #[source] glob::PatternError),
}

/// A metadata file missing required traits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditFinding {
    pub path: PathBuf,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    pub scanned: usize,
    pub findings: Vec<AuditFinding>,
    /// Files that could not be read or parsed, with the reason
    pub unreadable: Vec<(PathBuf, String)>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && self.unreadable.is_empty()
    }
}

/// Check every `*.json` in `dir` for the `required` trait types.
pub fn audit_dir(dir: &Path, required: &[String]) -> Result<AuditReport, AuditError> {
    let pattern = format!("{}/*.json", dir.display());
    let paths = glob(&pattern).map_err(|e| AuditError::Pattern(pattern.clone(), e))?;

    let mut report = AuditReport::default();
    let mut files: Vec<PathBuf> = paths.filter_map(Result::ok).collect();
    files.sort();

    for path in files {
        report.scanned += 1;
        let meta = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<ItemMetadata>(&text).map_err(|e| e.to_string()));
        let meta = match meta {
            Ok(meta) => meta,
            Err(reason) => {
                report.unreadable.push((path, reason));
                continue;
            }
        };

        let missing: Vec<String> = required
            .iter()
            .filter(|r| meta.attribute(r).is_none())
            .cloned()
            .collect();
        debug!(path = %path.display(), missing = missing.len(), "audited");
        if !missing.is_empty() {
            report.findings.push(AuditFinding { path, missing });
        }
    }

    Ok(report)
}
