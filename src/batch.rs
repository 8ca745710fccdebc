//! Parallel collection generation.
//!
//! Each seed is an independent generation on a rayon pool. Results come back
//! in seed order whatever order the workers finish in. Identical output bytes
//! for different seeds are reported as duplicates; they are not errors.
//!
//! # Example
//!
//! ```ignore
//! let seeds: Vec<Seed> = (0..300).map(Seed::Number).collect();
//! let report = generate_batch(&index, &seeds, &GenerationOptions::new(), 0)?;
//! println!("{} ok, {} failed", report.success_count(), report.failure_count());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::AssetIndex;
use crate::encoder::{self, EncodeError};
use crate::generator::{GenerateError, Generation, Generator};
use crate::metadata::ItemMetadata;
use crate::resolver::GenerationOptions;
use crate::rng::Seed;

/// Could not run the batch at all.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Outcome of a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Success,
    /// Failed with the error's short code and message
    Failed { kind: &'static str, message: String },
}

impl ItemStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemStatus::Success)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Success => write!(f, "success"),
            ItemStatus::Failed { kind, message } => write!(f, "failed ({}): {}", kind, message),
        }
    }
}

/// One seed's result.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub seed: Seed,
    pub status: ItemStatus,
    pub generation: Option<Generation>,
    /// Hex SHA-256 of the sheet bytes
    pub digest: Option<String>,
    pub duration: Duration,
}

impl BatchItem {
    fn from_result(seed: &Seed, result: Result<Generation, GenerateError>, duration: Duration) -> Self {
        match result {
            Ok(generation) => BatchItem {
                seed: seed.clone(),
                status: ItemStatus::Success,
                digest: Some(hex_digest(&generation.buffer)),
                generation: Some(generation),
                duration,
            },
            Err(e) => BatchItem {
                seed: seed.clone(),
                status: ItemStatus::Failed { kind: e.kind(), message: e.to_string() },
                generation: None,
                digest: None,
                duration,
            },
        }
    }
}

/// Seeds whose sheets are byte-identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub digest: String,
    pub seeds: Vec<Seed>,
}

/// Whole-batch outcome, items in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    pub duplicates: Vec<DuplicateGroup>,
    pub total_duration: Duration,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.items.iter().filter(|i| i.status.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.items.len() - self.success_count()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchItem> {
        self.items.iter().filter(|i| !i.status.is_success())
    }

    pub fn summary(&self) -> String {
        format!(
            "{} generated, {} failed, {} duplicate groups in {:.2}s",
            self.success_count(),
            self.failure_count(),
            self.duplicates.len(),
            self.total_duration.as_secs_f64()
        )
    }
}

fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes).iter().map(|b| format!("{:02x}", b)).collect()
}

/// Group successful items by digest; only groups of two or more are returned.
fn find_duplicates(items: &[BatchItem]) -> Vec<DuplicateGroup> {
    let mut by_digest: HashMap<&str, Vec<Seed>> = HashMap::new();
    let mut order = Vec::new();
    for item in items {
        if let Some(digest) = &item.digest {
            let seeds = by_digest.entry(digest.as_str()).or_default();
            if seeds.is_empty() {
                order.push(digest.as_str());
            }
            seeds.push(item.seed.clone());
        }
    }
    order
        .into_iter()
        .filter_map(|digest| {
            let seeds = by_digest.remove(digest)?;
            (seeds.len() > 1).then(|| DuplicateGroup { digest: digest.to_string(), seeds })
        })
        .collect()
}

/// Generate one sheet per seed, `jobs` at a time (0 = one per core).
pub fn generate_batch(
    index: &AssetIndex,
    seeds: &[Seed],
    options: &GenerationOptions,
    jobs: usize,
) -> Result<BatchReport, BatchError> {
    let start = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    let generator = Generator::new(index);

    let items: Vec<BatchItem> = pool.install(|| {
        seeds
            .par_iter()
            .map(|seed| {
                let item_start = Instant::now();
                let result = generator.generate(seed, options);
                BatchItem::from_result(seed, result, item_start.elapsed())
            })
            .collect()
    });

    let duplicates = find_duplicates(&items);
    for group in &duplicates {
        let seeds: Vec<String> = group.seeds.iter().map(Seed::to_string).collect();
        warn!(digest = %group.digest, seeds = %seeds.join(", "), "identical sheets generated");
    }

    let report = BatchReport { items, duplicates, total_duration: start.elapsed() };
    info!(
        items = report.items.len(),
        succeeded = report.success_count(),
        failed = report.failure_count(),
        "batch finished"
    );
    Ok(report)
}

/// `sheet_<seed>.<ext>` inside `dir`.
pub fn output_path(dir: &Path, seed: &Seed, extension: &str) -> PathBuf {
    dir.join(format!("sheet_{}.{}", seed.slug(), extension))
}

/// Write every successful sheet (and optionally its metadata) into `dir`.
///
/// Returns the paths written, sheets and metadata interleaved per item.
pub fn write_outputs(
    report: &BatchReport,
    dir: &Path,
    metadata: bool,
    name_prefix: &str,
) -> Result<Vec<PathBuf>, EncodeError> {
    let mut written = Vec::new();
    for item in &report.items {
        let Some(generation) = &item.generation else {
            continue;
        };
        let sheet_path = output_path(dir, &item.seed, generation.format.extension());
        encoder::save(&generation.buffer, &sheet_path)?;
        written.push(sheet_path.clone());

        if metadata {
            let image_name = sheet_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let meta = ItemMetadata::from_generation(generation, name_prefix, &image_name);
            let json_path = output_path(dir, &item.seed, "json");
            let json = serde_json::to_vec_pretty(&meta).map_err(std::io::Error::from)?;
            encoder::save(&json, &json_path)?;
            written.push(json_path);
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{LayerAsset, TraitCategory, TraitValue};
    use crate::spritesheet::SheetGeometry;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    /// Two body colors, so 20 seeds must collide.
    fn two_value_index() -> AssetIndex {
        let g = SheetGeometry::new(2, 2, 1, 1);
        let body = TraitCategory::new("body", 0)
            .with_value(TraitValue::new("red", 1))
            .with_value(TraitValue::new("blue", 1));
        AssetIndex::builder("pair", g.clone())
            .asset(
                LayerAsset::new(&body, "red", &g)
                    .with_image(RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255])), "red.png"),
            )
            .asset(
                LayerAsset::new(&body, "blue", &g)
                    .with_image(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 255])), "blue.png"),
            )
            .category(body)
            .build()
            .unwrap()
    }

    fn seeds(n: u64) -> Vec<Seed> {
        (0..n).map(Seed::Number).collect()
    }

    #[test]
    fn test_results_in_seed_order() {
        let index = two_value_index();
        let report = generate_batch(&index, &seeds(20), &GenerationOptions::new(), 4).unwrap();
        let order: Vec<_> = report.items.iter().map(|i| i.seed.clone()).collect();
        assert_eq!(order, seeds(20));
        assert!(report.is_success());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let index = two_value_index();
        let parallel = generate_batch(&index, &seeds(12), &GenerationOptions::new(), 4).unwrap();
        let serial = generate_batch(&index, &seeds(12), &GenerationOptions::new(), 1).unwrap();
        for (a, b) in parallel.items.iter().zip(&serial.items) {
            assert_eq!(a.digest, b.digest);
        }
    }

    #[test]
    fn test_duplicates_reported_not_failed() {
        let index = two_value_index();
        let report = generate_batch(&index, &seeds(20), &GenerationOptions::new(), 0).unwrap();
        assert_eq!(report.failure_count(), 0);
        assert!(!report.duplicates.is_empty());
        let grouped: usize = report.duplicates.iter().map(|g| g.seeds.len()).sum();
        assert_eq!(grouped, 20);
        assert!(report.summary().contains("20 generated"));
    }

    #[test]
    fn test_failures_kept_per_item() {
        let index = two_value_index();
        let options = GenerationOptions::new().with("body", "green");
        let report = generate_batch(&index, &seeds(3), &options, 2).unwrap();
        assert_eq!(report.failure_count(), 3);
        for item in report.failures() {
            assert!(matches!(item.status, ItemStatus::Failed { kind: "asset_not_found", .. }));
        }
        assert!(report.duplicates.is_empty());
    }

    #[test]
    fn test_write_outputs() {
        let index = two_value_index();
        let report =
            generate_batch(&index, &[Seed::Number(7), Seed::from("a b")], &GenerationOptions::new(), 1)
                .unwrap();
        let dir = TempDir::new().unwrap();
        let written = write_outputs(&report, dir.path(), true, "Pair").unwrap();
        assert_eq!(written.len(), 4);
        assert!(dir.path().join("sheet_7.png").is_file());
        assert!(dir.path().join("sheet_7.json").is_file());
        assert!(dir.path().join("sheet_a_b.png").is_file());
    }
}
