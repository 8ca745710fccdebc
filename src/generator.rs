//! One generation call: resolve, composite, encode.
//!
//! A call walks `Idle -> Resolving -> Compositing -> Encoding -> Done`. The
//! first failure ends it in `Failed` with no partial output. The only shared
//! input is the read-only [`AssetIndex`]; the random stream, canvas and log
//! are all created inside the call.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::AssetIndex;
use crate::compositor::{self, CompositeError};
use crate::encoder::{self, EncodeError, SheetFormat};
use crate::resolver::{self, GenerationLog, GenerationOptions, ResolveError, ResolvedTraitSet};
use crate::rng::{Seed, SeededRng};

/// Lifecycle position of a generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Idle,
    Resolving,
    Compositing,
    Encoding,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Resolving => "resolving",
            Stage::Compositing => "compositing",
            Stage::Encoding => "encoding",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Failure of a generation call, tagged by the stage that raised it.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Composite(#[from] CompositeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl GenerateError {
    /// Stage that was running when the call failed.
    pub fn stage(&self) -> Stage {
        match self {
            GenerateError::Resolve(_) => Stage::Resolving,
            GenerateError::Composite(_) => Stage::Compositing,
            GenerateError::Encode(_) => Stage::Encoding,
        }
    }

    /// Stable short code for callers that branch on the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerateError::Resolve(ResolveError::UnknownCategory { .. }) => "unknown_category",
            GenerateError::Resolve(ResolveError::AssetNotFound { .. }) => "asset_not_found",
            GenerateError::Resolve(ResolveError::NoEligibleTraits { .. }) => "no_eligible_traits",
            GenerateError::Resolve(ResolveError::IncompatibleTraits { .. }) => "incompatible_traits",
            GenerateError::Composite(CompositeError::GeometryMismatch { .. }) => "geometry_mismatch",
            GenerateError::Composite(CompositeError::AssetNotFound(_)) => "asset_not_found",
            GenerateError::Encode(_) => "encoding_failure",
        }
    }
}

/// A finished sprite sheet.
#[derive(Debug, Clone)]
pub struct Generation {
    pub seed: Seed,
    pub buffer: Vec<u8>,
    pub format: SheetFormat,
    pub width: u32,
    pub height: u32,
    pub traits: ResolvedTraitSet,
    pub logs: GenerationLog,
}

impl Generation {
    /// `data:image/png;base64,...` form of the buffer.
    pub fn data_uri(&self) -> String {
        encoder::data_uri(self.format, &self.buffer)
    }
}

/// Generates sheets from one asset index.
#[derive(Debug, Clone, Copy)]
pub struct Generator<'a> {
    index: &'a AssetIndex,
}

impl<'a> Generator<'a> {
    pub fn new(index: &'a AssetIndex) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &'a AssetIndex {
        self.index
    }

    /// Produce the sheet for `seed` with `options` pinned.
    pub fn generate(&self, seed: &Seed, options: &GenerationOptions) -> Result<Generation, GenerateError> {
        debug!(seed = %seed, "{}", Stage::Idle);
        let result = self.run(seed, options);
        match &result {
            Ok(generation) => info!(
                seed = %seed,
                bytes = generation.buffer.len(),
                "generation {}",
                Stage::Done
            ),
            Err(e) => debug!(seed = %seed, stage = %e.stage(), kind = e.kind(), "generation {}", Stage::Failed),
        }
        result
    }

    fn run(&self, seed: &Seed, options: &GenerationOptions) -> Result<Generation, GenerateError> {
        let mut log = GenerationLog::new();
        log.push(format!("seed: {}", seed));

        debug!(seed = %seed, "{}", Stage::Resolving);
        let mut rng = SeededRng::new(seed);
        let traits = resolver::resolve_with(self.index, &mut rng, options, &mut log)?;

        debug!(seed = %seed, draws = rng.draws(), "{}", Stage::Compositing);
        let canvas = compositor::composite(self.index, &traits, &mut log)?;

        debug!(seed = %seed, "{}", Stage::Encoding);
        let sheet = encoder::encode(&canvas, &mut log)?;

        Ok(Generation {
            seed: seed.clone(),
            buffer: sheet.bytes,
            format: sheet.format,
            width: sheet.width,
            height: sheet.height,
            traits,
            logs: log,
        })
    }
}

/// Generate one sheet from `index`.
///
/// # Example
/// ```ignore
/// let index = spriteforge::catalog::builtin::dragon_index()?;
/// let options = GenerationOptions::new().with("dragonType", "fire");
/// let sheet = generate(&index, &Seed::Number(1234), &options)?;
/// assert_eq!((sheet.width, sheet.height), (512, 640));
/// ```
pub fn generate(
    index: &AssetIndex,
    seed: &Seed,
    options: &GenerationOptions,
) -> Result<Generation, GenerateError> {
    Generator::new(index).generate(seed, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{LayerAsset, TraitCategory, TraitValue};
    use crate::spritesheet::SheetGeometry;
    use image::{Rgba, RgbaImage};

    fn tiny_index(badge_frame: (u32, u32)) -> AssetIndex {
        let g = SheetGeometry::new(2, 2, 2, 2);
        let body = TraitCategory::new("body", 0)
            .with_value(TraitValue::new("red", 1))
            .with_value(TraitValue::new("green", 1));
        let badge = TraitCategory::new("badge", 1).with_value(TraitValue::new("star", 1));
        let full = || RgbaImage::from_pixel(4, 4, Rgba([200, 0, 0, 255]));
        AssetIndex::builder("tiny", g.clone())
            .asset(LayerAsset::new(&body, "red", &g).with_image(full(), "red.png"))
            .asset(LayerAsset::new(&body, "green", &g).with_image(full(), "green.png"))
            .asset(
                LayerAsset::new(&badge, "star", &g)
                    .with_image(full(), "star.png")
                    .with_frame(badge_frame.0, badge_frame.1),
            )
            .category(body)
            .category(badge)
            .build()
            .unwrap()
    }

    #[test]
    fn test_generation_log_order() {
        let index = tiny_index((2, 2));
        let sheet = generate(&index, &Seed::Number(5), &GenerationOptions::new()).unwrap();
        let lines = sheet.logs.lines();
        assert_eq!(lines[0], "seed: 5");
        assert!(lines[1].starts_with("body: "));
        assert!(lines[2].starts_with("badge: star (random"));
        assert!(lines[3].starts_with("layer body/"));
        assert!(lines[5].starts_with("sheet: 4x4 px"));
        assert!(lines[6].starts_with("encoded: "));
        assert_eq!((sheet.width, sheet.height), (4, 4));
    }

    #[test]
    fn test_failures_carry_stage_and_kind() {
        let index = tiny_index((2, 2));
        let options = GenerationOptions::new().with("body", "blue");
        let err = generate(&index, &Seed::Number(5), &options).unwrap_err();
        assert_eq!(err.stage(), Stage::Resolving);
        assert_eq!(err.kind(), "asset_not_found");

        let index = tiny_index((4, 4));
        let err = generate(&index, &Seed::Number(5), &GenerationOptions::new()).unwrap_err();
        assert_eq!(err.stage(), Stage::Compositing);
        assert_eq!(err.kind(), "geometry_mismatch");
    }

    #[test]
    fn test_generator_is_reusable() {
        let index = tiny_index((2, 2));
        let generator = Generator::new(&index);
        let a = generator.generate(&Seed::from("ember"), &GenerationOptions::new()).unwrap();
        let b = generator.generate(&Seed::from("ember"), &GenerationOptions::new()).unwrap();
        assert_eq!(a.buffer, b.buffer);
        assert_eq!(a.logs, b.logs);
        assert!(a.data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Compositing.to_string(), "compositing");
        assert_eq!(serde_json::to_string(&Stage::Failed).unwrap(), "\"failed\"");
    }
}
