//! Spriteforge - deterministic layered sprite sheet generator
//!
//! This library provides functionality to:
//! - Load an asset library of trait categories and layer images
//! - Resolve a seed plus explicit options into a complete trait set
//! - Composite the trait layers onto a fixed sprite sheet grid
//! - Encode the sheet losslessly and return it with a decision log
//!
//! ```
//! use spriteforge::{catalog::builtin, generate, GenerationOptions, Seed};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let index = builtin::dragon_index()?;
//! let options = GenerationOptions::new().with("dragonType", "fire");
//! let sheet = generate(&index, &Seed::Number(1234), &options)?;
//! assert_eq!((sheet.width, sheet.height), (512, 640));
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod batch;
pub mod catalog;
pub mod cli;
pub mod compositor;
pub mod config;
pub mod encoder;
pub mod generator;
pub mod inspect;
pub mod metadata;
pub mod resolver;
pub mod rng;
pub mod shapes;
pub mod spritesheet;

pub use catalog::{AssetIndex, CatalogError, LayerAsset, TraitCategory, TraitValue};
pub use generator::{generate, GenerateError, Generation, Generator, Stage};
pub use resolver::{GenerationLog, GenerationOptions, ResolvedTraitSet};
pub use rng::Seed;
