//! Trait resolution: turning (seed, options) into a complete trait set.
//!
//! Categories are visited in the index's declared order. An explicit option is
//! validated and taken as is without touching the random stream; anything
//! else is drawn from the category's weight table, restricted to values whose
//! `requires` constraints hold for the traits resolved so far.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::catalog::{AssetIndex, TraitValue};
use crate::rng::{Seed, SeededRng};

/// Explicit category -> value choices supplied by the caller.
///
/// Serializes as a flat JSON/TOML table, so `{"dragonType": "fire"}` is a
/// valid options document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationOptions(BTreeMap<String, String>);

impl GenerationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, category: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(category, value);
        self
    }

    pub fn insert(&mut self, category: impl Into<String>, value: impl Into<String>) {
        self.0.insert(category.into(), value.into());
    }

    pub fn get(&self, category: &str) -> Option<&str> {
        self.0.get(category).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for GenerationOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Append-only, ordered record of the decisions made during one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationLog(Vec<String>);

impl GenerationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.0.push(line.into());
    }

    pub fn extend(&mut self, other: GenerationLog) {
        self.0.extend(other.0);
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }

    pub fn into_lines(self) -> Vec<String> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// How a trait got its value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "lowercase")]
pub enum TraitOrigin {
    Explicit,
    Random {
        /// Raw value in `[0, 1)` that decided the pick
        draw: f64,
        /// Number of eligible values at the time of the draw
        candidates: usize,
    },
}

impl TraitOrigin {
    pub fn is_random(&self) -> bool {
        matches!(self, TraitOrigin::Random { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTrait {
    pub category: String,
    pub value: String,
    #[serde(flatten)]
    pub origin: TraitOrigin,
}

impl fmt::Display for ResolvedTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            TraitOrigin::Explicit => write!(f, "{}: {} (explicit)", self.category, self.value),
            TraitOrigin::Random { draw, candidates } => write!(
                f,
                "{}: {} (random, draw={:.4}, {} candidates)",
                self.category, self.value, draw, candidates
            ),
        }
    }
}

/// The full category -> value mapping for one item, in resolution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedTraitSet(Vec<ResolvedTrait>);

impl ResolvedTraitSet {
    pub fn get(&self, category: &str) -> Option<&str> {
        self.0.iter().find(|t| t.category == category).map(|t| t.value.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedTrait> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Same traits as explicit options; resolving them again draws nothing.
    pub fn as_options(&self) -> GenerationOptions {
        self.0.iter().map(|t| (t.category.as_str(), t.value.as_str())).collect()
    }
}

impl<'a> IntoIterator for &'a ResolvedTraitSet {
    type Item = &'a ResolvedTrait;
    type IntoIter = std::slice::Iter<'a, ResolvedTrait>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Resolution failure for a single call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Unknown trait category '{category}' (known: {})", known.join(", "))]
    UnknownCategory { category: String, known: Vec<String> },

    #[error("No asset registered for {category} = '{value}'")]
    AssetNotFound { category: String, value: String },

    #[error("No eligible values for trait category '{category}'")]
    NoEligibleTraits { category: String },

    #[error("{category} = '{value}' requires {required} to be one of [{}], but it resolved to '{found}'", allowed.join(", "))]
    IncompatibleTraits {
        category: String,
        value: String,
        required: String,
        allowed: Vec<String>,
        found: String,
    },
}

/// Outcome of [`resolve`]: the traits plus what it cost.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub traits: ResolvedTraitSet,
    pub log: GenerationLog,
    /// Random values consumed; zero when every category was explicit
    pub draws: usize,
}

/// Resolve every category of `index` for `seed`.
pub fn resolve(
    index: &AssetIndex,
    seed: &Seed,
    options: &GenerationOptions,
) -> Result<Resolution, ResolveError> {
    let mut rng = SeededRng::new(seed);
    let mut log = GenerationLog::new();
    let traits = resolve_with(index, &mut rng, options, &mut log)?;
    Ok(Resolution { traits, log, draws: rng.draws() })
}

/// Resolve using a caller-owned stream, appending one log line per category.
pub fn resolve_with(
    index: &AssetIndex,
    rng: &mut SeededRng,
    options: &GenerationOptions,
    log: &mut GenerationLog,
) -> Result<ResolvedTraitSet, ResolveError> {
    for (category, _) in options.iter() {
        if index.category(category).is_none() {
            return Err(ResolveError::UnknownCategory {
                category: category.to_string(),
                known: index.categories().iter().map(|c| c.name.clone()).collect(),
            });
        }
    }

    let mut resolved = ResolvedTraitSet::default();
    for category in index.categories() {
        let chosen = match options.get(&category.name) {
            Some(explicit) => {
                let value = category
                    .value(explicit)
                    .filter(|_| index.lookup(&category.name, explicit).is_ok())
                    .ok_or_else(|| ResolveError::AssetNotFound {
                        category: category.name.clone(),
                        value: explicit.to_string(),
                    })?;
                if let Some((required, allowed, found)) = unmet_requirement(value, &resolved) {
                    return Err(ResolveError::IncompatibleTraits {
                        category: category.name.clone(),
                        value: value.name.clone(),
                        required,
                        allowed,
                        found,
                    });
                }
                ResolvedTrait {
                    category: category.name.clone(),
                    value: value.name.clone(),
                    origin: TraitOrigin::Explicit,
                }
            }
            None => {
                let eligible: Vec<&TraitValue> = category
                    .values
                    .iter()
                    .filter(|v| v.weight > 0 && unmet_requirement(v, &resolved).is_none())
                    .collect();
                if eligible.is_empty() {
                    return Err(ResolveError::NoEligibleTraits { category: category.name.clone() });
                }
                let weights: Vec<u32> = eligible.iter().map(|v| v.weight).collect();
                let pick = rng.pick_weighted(&eligible, &weights);
                ResolvedTrait {
                    category: category.name.clone(),
                    value: pick.item.name.clone(),
                    origin: TraitOrigin::Random { draw: pick.draw, candidates: eligible.len() },
                }
            }
        };

        debug!(category = %chosen.category, value = %chosen.value, random = chosen.origin.is_random(), "trait resolved");
        log.push(chosen.to_string());
        resolved.0.push(chosen);
    }

    Ok(resolved)
}

/// First `requires` entry of `value` not met by `resolved`, as
/// (category, allowed, found).
fn unmet_requirement(
    value: &TraitValue,
    resolved: &ResolvedTraitSet,
) -> Option<(String, Vec<String>, String)> {
    value.requires.iter().find_map(|(required, allowed)| {
        let found = resolved.get(required).unwrap_or_default();
        if allowed.iter().any(|a| a == found) {
            None
        } else {
            Some((required.clone(), allowed.clone(), found.to_string()))
        }
    })
}
