//! Schema types for an asset library's `assets.toml` manifest.
//!
//! ```toml
//! name = "dragons"
//!
//! [sheet]
//! frame_width = 64
//! frame_height = 64
//! frames = 8
//! rows = 10
//!
//! [[category]]
//! name = "weapon"
//! z = 30
//!
//! [[category.value]]
//! name = "none"          # no file: blank layer
//!
//! [[category.value]]
//! name = "sword"
//! weight = 2
//! file = "weapon/sword.png"
//! rows = [5, 9]          # source rows land on sheet rows 5 and 9
//! offset = [0, -2]
//!
//! [[category.value.part]]
//! name = "behind"        # second layer of the same value
//! file = "weapon/sword_behind.png"
//! z = -5                 # drawn under the body
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::compositor::BlendMode;
use crate::spritesheet::SheetGeometry;

/// Root of `assets.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibraryManifest {
    /// Library name; defaults to the directory name
    #[serde(default)]
    pub name: Option<String>,
    /// Sheet geometry shared by every generated item
    pub sheet: SheetGeometry,
    /// Trait categories in resolution order
    #[serde(rename = "category", default)]
    pub categories: Vec<CategoryDef>,
    /// Props baked onto fixed frames
    #[serde(rename = "overlay", default)]
    pub overlays: Vec<OverlayDef>,
}

/// A `[[category]]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryDef {
    pub name: String,
    /// Draw order (lower first)
    #[serde(default)]
    pub z: i32,
    #[serde(default)]
    pub blend: BlendMode,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(rename = "value", default)]
    pub values: Vec<ValueDef>,
}

fn default_opacity() -> f32 {
    1.0
}

fn default_weight() -> u32 {
    1
}

/// A `[[category.value]]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueDef {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Layer image relative to the library root; omitted for a blank layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Declared tile size; defaults to the sheet tile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<[u32; 2]>,
    /// Sheet row for each source row; defaults to all rows in order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<u32>>,
    #[serde(default)]
    pub offset: [i32; 2],
    /// Overrides the category z
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend: Option<BlendMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    /// Allowed values of earlier categories
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub requires: BTreeMap<String, Vec<String>>,
    /// Extra layers drawn for this value at their own z
    #[serde(rename = "part", default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<PartDef>,
}

/// A `[[category.value.part]]` table.
///
/// Placement fields left out are taken from the owning value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartDef {
    pub name: String,
    pub file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<[i32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend: Option<BlendMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
}

/// An `[[overlay]]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverlayDef {
    pub name: String,
    pub file: PathBuf,
    /// Sheet row index, or a row name from `sheet.row_names`
    pub row: RowRef,
    /// Inclusive frame range
    pub frames: [u32; 2],
    /// `[frame, dy]` pairs
    #[serde(default)]
    pub lift: Vec<[i32; 2]>,
    #[serde(default)]
    pub offset: [i32; 2],
}

/// Row given either by index or by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowRef {
    Index(u32),
    Name(String),
}

impl RowRef {
    pub fn resolve(&self, sheet: &SheetGeometry) -> Option<u32> {
        match self {
            RowRef::Index(i) => Some(*i),
            RowRef::Name(name) => sheet.row_index(name),
        }
    }
}
