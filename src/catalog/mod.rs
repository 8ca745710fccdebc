//! Asset index: the read-only catalog of trait categories and layer assets.
//!
//! An [`AssetIndex`] is built once (from an on-disk library via
//! [`loader::load_library`], or in code via [`builtin::dragon_index`]) and then
//! shared immutably by every generation. Validation happens when the index is
//! built: every declared trait value must have a backing asset, and every
//! problem found is reported together.

pub mod builtin;
pub mod loader;
pub mod schema;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use image::RgbaImage;
use thiserror::Error;

use crate::compositor::BlendMode;
use crate::spritesheet::SheetGeometry;

pub use loader::{load_library, MANIFEST_FILE};

/// Error raised while building or loading an index.
///
/// Any of these means the library must not be used to serve generations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    /// File I/O error
    #[error("Failed to read asset library: {0}")]
    Io(#[from] std::io::Error),
    /// Manifest TOML parsing error
    #[error("Failed to parse {}: {0}", MANIFEST_FILE)]
    Manifest(#[from] toml::de::Error),
    /// A layer image could not be decoded
    #[error("Failed to decode layer image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// One or more validation problems
    #[error("Asset library validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// Lookup failure for a (category, value) pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("No asset registered for {category} = '{value}'")]
    AssetNotFound { category: String, value: String },
}

/// One possible value of a trait category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitValue {
    pub name: String,
    /// Relative selection weight for random resolution (0 = explicit only)
    pub weight: u32,
    /// Allowed values of earlier categories; empty means unconstrained
    pub requires: BTreeMap<String, Vec<String>>,
}

impl TraitValue {
    pub fn new(name: impl Into<String>, weight: u32) -> Self {
        Self { name: name.into(), weight, requires: BTreeMap::new() }
    }

    /// Only eligible when `category` resolved to one of `allowed`.
    pub fn requires<I, S>(mut self, category: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires.insert(category.into(), allowed.into_iter().map(Into::into).collect());
        self
    }
}

/// A named dimension of visual variation.
#[derive(Debug, Clone, PartialEq)]
pub struct TraitCategory {
    pub name: String,
    /// Default draw order for this category's layers (lower first)
    pub z: i32,
    pub blend: BlendMode,
    pub opacity: f32,
    /// Declared values, in declaration order
    pub values: Vec<TraitValue>,
}

impl TraitCategory {
    pub fn new(name: impl Into<String>, z: i32) -> Self {
        Self { name: name.into(), z, blend: BlendMode::Normal, opacity: 1.0, values: Vec::new() }
    }

    pub fn with_value(mut self, value: TraitValue) -> Self {
        self.values.push(value);
        self
    }

    pub fn with_blend(mut self, blend: BlendMode, opacity: f32) -> Self {
        self.blend = blend;
        self.opacity = opacity;
        self
    }

    pub fn value(&self, name: &str) -> Option<&TraitValue> {
        self.values.iter().find(|v| v.name == name)
    }
}

/// Image plus placement metadata for one (category, value).
///
/// A value may own extra parts (a weapon's blade behind the body and hilt in
/// front of it). Each part is its own `LayerAsset` with `part` set, and is
/// sorted by its own z alongside every other layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerAsset {
    pub category: String,
    pub value: String,
    /// `None` for the value's main layer
    pub part: Option<String>,
    /// Where the pixels came from (file path or `builtin:...`)
    pub source: String,
    /// `None` for a blank layer that draws nothing
    pub image: Option<RgbaImage>,
    /// Declared tile size; must match the sheet geometry
    pub frame: (u32, u32),
    /// Source row `i` is drawn on sheet row `row_map[i]`
    pub row_map: Vec<u32>,
    /// Destination shift inside each tile
    pub offset: (i32, i32),
    pub z: i32,
    pub blend: BlendMode,
    pub opacity: f32,
}

impl LayerAsset {
    /// Asset covering every sheet row in order, placed at the category's z.
    pub fn new(category: &TraitCategory, value: &str, geometry: &SheetGeometry) -> Self {
        Self {
            category: category.name.clone(),
            value: value.to_string(),
            part: None,
            source: format!("blank:{}/{}", category.name, value),
            image: None,
            frame: geometry.tile(),
            row_map: (0..geometry.rows).collect(),
            offset: (0, 0),
            z: category.z,
            blend: category.blend,
            opacity: category.opacity,
        }
    }

    pub fn with_image(mut self, image: RgbaImage, source: impl Into<String>) -> Self {
        self.image = Some(image);
        self.source = source.into();
        self
    }

    pub fn with_rows(mut self, row_map: Vec<u32>) -> Self {
        self.row_map = row_map;
        self
    }

    pub fn with_offset(mut self, x: i32, y: i32) -> Self {
        self.offset = (x, y);
        self
    }

    pub fn with_frame(mut self, width: u32, height: u32) -> Self {
        self.frame = (width, height);
        self
    }

    pub fn with_z(mut self, z: i32) -> Self {
        self.z = z;
        self
    }

    /// Mark this asset as a named extra part of its value.
    pub fn with_part(mut self, part: impl Into<String>) -> Self {
        self.part = Some(part.into());
        if self.image.is_none() {
            self.source = format!("blank:{}", self.label());
        }
        self
    }

    pub fn is_blank(&self) -> bool {
        self.image.is_none()
    }

    /// `category/value`, or `category/value#part` for a part.
    pub fn label(&self) -> String {
        match &self.part {
            Some(part) => format!("{}/{}#{}", self.category, self.value, part),
            None => format!("{}/{}", self.category, self.value),
        }
    }
}

/// A prop drawn on fixed frames of one row after all trait layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub name: String,
    pub source: String,
    /// Single tile image
    pub image: RgbaImage,
    pub row: u32,
    /// Inclusive frame range
    pub frames: (u32, u32),
    /// Extra vertical shift for particular frames
    pub lift: Vec<(u32, i32)>,
    pub offset: (i32, i32),
}

impl Overlay {
    pub fn lift_for(&self, frame: u32) -> i32 {
        self.lift.iter().find(|(f, _)| *f == frame).map(|(_, dy)| *dy).unwrap_or(0)
    }
}

/// Read-only catalog mapping (category, value) to its layer asset.
#[derive(Debug, Clone)]
pub struct AssetIndex {
    name: String,
    geometry: SheetGeometry,
    categories: Vec<TraitCategory>,
    /// Main layer first, then parts in registration order
    assets: HashMap<(String, String), Vec<LayerAsset>>,
    overlays: Vec<Overlay>,
}

impl AssetIndex {
    pub fn builder(name: impl Into<String>, geometry: SheetGeometry) -> AssetIndexBuilder {
        AssetIndexBuilder {
            name: name.into(),
            geometry,
            categories: Vec::new(),
            assets: Vec::new(),
            overlays: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &SheetGeometry {
        &self.geometry
    }

    /// Categories in declared resolution order.
    pub fn categories(&self) -> &[TraitCategory] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&TraitCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Declared values (with weights) of a category, in order.
    pub fn values_for(&self, category: &str) -> Option<&[TraitValue]> {
        self.category(category).map(|c| c.values.as_slice())
    }

    /// The main layer of a (category, value).
    pub fn lookup(&self, category: &str, value: &str) -> Result<&LayerAsset, LookupError> {
        self.layers(category, value)?.first().ok_or_else(|| LookupError::AssetNotFound {
            category: category.to_string(),
            value: value.to_string(),
        })
    }

    /// Every layer of a (category, value): the main layer, then its parts.
    pub fn layers(&self, category: &str, value: &str) -> Result<&[LayerAsset], LookupError> {
        self.assets
            .get(&(category.to_string(), value.to_string()))
            .map(Vec::as_slice)
            .ok_or_else(|| LookupError::AssetNotFound {
                category: category.to_string(),
                value: value.to_string(),
            })
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    /// Total number of registered layer assets, parts included.
    pub fn asset_count(&self) -> usize {
        self.assets.values().map(Vec::len).sum()
    }
}

/// Collects categories, assets and overlays, then validates them as a whole.
#[derive(Debug)]
pub struct AssetIndexBuilder {
    name: String,
    geometry: SheetGeometry,
    categories: Vec<TraitCategory>,
    assets: Vec<LayerAsset>,
    overlays: Vec<Overlay>,
}

impl AssetIndexBuilder {
    pub fn category(mut self, category: TraitCategory) -> Self {
        self.categories.push(category);
        self
    }

    pub fn asset(mut self, asset: LayerAsset) -> Self {
        self.assets.push(asset);
        self
    }

    pub fn overlay(mut self, overlay: Overlay) -> Self {
        self.overlays.push(overlay);
        self
    }

    pub fn geometry(&self) -> &SheetGeometry {
        &self.geometry
    }

    /// Validate and freeze the index.
    pub fn build(self) -> Result<AssetIndex, CatalogError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(CatalogError::Validation(errors));
        }

        let mut assets: HashMap<(String, String), Vec<LayerAsset>> = HashMap::new();
        // Validation guarantees one main layer per key; put it first
        let (mains, parts): (Vec<_>, Vec<_>) = self.assets.into_iter().partition(|a| a.part.is_none());
        for asset in mains.into_iter().chain(parts) {
            assets.entry((asset.category.clone(), asset.value.clone())).or_default().push(asset);
        }

        Ok(AssetIndex {
            name: self.name,
            geometry: self.geometry,
            categories: self.categories,
            assets,
            overlays: self.overlays,
        })
    }

    /// Every problem with the index, empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.geometry.problems();
        let rows = self.geometry.rows;

        if self.categories.is_empty() {
            errors.push("no trait categories declared".to_string());
        }

        let mut seen_categories: HashMap<&str, &TraitCategory> = HashMap::new();
        for category in &self.categories {
            if category.name.trim().is_empty() {
                errors.push("category with empty name".to_string());
            }
            if seen_categories.contains_key(category.name.as_str()) {
                errors.push(format!("category '{}' declared twice", category.name));
            }
            if !(0.0..=1.0).contains(&category.opacity) {
                errors.push(format!(
                    "category '{}': opacity {} outside 0.0-1.0",
                    category.name, category.opacity
                ));
            }
            if category.values.is_empty() {
                errors.push(format!("category '{}' has no values", category.name));
            } else if category.values.iter().all(|v| v.weight == 0) {
                errors.push(format!(
                    "category '{}': every value has weight 0, nothing can be drawn",
                    category.name
                ));
            }

            let mut seen_values = HashSet::new();
            for value in &category.values {
                if !seen_values.insert(value.name.as_str()) {
                    errors.push(format!(
                        "category '{}': value '{}' declared twice",
                        category.name, value.name
                    ));
                }
                for (required, allowed) in &value.requires {
                    match seen_categories.get(required.as_str()) {
                        None => errors.push(format!(
                            "{}/{}: requires '{}', which is not an earlier category",
                            category.name, value.name, required
                        )),
                        Some(earlier) => {
                            for a in allowed {
                                if earlier.value(a).is_none() {
                                    errors.push(format!(
                                        "{}/{}: requires {} = '{}', which is not declared",
                                        category.name, value.name, required, a
                                    ));
                                }
                            }
                        }
                    }
                }
                let backed = self.assets.iter().any(|a| {
                    a.category == category.name && a.value == value.name && a.part.is_none()
                });
                if !backed {
                    errors.push(format!(
                        "{}/{}: no backing asset registered",
                        category.name, value.name
                    ));
                }
            }
            seen_categories.insert(category.name.as_str(), category);
        }

        let mut seen_assets = HashSet::new();
        for asset in &self.assets {
            let key = asset.label();
            if !seen_assets.insert(key.clone()) {
                errors.push(format!("{}: asset registered twice", key));
            }
            if let Some(part) = &asset.part {
                if part.trim().is_empty() {
                    errors.push(format!("{}: part with empty name", key));
                }
                let has_main = self.assets.iter().any(|a| {
                    a.category == asset.category && a.value == asset.value && a.part.is_none()
                });
                if !has_main {
                    errors.push(format!("{}: part registered without a main layer", key));
                }
            }
            let declared = seen_categories
                .get(asset.category.as_str())
                .and_then(|c| c.value(&asset.value))
                .is_some();
            if !declared {
                errors.push(format!("{}: asset does not match any declared trait value", key));
            }
            let mut seen_rows = HashSet::new();
            for &row in &asset.row_map {
                if row >= rows {
                    errors.push(format!("{}: row {} outside sheet ({} rows)", key, row, rows));
                }
                if !seen_rows.insert(row) {
                    errors.push(format!("{}: sheet row {} mapped twice", key, row));
                }
            }
            if !(0.0..=1.0).contains(&asset.opacity) {
                errors.push(format!("{}: opacity {} outside 0.0-1.0", key, asset.opacity));
            }
        }

        for overlay in &self.overlays {
            let (first, last) = overlay.frames;
            if overlay.row >= rows {
                errors.push(format!(
                    "overlay '{}': row {} outside sheet ({} rows)",
                    overlay.name, overlay.row, rows
                ));
            }
            if first > last || last >= self.geometry.frames {
                errors.push(format!(
                    "overlay '{}': frame range {}-{} invalid for {} frames",
                    overlay.name, first, last, self.geometry.frames
                ));
            }
            if overlay.image.dimensions() != self.geometry.tile() {
                let (w, h) = overlay.image.dimensions();
                let (tw, th) = self.geometry.tile();
                errors.push(format!(
                    "overlay '{}': image is {}x{}, expected one {}x{} tile",
                    overlay.name, w, h, tw, th
                ));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn geometry() -> SheetGeometry {
        SheetGeometry::new(4, 4, 2, 3)
    }

    fn tile_image(g: &SheetGeometry) -> RgbaImage {
        RgbaImage::from_pixel(g.sheet_width(), g.sheet_height(), Rgba([9, 9, 9, 255]))
    }

    fn body_category() -> TraitCategory {
        TraitCategory::new("body", 0)
            .with_value(TraitValue::new("round", 1))
            .with_value(TraitValue::new("tall", 2))
    }

    fn valid_builder() -> AssetIndexBuilder {
        let g = geometry();
        let body = body_category();
        AssetIndex::builder("test", g.clone())
            .asset(LayerAsset::new(&body, "round", &g).with_image(tile_image(&g), "round.png"))
            .asset(LayerAsset::new(&body, "tall", &g).with_image(tile_image(&g), "tall.png"))
            .category(body)
    }

    #[test]
    fn test_valid_index_builds() {
        let index = valid_builder().build().unwrap();
        assert_eq!(index.name(), "test");
        assert_eq!(index.categories().len(), 1);
        assert_eq!(index.asset_count(), 2);
        let values: Vec<_> = index.values_for("body").unwrap().iter().map(|v| v.weight).collect();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn test_lookup_found_and_missing() {
        let index = valid_builder().build().unwrap();
        assert_eq!(index.lookup("body", "tall").unwrap().source, "tall.png");
        assert_eq!(
            index.lookup("body", "square"),
            Err(LookupError::AssetNotFound {
                category: "body".to_string(),
                value: "square".to_string()
            })
        );
    }

    #[test]
    fn test_missing_backing_asset_rejected() {
        let g = geometry();
        let body = body_category();
        let result = AssetIndex::builder("test", g.clone())
            .asset(LayerAsset::new(&body, "round", &g))
            .category(body)
            .build();
        match result {
            Err(CatalogError::Validation(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("body/tall"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_all_problems_reported_together() {
        let g = geometry();
        let empty = TraitCategory::new("empty", 0);
        let body = body_category();
        let stray = LayerAsset::new(&body, "square", &g).with_rows(vec![0, 0, 7]);
        let builder = AssetIndex::builder("test", g).category(empty).category(body).asset(stray);
        let errors = builder.validate();
        assert!(errors.iter().any(|e| e.contains("'empty' has no values")));
        assert!(errors.iter().any(|e| e.contains("body/round: no backing asset")));
        assert!(errors.iter().any(|e| e.contains("body/square: asset does not match")));
        assert!(errors.iter().any(|e| e.contains("row 7 outside sheet")));
        assert!(errors.iter().any(|e| e.contains("sheet row 0 mapped twice")));
    }

    #[test]
    fn test_requires_must_name_earlier_category() {
        let g = geometry();
        let hat = TraitCategory::new("hat", 5)
            .with_value(TraitValue::new("cap", 1).requires("body", ["round"]));
        let body = body_category();
        // hat declared before body: invalid
        let errors = AssetIndex::builder("test", g.clone())
            .asset(LayerAsset::new(&hat, "cap", &g))
            .asset(LayerAsset::new(&body, "round", &g))
            .asset(LayerAsset::new(&body, "tall", &g))
            .category(hat)
            .category(body)
            .validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("not an earlier category"));
    }

    #[test]
    fn test_zero_total_weight_rejected() {
        let g = geometry();
        let cat = TraitCategory::new("eyes", 1).with_value(TraitValue::new("closed", 0));
        let errors = AssetIndex::builder("test", g.clone())
            .asset(LayerAsset::new(&cat, "closed", &g))
            .category(cat)
            .validate();
        assert!(errors[0].contains("weight 0"));
    }

    #[test]
    fn test_overlay_bounds_checked() {
        let g = geometry();
        let overlay = Overlay {
            name: "bone".to_string(),
            source: "bone.png".to_string(),
            image: RgbaImage::new(4, 4),
            row: 3,
            frames: (1, 2),
            lift: vec![],
            offset: (0, 0),
        };
        let errors = valid_builder().overlay(overlay).validate();
        assert_eq!(errors.len(), 2, "{:?}", errors);
    }

    #[test]
    fn test_overlay_must_be_one_tile() {
        let overlay = Overlay {
            name: "bone".to_string(),
            source: "bone.png".to_string(),
            image: RgbaImage::new(50, 50),
            row: 0,
            frames: (0, 1),
            lift: vec![],
            offset: (0, 0),
        };
        let errors = valid_builder().overlay(overlay).validate();
        assert_eq!(errors, vec!["overlay 'bone': image is 50x50, expected one 4x4 tile".to_string()]);
    }

    #[test]
    fn test_parts_listed_after_main_layer() {
        let g = geometry();
        let body = body_category();
        let back = LayerAsset::new(&body, "round", &g)
            .with_part("back")
            .with_z(-3)
            .with_image(tile_image(&g), "round_back.png");
        let index = AssetIndex::builder("test", g.clone())
            .asset(back)
            .asset(LayerAsset::new(&body, "round", &g).with_image(tile_image(&g), "round.png"))
            .asset(LayerAsset::new(&body, "tall", &g))
            .category(body)
            .build()
            .unwrap();

        let layers = index.layers("body", "round").unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].label(), "body/round");
        assert_eq!(layers[1].label(), "body/round#back");
        assert_eq!(layers[1].z, -3);
        assert_eq!(index.lookup("body", "round").unwrap().source, "round.png");
        assert_eq!(index.asset_count(), 3);
    }

    #[test]
    fn test_part_without_main_layer_rejected() {
        let g = geometry();
        let body = body_category();
        let errors = AssetIndex::builder("test", g.clone())
            .asset(LayerAsset::new(&body, "round", &g))
            .asset(LayerAsset::new(&body, "tall", &g).with_part("back"))
            .asset(LayerAsset::new(&body, "round", &g).with_part("back"))
            .asset(LayerAsset::new(&body, "round", &g).with_part("back"))
            .category(body)
            .validate();
        assert!(errors.iter().any(|e| e == "body/tall: no backing asset registered"), "{:?}", errors);
        assert!(errors.iter().any(|e| e.contains("body/tall#back: part registered without a main layer")));
        assert!(errors.iter().any(|e| e == "body/round#back: asset registered twice"));
        assert_eq!(errors.len(), 3, "{:?}", errors);
    }

    #[test]
    fn test_oversized_sheet_rejected() {
        let g = SheetGeometry::new(65536, 1, 65536, 1);
        let cat = TraitCategory::new("body", 0).with_value(TraitValue::new("blank", 1));
        let result = AssetIndex::builder("huge", g.clone())
            .asset(LayerAsset::new(&cat, "blank", &g))
            .category(cat)
            .build();
        match result {
            Err(CatalogError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("overflows")), "{:?}", errors);
            }
            other => panic!("expected validation error, got {:?}", other.map(|i| i.asset_count())),
        }
    }

    #[test]
    fn test_overlay_lift_lookup() {
        let overlay = Overlay {
            name: "bone".to_string(),
            source: "bone.png".to_string(),
            image: RgbaImage::new(4, 4),
            row: 0,
            frames: (0, 1),
            lift: vec![(1, -2)],
            offset: (0, 0),
        };
        assert_eq!(overlay.lift_for(0), 0);
        assert_eq!(overlay.lift_for(1), -2);
    }
}
