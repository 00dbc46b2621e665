//! Trait categories, layers and the collection description they form

use crate::algorithm::combination::Selection;
use crate::io::configuration::{ABSENT_MARKER, DEFAULT_LAYER_WEIGHT, MAX_CANVAS_DIMENSION};
use crate::io::error::{EngineError, Result, WithPath, catalog_error};
use crate::io::storage::Storage;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One selectable asset within a trait category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    /// Display name used in metadata and explicit choices
    pub name: String,
    /// Relative selection weight
    pub weight: u32,
    /// Location of the image asset
    pub asset: PathBuf,
}

impl Layer {
    /// Create a layer from its parts
    pub fn new(name: impl Into<String>, weight: u32, asset: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            weight,
            asset: asset.into(),
        }
    }
}

const fn default_absent_weight() -> u32 {
    DEFAULT_LAYER_WEIGHT
}

/// Named axis of variation contributing at most one layer per item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitCategory {
    /// Category name, unique within a collection
    pub name: String,
    /// Stacking position; lower positions are drawn first
    ///
    /// Derived from the category's index in [`CollectionConfig::categories`].
    #[serde(skip)]
    pub position: usize,
    /// Whether the category may resolve to no layer
    #[serde(default)]
    pub optional: bool,
    /// Weight of the absent outcome for optional categories
    #[serde(default = "default_absent_weight")]
    pub absent_weight: u32,
    /// Selectable layers in catalog order
    pub layers: Vec<Layer>,
}

impl TraitCategory {
    /// Create a category that always contributes a layer
    pub fn required(name: impl Into<String>, layers: Vec<Layer>) -> Self {
        Self {
            name: name.into(),
            position: 0,
            optional: false,
            absent_weight: DEFAULT_LAYER_WEIGHT,
            layers,
        }
    }

    /// Create a category whose absence is itself a weighted outcome
    pub fn optional(name: impl Into<String>, layers: Vec<Layer>, absent_weight: u32) -> Self {
        Self {
            name: name.into(),
            position: 0,
            optional: true,
            absent_weight,
            layers,
        }
    }

    /// Number of outcomes including the absent slot
    pub fn cardinality(&self) -> usize {
        self.layers.len() + usize::from(self.optional)
    }

    /// Number of outcomes that can actually be drawn (positive weight)
    pub fn reachable_options(&self) -> u64 {
        let layers = self.layers.iter().filter(|layer| layer.weight > 0).count() as u64;
        layers + u64::from(self.optional && self.absent_weight > 0)
    }

    /// Every outcome paired with its weight, absent slot last
    pub fn weighted_options(&self) -> Vec<(Selection, u32)> {
        let mut options: Vec<(Selection, u32)> = self
            .layers
            .iter()
            .enumerate()
            .map(|(index, layer)| (Selection::Chosen(index), layer.weight))
            .collect();
        if self.optional {
            options.push((Selection::Absent, self.absent_weight));
        }
        options
    }

    /// Index of the layer with the given display name
    pub fn find_layer(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.name == name)
    }

    /// Display label for an outcome of this category
    pub fn label(&self, selection: Selection) -> Option<&str> {
        match selection {
            Selection::Chosen(index) => self.layers.get(index).map(|layer| layer.name.as_str()),
            Selection::Absent => self.optional.then_some(ABSENT_MARKER),
        }
    }
}

/// Caller-owned description of a collection: categories, layers and canvas size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Categories in stacking order
    pub categories: Vec<TraitCategory>,
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
}

impl CollectionConfig {
    /// Create a collection, assigning positions from the category order
    pub fn new(mut categories: Vec<TraitCategory>, width: u32, height: u32) -> Self {
        for (position, category) in categories.iter_mut().enumerate() {
            category.position = position;
        }
        Self {
            categories,
            width,
            height,
        }
    }

    /// Look up a category by name
    pub fn category(&self, name: &str) -> Option<&TraitCategory> {
        self.categories.iter().find(|category| category.name == name)
    }

    /// Check structural invariants, reporting problems against `origin`
    ///
    /// # Errors
    ///
    /// Returns a catalog error if:
    /// - The canvas is empty or exceeds the maximum dimension
    /// - There are no categories, or names or positions repeat
    /// - A required category has no layers
    /// - Layer names repeat within a category
    pub fn validate(&self, origin: &Path) -> Result<()> {
        for (label, value) in [("width", self.width), ("height", self.height)] {
            if value == 0 || value > MAX_CANVAS_DIMENSION {
                return Err(catalog_error(
                    origin,
                    &format!("canvas {label} {value} must be between 1 and {MAX_CANVAS_DIMENSION}"),
                ));
            }
        }

        if self.categories.is_empty() {
            return Err(catalog_error(origin, &"collection has no trait categories"));
        }

        let mut names = HashSet::new();
        for (index, category) in self.categories.iter().enumerate() {
            if category.position != index {
                return Err(catalog_error(
                    origin,
                    &format!(
                        "category '{}' has position {} but is listed at {index}",
                        category.name, category.position
                    ),
                ));
            }
            if !names.insert(category.name.as_str()) {
                return Err(catalog_error(
                    origin,
                    &format!("category '{}' appears more than once", category.name),
                ));
            }
            if category.layers.is_empty() && !category.optional {
                return Err(catalog_error(
                    origin,
                    &format!("required category '{}' has no layers", category.name),
                ));
            }

            let mut layer_names = HashSet::new();
            for layer in &category.layers {
                if layer.name.eq_ignore_ascii_case(ABSENT_MARKER) {
                    return Err(catalog_error(
                        origin,
                        &format!(
                            "layer name '{}' in category '{}' is reserved",
                            layer.name, category.name
                        ),
                    ));
                }
                if !layer_names.insert(layer.name.as_str()) {
                    return Err(catalog_error(
                        origin,
                        &format!(
                            "layer '{}' appears more than once in category '{}'",
                            layer.name, category.name
                        ),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Serialize as a pretty-printed collection document
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| EngineError::Serialization {
            path: PathBuf::from("<memory>"),
            source,
        })
    }

    /// Parse and validate a collection document
    ///
    /// # Errors
    ///
    /// Returns a serialization error for malformed JSON and a catalog error
    /// if the decoded collection violates its invariants
    pub fn from_json(text: &str, origin: &Path) -> Result<Self> {
        Self::checked(serde_json::from_str(text), origin)
    }

    /// Parse and validate a collection document from raw bytes
    ///
    /// Bytes that are not valid UTF-8 are rejected rather than replaced.
    ///
    /// # Errors
    ///
    /// See [`Self::from_json`]
    pub fn from_json_slice(bytes: &[u8], origin: &Path) -> Result<Self> {
        Self::checked(serde_json::from_slice(bytes), origin)
    }

    fn checked(parsed: serde_json::Result<Self>, origin: &Path) -> Result<Self> {
        let parsed = parsed.map_err(|source| EngineError::Serialization {
            path: origin.to_path_buf(),
            source,
        })?;
        let config = Self::new(parsed.categories, parsed.width, parsed.height);
        config.validate(origin)?;
        Ok(config)
    }

    fn map_assets(&mut self, mut relocate: impl FnMut(&Path) -> Result<PathBuf>) -> Result<()> {
        for layer in self
            .categories
            .iter_mut()
            .flat_map(|category| category.layers.iter_mut())
        {
            layer.asset = relocate(&layer.asset)?;
        }
        Ok(())
    }
}

/// Absolute directory holding a collection document
fn document_dir(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).with_path(path, "resolve document path")?;
    Ok(absolute.parent().map(Path::to_path_buf).unwrap_or_default())
}

/// Load a previously saved collection document
///
/// Relative asset paths are resolved against the document's directory.
///
/// # Errors
///
/// Returns an error if the document cannot be read, parsed or validated
pub fn load_collection<S: Storage + ?Sized>(storage: &S, path: &Path) -> Result<CollectionConfig> {
    let bytes = storage.read_file(path)?;
    let mut config = CollectionConfig::from_json_slice(&bytes, path)?;
    let base = document_dir(path)?;
    config.map_assets(|asset| Ok(base.join(asset)))?;
    Ok(config)
}

/// Save a collection document, replacing any existing file atomically
///
/// Assets below the document's directory are stored relative to it, all
/// others as absolute paths.
///
/// # Errors
///
/// Returns an error if the collection cannot be serialized or written
pub fn save_collection<S: Storage + ?Sized>(
    storage: &S,
    path: &Path,
    config: &CollectionConfig,
) -> Result<()> {
    let base = document_dir(path)?;
    let mut portable = config.clone();
    portable.map_assets(|asset| {
        let absolute = std::path::absolute(asset).with_path(asset, "resolve asset path")?;
        Ok(absolute
            .strip_prefix(&base)
            .map_or_else(|_| absolute.clone(), Path::to_path_buf))
    })?;
    let text = portable.to_json()?;
    storage.write_file(path, text.as_bytes())
}
