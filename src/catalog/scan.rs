//! Directory scanning into a collection description
//!
//! Each first-level directory under the root is a trait category and each
//! image inside it a layer. Categories are ordered by `order.txt` when present
//! (listed names first, in listed order) and by directory name otherwise.

use crate::catalog::model::{CollectionConfig, Layer, TraitCategory, load_collection};
use crate::catalog::naming::{is_hidden, parse_layer_file_name};
use crate::io::configuration::{
    COLLECTION_EXTENSION, DEFAULT_HEIGHT, DEFAULT_LAYER_WEIGHT, DEFAULT_WIDTH, ORDER_FILE_NAME,
};
use crate::io::error::{Result, catalog_error};
use crate::io::storage::Storage;
use std::path::Path;
use tracing::{debug, info, warn};

/// Build a collection description from a layer directory tree
///
/// # Errors
///
/// Returns a catalog error if:
/// - `root` is not an existing directory
/// - `order.txt` names a category directory that does not exist
/// - A required category contains no usable image files
/// - An optional category holds more than one absent marker
/// - The resulting collection violates its invariants
#[tracing::instrument(skip(storage))]
pub fn scan_layers<S: Storage + ?Sized>(
    storage: &S,
    root: &Path,
    width: u32,
    height: u32,
) -> Result<CollectionConfig> {
    if !storage.is_dir(root) {
        return Err(catalog_error(root, &"layer directory does not exist"));
    }

    let mut directories = Vec::new();
    for name in storage.list_dir(root)? {
        if !is_hidden(&name) && storage.is_dir(&root.join(&name)) {
            directories.push(name);
        }
    }

    let order_path = root.join(ORDER_FILE_NAME);
    let ordered = if storage.exists(&order_path) {
        let bytes = storage.read_file(&order_path)?;
        let listed = parse_order_file(&String::from_utf8_lossy(&bytes));
        apply_order(directories, &listed, root)?
    } else {
        directories
    };

    let mut categories = Vec::with_capacity(ordered.len());
    for name in ordered {
        categories.push(scan_category(storage, &root.join(&name), name)?);
    }

    let config = CollectionConfig::new(categories, width, height);
    config.validate(root)?;

    info!(
        categories = config.categories.len(),
        layers = config.categories.iter().map(|c| c.layers.len()).sum::<usize>(),
        "scanned layer catalog"
    );
    Ok(config)
}

/// Open either a layer directory or a saved collection document
///
/// Explicit dimensions override those stored in a document.
///
/// # Errors
///
/// Returns an error if the source is neither a directory nor a readable,
/// valid collection document
pub fn open_collection<S: Storage + ?Sized>(
    storage: &S,
    source: &Path,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<CollectionConfig> {
    if storage.is_dir(source) {
        return scan_layers(
            storage,
            source,
            width.unwrap_or(DEFAULT_WIDTH),
            height.unwrap_or(DEFAULT_HEIGHT),
        );
    }

    let is_document = source
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(COLLECTION_EXTENSION));
    if !is_document {
        return Err(catalog_error(
            source,
            &"source must be a layer directory or a collection document",
        ));
    }

    let mut config = load_collection(storage, source)?;
    if let Some(width) = width {
        config.width = width;
    }
    if let Some(height) = height {
        config.height = height;
    }
    config.validate(source)?;
    Ok(config)
}

/// Category names listed in an order file, skipping blanks and `#` comments
pub fn parse_order_file(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}

/// Listed directories first in listed order, then the rest by name
fn apply_order(mut directories: Vec<String>, listed: &[String], root: &Path) -> Result<Vec<String>> {
    directories.sort();
    let mut ordered = Vec::with_capacity(directories.len());

    for name in listed {
        if ordered.contains(name) {
            continue;
        }
        let Some(index) = directories.iter().position(|dir| dir == name) else {
            return Err(catalog_error(
                root,
                &format!("{ORDER_FILE_NAME} lists '{name}' but no such category directory exists"),
            ));
        };
        ordered.push(directories.remove(index));
    }

    ordered.extend(directories);
    Ok(ordered)
}

fn scan_category<S: Storage + ?Sized>(
    storage: &S,
    directory: &Path,
    name: String,
) -> Result<TraitCategory> {
    let mut layers = Vec::new();
    let mut absent_weight = None;

    for file_name in storage.list_dir(directory)? {
        let path = directory.join(&file_name);
        if is_hidden(&file_name) || storage.is_dir(&path) {
            continue;
        }

        let parsed = parse_layer_file_name(&file_name);
        if parsed.is_absent_marker() {
            if absent_weight.is_some() {
                return Err(catalog_error(
                    directory,
                    &"category has more than one absent marker",
                ));
            }
            absent_weight = Some(parsed.weight);
        } else if parsed.is_image() {
            if !parsed.has_weight_prefix {
                debug!(file = %file_name, weight = DEFAULT_LAYER_WEIGHT, "no weight prefix");
            }
            layers.push(Layer::new(parsed.display_name, parsed.weight, path));
        } else {
            debug!(file = %file_name, "skipping non-image file");
        }
    }

    if layers.is_empty() && absent_weight.is_none() {
        return Err(catalog_error(
            directory,
            &"category contains no usable image files",
        ));
    }
    if layers.iter().all(|layer| layer.weight == 0) && absent_weight.unwrap_or(0) == 0 {
        warn!(category = %name, "every outcome in category has zero weight");
    }

    Ok(match absent_weight {
        Some(weight) => TraitCategory::optional(name, layers, weight),
        None => TraitCategory::required(name, layers),
    })
}
