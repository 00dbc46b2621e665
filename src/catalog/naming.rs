//! Layer file naming convention (version 1)
//!
//! A layer file name is `<digits>_<display name>.<extension>`. The digits are
//! the layer's relative weight (zero allowed). A name is treated as having no
//! weight prefix, and receives the default weight, when any of these hold:
//! - it does not start with one or more ASCII digits followed by `_`
//! - nothing follows the separator
//! - the digits overflow a `u32`
//!
//! Without a prefix the whole stem becomes the display name, so `0a.png` is
//! the layer `0a` with weight 1. A layer whose display name is `none` is not a
//! layer at all: it marks its category optional and its weight is the weight
//! of the category being absent.

use crate::io::configuration::{
    ABSENT_MARKER, DEFAULT_LAYER_WEIGHT, IMAGE_EXTENSIONS, WEIGHT_SEPARATOR,
};
use std::path::Path;

/// Display name, weight and extension decoded from a layer file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLayerName {
    /// Name shown in metadata and used to address the layer
    pub display_name: String,
    /// Relative selection weight
    pub weight: u32,
    /// Whether the weight came from an explicit prefix
    pub has_weight_prefix: bool,
    /// Lowercased file extension, if any
    pub extension: Option<String>,
}

impl ParsedLayerName {
    /// Whether the file carries a recognised image extension
    pub fn is_image(&self) -> bool {
        self.extension
            .as_deref()
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext))
    }

    /// Whether the file marks its category as optional
    pub fn is_absent_marker(&self) -> bool {
        self.display_name.eq_ignore_ascii_case(ABSENT_MARKER)
    }
}

/// Decode weight and display name from a layer file name
pub fn parse_layer_file_name(file_name: &str) -> ParsedLayerName {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map_or_else(|| file_name.to_string(), |s| s.to_string_lossy().into_owned());
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

    match split_weight_prefix(&stem) {
        Some((weight, name)) => ParsedLayerName {
            display_name: name.to_string(),
            weight,
            has_weight_prefix: true,
            extension,
        },
        None => ParsedLayerName {
            display_name: stem,
            weight: DEFAULT_LAYER_WEIGHT,
            has_weight_prefix: false,
            extension,
        },
    }
}

fn split_weight_prefix(stem: &str) -> Option<(u32, &str)> {
    let (digits, name) = stem.split_once(WEIGHT_SEPARATOR)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) || name.is_empty() {
        return None;
    }
    let weight = digits.parse::<u32>().ok()?;
    Some((weight, name))
}

/// Whether a directory entry should be ignored entirely
pub fn is_hidden(file_name: &str) -> bool {
    file_name.starts_with('.')
}
