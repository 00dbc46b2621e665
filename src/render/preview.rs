//! Inline previews encoded as base64 data URLs
//!
//! Nothing here writes to storage.

use crate::algorithm::combination::{Choice, Combination};
use crate::algorithm::generator::{CombinationGenerator, RetryPolicy};
use crate::catalog::model::CollectionConfig;
use crate::io::configuration::PREVIEW_MIME;
use crate::io::error::{EngineError, Result};
use crate::io::storage::Storage;
use crate::render::compositor::{Compositor, ResizePolicy};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbaImage};
use rand::Rng;
use std::io::Cursor;
use std::path::Path;

/// Encode bytes as a `data:<mime>;base64,` URL
pub fn encode_base64_with_mime_prefix(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Encode a raster as PNG bytes
///
/// # Errors
///
/// Returns an export error naming `destination` if encoding fails
pub fn encode_png(image: &RgbaImage, destination: &Path) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|source| EngineError::ImageExport {
            path: destination.to_path_buf(),
            source,
        })?;
    Ok(bytes)
}

/// Render explicit per-category choices as an inline PNG
///
/// Optional categories left out of `choices` are absent.
///
/// # Errors
///
/// Returns an error if the choices do not form a valid combination or a
/// chosen layer cannot be composited
pub fn preview<S: Storage + ?Sized>(
    storage: &S,
    config: &CollectionConfig,
    choices: &[Choice],
    policy: ResizePolicy,
) -> Result<String> {
    let combination = Combination::from_choices(config, choices)?;
    render_inline(storage, config, &combination, policy)
}

/// Render one weighted random combination as an inline PNG
///
/// # Errors
///
/// Returns an error if a category cannot be sampled or a drawn layer cannot
/// be composited
pub fn preview_random<S, R>(
    storage: &S,
    config: &CollectionConfig,
    policy: ResizePolicy,
    rng: &mut R,
) -> Result<String>
where
    S: Storage + ?Sized,
    R: Rng + ?Sized,
{
    let generator = CombinationGenerator::new(config, RetryPolicy::default())?;
    let combination = generator.draw(rng);
    render_inline(storage, config, &combination, policy)
}

/// Render a combination as an inline PNG
///
/// # Errors
///
/// Returns an error if compositing or encoding fails
pub fn render_inline<S: Storage + ?Sized>(
    storage: &S,
    config: &CollectionConfig,
    combination: &Combination,
    policy: ResizePolicy,
) -> Result<String> {
    let compositor = Compositor::for_collection(storage, config, policy);
    let image = compositor.composite(config, combination)?;
    let bytes = encode_png(&image, Path::new("<preview>"))?;
    Ok(encode_base64_with_mime_prefix(&bytes, PREVIEW_MIME))
}

/// Read an existing asset and return it as a data URL
///
/// # Errors
///
/// Returns a filesystem error if the asset cannot be read
pub fn encode_asset<S: Storage + ?Sized>(storage: &S, path: &Path) -> Result<String> {
    let bytes = storage.read_file(path)?;
    Ok(encode_base64_with_mime_prefix(&bytes, mime_for_path(path)))
}

/// MIME type implied by a file extension
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}
