//! Layer stacking onto a fixed-size transparent canvas
//!
//! Layers are decoded once, fitted to the canvas according to the run's
//! [`ResizePolicy`], premultiplied and then composited with source-over in
//! category position order (lowest position at the bottom).

use crate::algorithm::combination::Combination;
use crate::catalog::model::{CollectionConfig, Layer};
use crate::io::error::{EngineError, Result, invalid_parameter};
use crate::io::storage::Storage;
use crate::render::cache::{AssetCache, CacheStats, PreparedLayer};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How layer assets that do not match the canvas are handled
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ResizePolicy {
    /// Reject mismatched assets
    #[default]
    Exact,
    /// Scale to the canvas, ignoring aspect ratio
    Stretch,
    /// Scale to fit inside the canvas, centered on transparent padding
    Fit,
    /// Scale to cover the canvas and crop the overflow around the center
    Crop,
}

/// Stacks the layers of combinations into canvas-sized rasters
pub struct Compositor<'s, S: Storage + ?Sized> {
    storage: &'s S,
    width: u32,
    height: u32,
    policy: ResizePolicy,
    cache: AssetCache,
}

impl<'s, S: Storage + ?Sized> Compositor<'s, S> {
    /// Create a compositor for a canvas of the given size
    pub fn new(storage: &'s S, width: u32, height: u32, policy: ResizePolicy) -> Self {
        Self {
            storage,
            width,
            height,
            policy,
            cache: AssetCache::new(),
        }
    }

    /// Create a compositor using the collection's canvas size
    pub fn for_collection(storage: &'s S, config: &CollectionConfig, policy: ResizePolicy) -> Self {
        Self::new(storage, config.width, config.height, policy)
    }

    /// Canvas dimensions (width, height)
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Asset cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Render one combination
    ///
    /// Absent categories contribute nothing; the canvas starts transparent.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The combination does not fit the collection
    /// - A layer asset cannot be read or decoded
    /// - A layer asset mismatches the canvas under [`ResizePolicy::Exact`]
    pub fn composite(
        &self,
        config: &CollectionConfig,
        combination: &Combination,
    ) -> Result<RgbaImage> {
        let resolved = combination.resolve(config)?;
        let mut canvas = vec![0u8; self.buffer_len()];

        for layer in resolved.into_iter().filter_map(|(_, layer)| layer) {
            let prepared = self.prepare(layer)?;
            over_in_place(&mut canvas, &prepared.rgba8_premul);
        }

        unpremultiply_rgba8_in_place(&mut canvas);
        RgbaImage::from_raw(self.width, self.height, canvas).ok_or_else(|| {
            invalid_parameter(
                "canvas",
                &format!("{}x{}", self.width, self.height),
                &"pixel buffer does not match canvas size",
            )
        })
    }

    fn buffer_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    fn prepare(&self, layer: &Layer) -> Result<Arc<PreparedLayer>> {
        self.cache.get_or_load(&layer.asset, || {
            let bytes = self.storage.read_file(&layer.asset)?;
            let decoded =
                image::load_from_memory(&bytes).map_err(|source| EngineError::Composite {
                    asset: layer.asset.clone(),
                    source,
                })?;
            let fitted = fit_to_canvas(decoded, self.width, self.height, self.policy)
                .map_err(|actual| EngineError::AssetDimensions {
                    asset: layer.asset.clone(),
                    expected: (self.width, self.height),
                    actual,
                })?;

            let mut rgba8_premul = fitted.into_raw();
            premultiply_rgba8_in_place(&mut rgba8_premul);
            Ok(PreparedLayer { rgba8_premul })
        })
    }
}

/// Fit a decoded asset to the canvas, returning its size when it must be rejected
///
/// # Errors
///
/// Returns the asset's (width, height) if it mismatches the canvas under
/// [`ResizePolicy::Exact`]
pub fn fit_to_canvas(
    image: DynamicImage,
    width: u32,
    height: u32,
    policy: ResizePolicy,
) -> std::result::Result<RgbaImage, (u32, u32)> {
    let actual = (image.width(), image.height());
    if actual == (width, height) {
        return Ok(image.into_rgba8());
    }

    match policy {
        ResizePolicy::Exact => Err(actual),
        ResizePolicy::Stretch => Ok(image
            .resize_exact(width, height, FilterType::Lanczos3)
            .into_rgba8()),
        ResizePolicy::Crop => Ok(image
            .resize_to_fill(width, height, FilterType::Lanczos3)
            .into_rgba8()),
        ResizePolicy::Fit => {
            let scaled = image.resize(width, height, FilterType::Lanczos3).into_rgba8();
            let mut padded = RgbaImage::new(width, height);
            let x = i64::from(width.saturating_sub(scaled.width()) / 2);
            let y = i64::from(height.saturating_sub(scaled.height()) / 2);
            imageops::replace(&mut padded, &scaled, x, y);
            Ok(padded)
        }
    }
}

/// Source-over blend of one premultiplied pixel onto another
pub fn over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let [sr, sg, sb, sa] = src;
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(sa);
    let [dr, dg, db, da] = dst;
    [
        sr.saturating_add(mul_div255(u16::from(dr), inv)),
        sg.saturating_add(mul_div255(u16::from(dg), inv)),
        sb.saturating_add(mul_div255(u16::from(db), inv)),
        sa.saturating_add(mul_div255(u16::from(da), inv)),
    ]
}

/// Blend a premultiplied RGBA8 buffer over another of the same length
pub fn over_in_place(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        if let (Ok(dst_px), Ok(src_px)) = (<[u8; 4]>::try_from(&*d), <[u8; 4]>::try_from(s)) {
            d.copy_from_slice(&over(dst_px, src_px));
        }
    }
}

/// Convert straight-alpha RGBA8 to premultiplied in place
pub fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let [r, g, b, a] = px else { continue };
        let alpha = u16::from(*a);
        *r = mul_div255(u16::from(*r), alpha);
        *g = mul_div255(u16::from(*g), alpha);
        *b = mul_div255(u16::from(*b), alpha);
    }
}

/// Convert premultiplied RGBA8 back to straight alpha in place
pub fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let [r, g, b, a] = px else { continue };
        let alpha = u32::from(*a);
        if alpha == 0 {
            *r = 0;
            *g = 0;
            *b = 0;
            continue;
        }
        for channel in [r, g, b] {
            let straight = (u32::from(*channel) * 255 + alpha / 2) / alpha;
            *channel = straight.min(255) as u8;
        }
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
