//! Image output: compositing, asset caching, edition export and inline previews

/// Per-run memoization of decoded layer assets
pub mod cache;
/// Layer stacking onto the canvas
pub mod compositor;
/// Concurrent edition export with metadata
pub mod export;
/// Base64 data URL previews
pub mod preview;
