//! Mathematical utilities for weighted selection

/// Cumulative-weight sampling over integer weights
pub mod sampler;
/// Combination space sizing and collision diagnostics
pub mod space;
