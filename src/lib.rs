//! Weighted generative collection engine
//!
//! A layer catalog is scanned from a directory tree of weighted image files,
//! unique trait combinations are drawn from it by weighted sampling, and each
//! combination is composited into a single image and exported with metadata.

#![forbid(unsafe_code)]

/// Unique combination generation with cancellation support
pub mod algorithm;
/// Layer discovery, naming convention and collection documents
pub mod catalog;
/// Input/output operations, configuration and error handling
pub mod io;
/// Weighted sampling and combination space arithmetic
pub mod math;
/// Compositing, export and inline previews
pub mod render;

pub use io::error::{EngineError, Result, Stage};
