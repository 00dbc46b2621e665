//! Layer catalog: directory discovery and the collection description
//!
//! This module contains:
//! - The layer file naming convention
//! - Trait category, layer and collection types
//! - Directory scanning and collection document loading

/// Layer file naming convention and weight prefix parsing
pub mod naming;
/// Collection, category and layer types with document persistence
pub mod model;
/// Directory tree scanning into collection descriptions
pub mod scan;

pub use model::{CollectionConfig, Layer, TraitCategory};
