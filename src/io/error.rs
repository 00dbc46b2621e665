//! Error types and stage attribution for collection engine operations

use std::fmt;
use std::path::{Path, PathBuf};

use crate::math::space::CollisionSuspect;

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Layer discovery and collection validation
    Catalog,
    /// Weighted sampler construction
    Sampler,
    /// Unique combination generation
    Generation,
    /// Layer decoding and stacking
    Composite,
    /// Encoding and persisting finished images
    Export,
    /// Raw filesystem access
    FileSystem,
    /// Caller-supplied parameters
    Configuration,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Catalog => "catalog",
            Self::Sampler => "sampler",
            Self::Generation => "generation",
            Self::Composite => "composite",
            Self::Export => "export",
            Self::FileSystem => "filesystem",
            Self::Configuration => "configuration",
        };
        f.write_str(name)
    }
}

/// Main error type for all engine operations
#[derive(Debug)]
pub enum EngineError {
    /// Layer directory or collection document is unusable
    Catalog {
        /// Directory or document the problem was found in
        path: PathBuf,
        /// Description of what is wrong
        reason: String,
    },

    /// Weight set cannot be sampled from
    Sampler {
        /// Category owning the degenerate weight set
        category: String,
        /// Description of the degenerate configuration
        reason: String,
    },

    /// Requested edition is larger than the reachable combination space
    ///
    /// Raised before any sampling happens.
    InsufficientSpace {
        /// Number of combinations requested
        requested: usize,
        /// Number of distinct combinations the catalog can produce
        available: u64,
    },

    /// Too many consecutive duplicate candidates were drawn
    GenerationTimeout {
        /// Unique combinations accepted before giving up
        accepted: usize,
        /// Number of combinations requested
        requested: usize,
        /// Consecutive rejections when the ceiling was hit
        rejections: u64,
        /// Categories most likely responsible for the collisions
        suspects: Vec<CollisionSuspect>,
    },

    /// Layer asset could not be decoded
    Composite {
        /// Asset that failed to decode
        asset: PathBuf,
        /// Underlying decoding error
        source: image::ImageError,
    },

    /// Layer asset does not match the canvas under the exact resize policy
    AssetDimensions {
        /// Offending asset
        asset: PathBuf,
        /// Canvas dimensions (width, height)
        expected: (u32, u32),
        /// Asset dimensions (width, height)
        actual: (u32, u32),
    },

    /// Failed to encode a finished composite
    ImageExport {
        /// Destination of the encoded image
        path: PathBuf,
        /// Underlying image encoding error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Collection document or metadata could not be (de)serialized
    Serialization {
        /// Document involved
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// Caller-supplied parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Run was cancelled before the stage completed
    Cancelled {
        /// Stage that observed the cancellation
        stage: Stage,
    },
}

impl EngineError {
    /// Pipeline stage this error belongs to
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Catalog { .. } => Stage::Catalog,
            Self::Sampler { .. } => Stage::Sampler,
            Self::InsufficientSpace { .. } | Self::GenerationTimeout { .. } => Stage::Generation,
            Self::Composite { .. } | Self::AssetDimensions { .. } => Stage::Composite,
            Self::ImageExport { .. } => Stage::Export,
            Self::FileSystem { .. } => Stage::FileSystem,
            Self::Serialization { .. } | Self::InvalidParameter { .. } => Stage::Configuration,
            Self::Cancelled { stage } => *stage,
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Catalog { path, reason } => {
                write!(f, "Catalog error in '{}': {reason}", path.display())
            }
            Self::Sampler { category, reason } => {
                write!(f, "Cannot sample category '{category}': {reason}")
            }
            Self::InsufficientSpace {
                requested,
                available,
            } => {
                write!(
                    f,
                    "Requested {requested} unique combinations but only {available} exist"
                )
            }
            Self::GenerationTimeout {
                accepted,
                requested,
                rejections,
                suspects,
            } => {
                write!(
                    f,
                    "Gave up after {rejections} consecutive duplicates with {accepted}/{requested} combinations accepted"
                )?;
                if !suspects.is_empty() {
                    let listed: Vec<String> = suspects.iter().map(ToString::to_string).collect();
                    write!(f, "; suspected categories: {}", listed.join(", "))?;
                }
                Ok(())
            }
            Self::Composite { asset, source } => {
                write!(f, "Failed to decode layer '{}': {source}", asset.display())
            }
            Self::AssetDimensions {
                asset,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Layer '{}' is {}x{} but the canvas is {}x{}",
                    asset.display(),
                    actual.0,
                    actual.1,
                    expected.0,
                    expected.1
                )
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::Serialization { path, source } => {
                write!(f, "Invalid document '{}': {source}", path.display())
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::Cancelled { stage } => write!(f, "Run cancelled during {stage}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Composite { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            Self::Serialization { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for engine results
pub type Result<T> = std::result::Result<T, EngineError>;

/// Attaches path context to raw I/O failures
pub trait WithPath<T> {
    /// Convert an I/O error into a [`EngineError::FileSystem`] naming the path and operation
    ///
    /// # Errors
    ///
    /// Propagates the original error with the path and operation applied
    fn with_path(self, path: &Path, operation: &'static str) -> Result<T>;
}

impl<T> WithPath<T> for std::result::Result<T, std::io::Error> {
    fn with_path(self, path: &Path, operation: &'static str) -> Result<T> {
        self.map_err(|source| EngineError::FileSystem {
            path: path.to_path_buf(),
            operation,
            source,
        })
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> EngineError {
    EngineError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a catalog error for the given directory or document
pub fn catalog_error(path: &Path, reason: &impl ToString) -> EngineError {
    EngineError::Catalog {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
