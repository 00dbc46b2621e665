//! Engine constants and runtime configuration defaults

// Canvas settings
/// Default canvas width in pixels
pub const DEFAULT_WIDTH: u32 = 512;
/// Default canvas height in pixels
pub const DEFAULT_HEIGHT: u32 = 512;

// Safety limit to prevent excessive memory allocation
/// Maximum allowed canvas dimension
pub const MAX_CANVAS_DIMENSION: u32 = 16_384;

// Layer naming micro-format
/// Version of the layer file naming convention
pub const NAMING_CONVENTION_VERSION: u32 = 1;
/// Separator between the weight prefix and the display name
pub const WEIGHT_SEPARATOR: char = '_';
/// Weight assigned to layers without a parseable prefix
pub const DEFAULT_LAYER_WEIGHT: u32 = 1;
/// Display name marking a category as optional
pub const ABSENT_MARKER: &str = "none";
/// File at the catalog root listing category order
pub const ORDER_FILE_NAME: &str = "order.txt";
/// File extensions recognised as layer images (lowercase)
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "webp", "bmp"];

// Generation retry ceiling
/// Consecutive rejections allowed per draw expected to find a new combination
pub const DEFAULT_RETRY_FACTOR: u64 = 100;
/// Minimum consecutive rejections allowed regardless of edition progress
pub const DEFAULT_RETRY_FLOOR: u64 = 10_000;
/// Number of categories reported when generation times out
pub const MAX_REPORTED_SUSPECTS: usize = 3;
/// Skew at or below which a category counts as evenly weighted
pub const MIN_SUSPECT_SKEW: f64 = 1.01;

// Output settings
/// MIME type of inline previews
pub const PREVIEW_MIME: &str = "image/png";
/// Extension of exported images
pub const IMAGE_OUTPUT_EXTENSION: &str = "png";
/// Directory for exported images inside a run directory
pub const IMAGES_DIR: &str = "images";
/// Directory for per-item metadata inside a run directory
pub const METADATA_DIR: &str = "metadata";
/// Combined metadata document inside a run directory
pub const METADATA_FILE_NAME: &str = "metadata.json";
/// Extension of saved collection documents
pub const COLLECTION_EXTENSION: &str = "json";
/// Run directory used when no output is given
pub const DEFAULT_OUTPUT_DIR: &str = "output";

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;
