//! Full edition export: images, per-item metadata and a combined metadata document
//!
//! Items are composited and written concurrently on a dedicated thread pool.
//! Metadata order is rebuilt from sequence numbers once every worker is done.

use crate::algorithm::cancel::CancellationToken;
use crate::algorithm::combination::{Combination, Edition};
use crate::catalog::model::CollectionConfig;
use crate::io::configuration::{
    IMAGE_OUTPUT_EXTENSION, IMAGES_DIR, METADATA_DIR, METADATA_FILE_NAME,
};
use crate::io::error::{EngineError, Result, invalid_parameter};
use crate::io::storage::Storage;
use crate::render::compositor::{Compositor, ResizePolicy};
use crate::render::preview::encode_png;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Export run settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Handling of layer assets that do not match the canvas
    pub resize: ResizePolicy,
    /// Worker threads; `None` uses one per available CPU
    pub threads: Option<usize>,
    /// Stop submitting items after the first failure
    pub fail_fast: bool,
}

/// One category's outcome in a metadata record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Category name
    pub trait_type: String,
    /// Chosen layer name, `null` when absent
    pub value: Option<String>,
}

/// Metadata emitted alongside each exported image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// One-based position in the edition
    pub sequence: usize,
    /// Image file name relative to the images directory
    pub image: String,
    /// Outcome of every category in position order
    pub attributes: Vec<Attribute>,
}

impl MetadataRecord {
    /// Describe a combination for the given sequence number
    ///
    /// # Errors
    ///
    /// Returns an error if the combination does not fit the collection
    pub fn new(
        config: &CollectionConfig,
        combination: &Combination,
        sequence: usize,
        image: String,
    ) -> Result<Self> {
        let attributes = combination
            .resolve(config)?
            .into_iter()
            .map(|(category, layer)| Attribute {
                trait_type: category.name.clone(),
                value: layer.map(|layer| layer.name.clone()),
            })
            .collect();

        Ok(Self {
            sequence,
            image,
            attributes,
        })
    }
}

/// File naming for one export run
///
/// Sequence numbers are zero-padded to the width of the edition size so that
/// names sort in sequence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    root: PathBuf,
    digits: usize,
}

impl RunLayout {
    /// Layout for an edition of `count` items under `root`
    pub fn new(root: impl Into<PathBuf>, count: usize) -> Self {
        Self {
            root: root.into(),
            digits: count.max(1).to_string().len(),
        }
    }

    /// Run directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Zero-padded sequence stem shared by image and metadata files
    pub fn file_stem(&self, sequence: usize) -> String {
        format!("{sequence:0width$}", width = self.digits)
    }

    /// Image file name for a sequence number
    pub fn image_name(&self, sequence: usize) -> String {
        format!("{}.{IMAGE_OUTPUT_EXTENSION}", self.file_stem(sequence))
    }

    /// Directory holding exported images
    pub fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES_DIR)
    }

    /// Directory holding per-item metadata
    pub fn metadata_dir(&self) -> PathBuf {
        self.root.join(METADATA_DIR)
    }

    /// Full path of the image for a sequence number
    pub fn image_path(&self, sequence: usize) -> PathBuf {
        self.images_dir().join(self.image_name(sequence))
    }

    /// Full path of the metadata record for a sequence number
    pub fn metadata_path(&self, sequence: usize) -> PathBuf {
        self.metadata_dir()
            .join(format!("{}.json", self.file_stem(sequence)))
    }

    /// Full path of the combined metadata document
    pub fn combined_metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE_NAME)
    }
}

/// Export failure for a single item
#[derive(Debug)]
pub struct ItemFailure {
    /// Sequence number of the failed item
    pub sequence: usize,
    /// What went wrong
    pub error: EngineError,
}

/// Outcome of an export run
#[derive(Debug, Default)]
pub struct ExportSummary {
    /// Records of written items in sequence order
    pub records: Vec<MetadataRecord>,
    /// Failed items in sequence order
    pub failed: Vec<ItemFailure>,
    /// Items never attempted because of cancellation or fail-fast
    pub skipped: usize,
    /// Whether the cancellation token fired during the run
    pub cancelled: bool,
}

impl ExportSummary {
    /// Number of items written
    pub fn succeeded(&self) -> usize {
        self.records.len()
    }

    /// Whether every item was written
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped == 0 && !self.cancelled
    }

    /// Error of the lowest-numbered failed item
    pub fn first_failure(&self) -> Option<&ItemFailure> {
        self.failed.first()
    }
}

enum ItemOutcome {
    Written(MetadataRecord),
    Failed(EngineError),
    Skipped,
}

/// Composite and write every combination of an edition
///
/// # Errors
///
/// See [`export_edition_with`]
pub fn export_edition<S: Storage + ?Sized>(
    storage: &S,
    config: &CollectionConfig,
    edition: &Edition,
    output: &Path,
    options: &ExportOptions,
    cancel: &CancellationToken,
) -> Result<ExportSummary> {
    export_edition_with(storage, config, edition, output, options, cancel, |_| {})
}

/// Composite and write every combination, reporting each finished sequence number
///
/// Per-item failures are collected in the summary, in fail-fast mode too;
/// there the first failure only stops further items from starting. Already
/// written files are left in place whatever happens.
///
/// # Errors
///
/// Returns an error if:
/// - The thread pool cannot be built
/// - The output directories cannot be created
/// - The combined metadata document cannot be written
#[tracing::instrument(
    skip(storage, config, edition, options, cancel, on_item),
    fields(items = edition.len())
)]
pub fn export_edition_with<S, F>(
    storage: &S,
    config: &CollectionConfig,
    edition: &Edition,
    output: &Path,
    options: &ExportOptions,
    cancel: &CancellationToken,
    on_item: F,
) -> Result<ExportSummary>
where
    S: Storage + ?Sized,
    F: Fn(usize) + Sync,
{
    let pool = build_thread_pool(options.threads)?;
    let layout = RunLayout::new(output, edition.len());
    storage.create_dir_all(&layout.images_dir())?;
    storage.create_dir_all(&layout.metadata_dir())?;

    let compositor = Compositor::for_collection(storage, config, options.resize);
    let abort = AtomicBool::new(false);

    let mut outcomes: Vec<(usize, ItemOutcome)> = pool.install(|| {
        edition
            .combinations()
            .par_iter()
            .enumerate()
            .map(|(index, combination)| {
                let sequence = index + 1;
                if cancel.is_cancelled() || abort.load(Ordering::SeqCst) {
                    return (sequence, ItemOutcome::Skipped);
                }

                let outcome =
                    match export_item(storage, config, &compositor, &layout, combination, sequence)
                    {
                        Ok(record) => ItemOutcome::Written(record),
                        Err(error) => {
                            warn!(sequence, %error, "item export failed");
                            if options.fail_fast {
                                abort.store(true, Ordering::SeqCst);
                            }
                            ItemOutcome::Failed(error)
                        }
                    };
                on_item(sequence);
                (sequence, outcome)
            })
            .collect()
    });
    outcomes.sort_by_key(|(sequence, _)| *sequence);

    let mut summary = ExportSummary::default();
    for (sequence, outcome) in outcomes {
        match outcome {
            ItemOutcome::Written(record) => summary.records.push(record),
            ItemOutcome::Failed(error) => summary.failed.push(ItemFailure { sequence, error }),
            ItemOutcome::Skipped => summary.skipped += 1,
        }
    }
    summary.cancelled = cancel.is_cancelled();

    let combined_path = layout.combined_metadata_path();
    let combined = serde_json::to_vec_pretty(&summary.records).map_err(|source| {
        EngineError::Serialization {
            path: combined_path.clone(),
            source,
        }
    })?;
    storage.write_file(&combined_path, &combined)?;

    let cache = compositor.cache_stats();
    info!(
        succeeded = summary.succeeded(),
        failed = summary.failed.len(),
        skipped = summary.skipped,
        cancelled = summary.cancelled,
        cache_hits = cache.hits,
        cache_misses = cache.misses,
        "export finished"
    );
    Ok(summary)
}

fn export_item<S: Storage + ?Sized>(
    storage: &S,
    config: &CollectionConfig,
    compositor: &Compositor<'_, S>,
    layout: &RunLayout,
    combination: &Combination,
    sequence: usize,
) -> Result<MetadataRecord> {
    let image = compositor.composite(config, combination)?;
    let image_path = layout.image_path(sequence);
    let bytes = encode_png(&image, &image_path)?;
    storage.write_file(&image_path, &bytes)?;

    let record = MetadataRecord::new(config, combination, sequence, layout.image_name(sequence))?;
    let metadata_path = layout.metadata_path(sequence);
    let json = serde_json::to_vec_pretty(&record).map_err(|source| EngineError::Serialization {
        path: metadata_path.clone(),
        source,
    })?;
    storage.write_file(&metadata_path, &json)?;
    Ok(record)
}

fn build_thread_pool(threads: Option<usize>) -> Result<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(invalid_parameter(
            "threads",
            &n,
            &"must be at least 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| invalid_parameter("threads", &format!("{threads:?}"), &e))
}
