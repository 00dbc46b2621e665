//! Command-line interface for scanning catalogs, generating editions and previewing combinations

use crate::algorithm::cancel::CancellationToken;
use crate::algorithm::combination::Choice;
use crate::algorithm::generator::{CombinationGenerator, RetryPolicy, rng_from_seed};
use crate::catalog::model::{CollectionConfig, save_collection};
use crate::catalog::scan::open_collection;
use crate::io::configuration::{DEFAULT_OUTPUT_DIR, DEFAULT_RETRY_FACTOR};
use crate::io::error::{Result, invalid_parameter};
use crate::io::progress::ProgressManager;
use crate::io::storage::FileSystem;
use crate::render::compositor::ResizePolicy;
use crate::render::export::{ExportOptions, export_edition_with};
use crate::render::preview::{encode_asset, preview, preview_random};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug, Clone)]
#[command(name = "traitmint")]
#[command(
    author,
    version,
    about = "Generate unique trait combinations from weighted image layers"
)]
/// Command-line arguments for the collection engine
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress progress output and informational logs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Maximum log level for the chosen verbosity
    pub const fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::WARN
        } else {
            Level::INFO
        }
    }
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Scan a layer directory and print or save the collection document
    Scan {
        /// Collection source and canvas size
        #[command(flatten)]
        source: SourceArgs,

        /// Write the collection document here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate an edition of unique combinations and export it
    Generate(GenerateArgs),

    /// Render one combination and print it as a data URL
    Preview(PreviewArgs),

    /// Print an existing image file as a data URL
    Encode {
        /// Image file to encode
        file: PathBuf,
    },
}

/// Where the collection comes from
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Layer directory or saved collection document
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Canvas width in pixels
    #[arg(short = 'W', long)]
    pub width: Option<u32>,

    /// Canvas height in pixels
    #[arg(short = 'H', long)]
    pub height: Option<u32>,
}

/// Arguments of the `generate` subcommand
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Collection source and canvas size
    #[command(flatten)]
    pub source: SourceArgs,

    /// Number of unique combinations to produce
    #[arg(short = 'n', long)]
    pub count: usize,

    /// Random seed for reproducible editions
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Run directory for images and metadata
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Handling of layer assets that do not match the canvas
    #[arg(short, long, value_enum, default_value_t = ResizePolicy::Exact)]
    pub resize: ResizePolicy,

    /// Export worker threads (defaults to one per CPU)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Stop exporting after the first failed item
    #[arg(long)]
    pub fail_fast: bool,

    /// Consecutive duplicate draws tolerated per draw expected to find a new combination
    #[arg(long, default_value_t = DEFAULT_RETRY_FACTOR)]
    pub retry_factor: u64,
}

/// Arguments of the `preview` subcommand
#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    /// Collection source and canvas size
    #[command(flatten)]
    pub source: SourceArgs,

    /// Explicit choice per category; repeat for several categories
    #[arg(short, long = "choose", value_name = "CATEGORY=LAYER")]
    pub choose: Vec<Choice>,

    /// Random seed when no choices are given
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Handling of layer assets that do not match the canvas
    #[arg(short, long, value_enum, default_value_t = ResizePolicy::Exact)]
    pub resize: ResizePolicy,
}

/// Install the stderr log subscriber for the chosen verbosity
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init_logging(cli: &Cli) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| invalid_parameter("logging", &"global subscriber", &e))
}

/// Runs one subcommand against the local filesystem with progress tracking
pub struct CollectionProcessor {
    cli: Cli,
    storage: FileSystem,
    progress_manager: Option<ProgressManager>,
}

impl CollectionProcessor {
    /// Create a new processor with the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = cli.should_show_progress().then(ProgressManager::new);

        Self {
            cli,
            storage: FileSystem,
            progress_manager,
        }
    }

    /// Run the selected subcommand
    ///
    /// # Errors
    ///
    /// Returns the first error of the failing stage; for `generate`, the
    /// first failed item once the whole edition has been attempted
    pub fn process(&mut self) -> Result<()> {
        match self.cli.command.clone() {
            Command::Scan { source, output } => self.run_scan(&source, output.as_deref()),
            Command::Generate(args) => self.run_generate(&args),
            Command::Preview(args) => self.run_preview(&args),
            Command::Encode { file } => self.run_encode(&file),
        }
    }

    fn open(&self, source: &SourceArgs) -> Result<CollectionConfig> {
        open_collection(&self.storage, &source.source, source.width, source.height)
    }

    // Allow print for the collection document when no output file is given
    #[allow(clippy::print_stdout)]
    fn run_scan(&self, source: &SourceArgs, output: Option<&Path>) -> Result<()> {
        let config = self.open(source)?;

        if let Some(output) = output {
            save_collection(&self.storage, output, &config)?;
            info!(path = %output.display(), "collection saved");
        } else {
            println!("{}", config.to_json()?);
        }
        Ok(())
    }

    fn run_generate(&mut self, args: &GenerateArgs) -> Result<()> {
        let config = self.open(&args.source)?;
        let policy = RetryPolicy {
            retry_factor: args.retry_factor,
            ..RetryPolicy::default()
        };
        let generator = CombinationGenerator::new(&config, policy)?;
        let mut rng = rng_from_seed(args.seed);
        let cancel = CancellationToken::new();

        if let Some(ref mut pm) = self.progress_manager {
            pm.start_stage("generate", args.count);
        }
        let progress = self.progress_manager.as_ref();
        let edition = generator.generate_with(args.count, &mut rng, &cancel, |accepted| {
            if let Some(pm) = progress {
                pm.set_position(accepted);
            }
        })?;

        if let Some(ref mut pm) = self.progress_manager {
            pm.start_stage("export", edition.len());
        }
        let options = ExportOptions {
            resize: args.resize,
            threads: args.threads,
            fail_fast: args.fail_fast,
        };
        let progress = self.progress_manager.as_ref();
        let summary = export_edition_with(
            &self.storage,
            &config,
            &edition,
            &args.output,
            &options,
            &cancel,
            |_| {
                if let Some(pm) = progress {
                    pm.inc();
                }
            },
        )?;

        if let Some(ref mut pm) = self.progress_manager {
            pm.finish();
        }

        info!(
            output = %args.output.display(),
            written = summary.succeeded(),
            failed = summary.failed.len(),
            "run complete"
        );
        summary
            .failed
            .into_iter()
            .next()
            .map_or(Ok(()), |first| Err(first.error))
    }

    // Allow print for the data URL, which is the command's output
    #[allow(clippy::print_stdout)]
    fn run_preview(&self, args: &PreviewArgs) -> Result<()> {
        let config = self.open(&args.source)?;

        let url = if args.choose.is_empty() {
            let mut rng = rng_from_seed(args.seed);
            preview_random(&self.storage, &config, args.resize, &mut rng)?
        } else {
            preview(&self.storage, &config, &args.choose, args.resize)?
        };
        println!("{url}");
        Ok(())
    }

    // Allow print for the data URL, which is the command's output
    #[allow(clippy::print_stdout)]
    fn run_encode(&self, file: &Path) -> Result<()> {
        println!("{}", encode_asset(&self.storage, file)?);
        Ok(())
    }
}
