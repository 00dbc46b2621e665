/// Command-line parsing and subcommand orchestration
pub mod cli;
/// Engine constants and defaults
pub mod configuration;
/// Error types and result alias
pub mod error;
/// Terminal progress bars for generation and export
pub mod progress;
/// Filesystem access behind a substitutable trait
pub mod storage;
