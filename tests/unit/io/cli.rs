//! Tests for command-line parsing and subcommand processing

#[cfg(test)]
mod tests {
    use crate::support::{BLUE, RED, SIZE, layer_tree};
    use clap::Parser;
    use std::ffi::{OsStr, OsString};
    use std::path::PathBuf;
    use tracing::Level;
    use traitmint::EngineError;
    use traitmint::algorithm::combination::Choice;
    use traitmint::catalog::model::load_collection;
    use traitmint::io::cli::{Cli, CollectionProcessor, Command};
    use traitmint::io::configuration::{DEFAULT_OUTPUT_DIR, DEFAULT_RETRY_FACTOR};
    use traitmint::io::storage::FileSystem;
    use traitmint::render::compositor::ResizePolicy;

    // Tests generate parsing with only required arguments
    // Verified by changing default values to ensure defaults are used
    #[test]
    fn test_parse_generate_defaults() {
        let cli = Cli::parse_from(["traitmint", "generate", "layers", "-n", "10"]);
        assert!(cli.should_show_progress());
        assert_eq!(cli.log_level(), Level::INFO);

        let Command::Generate(args) = cli.command else {
            unreachable!("Expected generate subcommand");
        };
        assert_eq!(args.source.source, PathBuf::from("layers"));
        assert_eq!(args.count, 10);
        assert_eq!(args.seed, None);
        assert_eq!(args.output, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(args.resize, ResizePolicy::Exact);
        assert_eq!(args.threads, None);
        assert!(!args.fail_fast);
        assert_eq!(args.retry_factor, DEFAULT_RETRY_FACTOR);
    }

    // Tests generate parsing with all available arguments
    // Verified by modifying custom parsers to ensure they're invoked
    #[test]
    fn test_parse_generate_all_args() {
        let cli = Cli::parse_from([
            "traitmint",
            "--quiet",
            "generate",
            "collection.json",
            "--count",
            "3",
            "--seed",
            "42",
            "--output",
            "run",
            "--resize",
            "fit",
            "--threads",
            "2",
            "--fail-fast",
            "--retry-factor",
            "7",
            "-W",
            "64",
            "-H",
            "32",
        ]);

        assert!(!cli.should_show_progress());
        assert_eq!(cli.log_level(), Level::WARN);
        let Command::Generate(args) = cli.command else {
            unreachable!("Expected generate subcommand");
        };
        assert_eq!(args.seed, Some(42));
        assert_eq!(args.output, PathBuf::from("run"));
        assert_eq!(args.resize, ResizePolicy::Fit);
        assert_eq!(args.threads, Some(2));
        assert!(args.fail_fast);
        assert_eq!(args.retry_factor, 7);
        assert_eq!((args.source.width, args.source.height), (Some(64), Some(32)));
    }

    // Tests repeated choices parse into explicit selections
    // Verified by keeping only the last choice
    #[test]
    fn test_parse_preview_choices() {
        let cli = Cli::parse_from([
            "traitmint",
            "preview",
            "layers",
            "--choose",
            "Background=red",
            "--choose",
            "Hat=none",
            "--verbose",
        ]);

        assert_eq!(cli.log_level(), Level::DEBUG);
        let Command::Preview(args) = cli.command else {
            unreachable!("Expected preview subcommand");
        };
        assert_eq!(
            args.choose,
            vec![Choice::layer("Background", "red"), Choice::absent("Hat")]
        );
    }

    // Tests malformed choices and missing counts are rejected
    // Verified by accepting choices without a separator
    #[test]
    fn test_parse_errors() {
        assert!(Cli::try_parse_from(["traitmint", "preview", "layers", "--choose", "Hat"]).is_err());
        assert!(Cli::try_parse_from(["traitmint", "generate", "layers"]).is_err());
        assert!(Cli::try_parse_from(["traitmint", "generate", "layers", "-n", "2", "--resize", "squash"]).is_err());
    }

    fn argv(parts: &[&dyn AsRef<OsStr>]) -> Vec<OsString> {
        parts.iter().map(|part| part.as_ref().to_os_string()).collect()
    }

    // Tests scan writes a collection document when given an output path
    // Verified by printing instead of saving
    #[test]
    fn test_process_scan_to_file() {
        let dir = layer_tree(&[("Background", &[("1_red.png", RED), ("1_blue.png", BLUE)])]);
        let document = dir.path().join("collection.json");
        let cli = Cli::parse_from(argv(&[
            &"traitmint",
            &"-q",
            &"scan",
            &dir.path(),
            &"-o",
            &document,
        ]));

        CollectionProcessor::new(cli).process().unwrap();

        let loaded = load_collection(&FileSystem, &document).unwrap();
        assert_eq!(loaded.categories[0].layers.len(), 2);
    }

    // Tests generate runs end to end and writes the run directory
    // Verified by skipping the export stage
    #[test]
    fn test_process_generate() {
        let dir = layer_tree(&[("Background", &[("1_red.png", RED), ("1_blue.png", BLUE)])]);
        let output = dir.path().join("run");
        let size = SIZE.to_string();
        let cli = Cli::parse_from(argv(&[
            &"traitmint",
            &"-q",
            &"generate",
            &dir.path(),
            &"-n",
            &"2",
            &"--seed",
            &"1",
            &"-W",
            &size,
            &"-H",
            &size,
            &"-o",
            &output,
        ]));

        CollectionProcessor::new(cli).process().unwrap();

        assert!(output.join("images").join("1.png").is_file());
        assert!(output.join("images").join("2.png").is_file());
        assert!(output.join("metadata").join("2.json").is_file());
        assert!(output.join("metadata.json").is_file());
    }

    // Tests generate surfaces the space check as an error
    // Verified by clamping the count to the space
    #[test]
    fn test_process_generate_too_many() {
        let dir = layer_tree(&[("Background", &[("1_red.png", RED)])]);
        let cli = Cli::parse_from(argv(&[&"traitmint", &"-q", &"generate", &dir.path(), &"-n", &"2"]));

        let err = CollectionProcessor::new(cli).process().unwrap_err();
        assert!(matches!(err, EngineError::InsufficientSpace { .. }));
    }
}
