//! CLI entry point for the weighted generative collection engine

use clap::Parser;
use traitmint::io::cli::{Cli, CollectionProcessor, init_logging};

fn main() -> traitmint::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;
    let mut processor = CollectionProcessor::new(cli);
    processor.process()
}
