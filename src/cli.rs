//! Command-line interface components.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "workorder-etl")]
#[command(about = "Consolidate work order CSV exports into one normalized table")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Directory containing the source CSV files (prompted for if omitted)
    #[arg(value_name = "SOURCE_DIR")]
    pub source_dir: Option<PathBuf>,

    /// Directory where the CSV and SQLite outputs are written
    #[arg(short, long, value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Equipment master reference file
    #[arg(long, value_name = "FILE")]
    pub equipment_master: Option<PathBuf>,

    /// Technical locations reference file
    #[arg(long = "locations", value_name = "FILE")]
    pub technical_locations: Option<PathBuf>,

    /// Exit without waiting for Enter
    #[arg(long)]
    pub no_pause: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Default log level for the crate when `RUST_LOG` is unset
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }
}

/// Interactive path prompts standing in for file pickers
pub mod prompts {
    use anyhow::{Context, Result};
    use colored::*;
    use std::io::{self, BufRead, Write};
    use std::path::PathBuf;

    /// Ask for a path on stdin; an empty answer is `None`
    pub fn prompt_path(label: &str) -> Result<Option<PathBuf>> {
        let stdin = io::stdin();
        prompt_path_from(&mut stdin.lock(), label)
    }

    /// Ask for a path, reading the answer from `input`
    pub fn prompt_path_from(input: &mut impl BufRead, label: &str) -> Result<Option<PathBuf>> {
        print!("{} ", format!("{}:", label).bright_white());
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut answer = String::new();
        input
            .read_line(&mut answer)
            .context("Failed to read user input")?;
        Ok(parse_path(&answer))
    }

    /// Wait for the user to press Enter
    pub fn wait_for_enter() -> Result<()> {
        print!("\n{}", "Press Enter to exit...".bright_black());
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        io::stdin()
            .read_line(&mut input)
            .context("Failed to read user input")?;
        Ok(())
    }

    /// Trim an answer, dropping surrounding quotes left by drag-and-drop
    fn parse_path(answer: &str) -> Option<PathBuf> {
        let trimmed = answer.trim().trim_matches(|c: char| c == '"' || c == '\'');
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

}
