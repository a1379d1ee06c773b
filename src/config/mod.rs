pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::classifier::DEFAULT_TOLERANCE_MS;
#[cfg(feature = "cli")]
use crate::core::{ConfigProvider, EdgePolicy};
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

/// Longest tolerance band accepted from configuration.
pub const MAX_TOLERANCE_MS: u64 = 60_000;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "interval-demux")]
#[command(about = "Split timestamped frequency/power readings into one file per time interval")]
pub struct CliConfig {
    /// Fixed-width input data file (line 1 is a header)
    #[arg(long, default_value = "src.txt")]
    pub filein: String,

    /// Interval definitions: id,dd-mm-yyyy HH:MM[:SS],dd-mm-yyyy HH:MM[:SS]
    #[arg(long, default_value = "intervals.txt")]
    pub intervals: String,

    /// Directory for the per-interval files and the debug file
    #[arg(long, default_value = ".")]
    pub output_path: String,

    #[arg(long, default_value = "test-data.txt")]
    pub debug_file: String,

    /// Data lines up to this input line number are copied to the debug file
    #[arg(long, default_value_t = crate::core::sample::DEFAULT_SAMPLE_LINES)]
    pub sample_lines: usize,

    #[arg(long, default_value_t = DEFAULT_TOLERANCE_MS)]
    pub tolerance_ms: u64,

    /// `band` also snaps records inside the tolerance band onto the edge
    #[arg(long, value_enum, default_value_t = EdgePolicy::Exact)]
    pub edge_policy: EdgePolicy,

    /// Print column rulers for the first lines of the input and stop
    #[arg(long)]
    pub test: bool,

    #[arg(long, alias = "showinfo", help = "Enable verbose output")]
    pub verbose: bool,

    /// Log CPU/memory usage after each phase
    #[arg(long)]
    pub monitor: bool,

    /// Optional TOML run file; --test, --verbose and --monitor still apply
    #[arg(long)]
    pub config: Option<String>,

    /// Also write the run summary as JSON to this path
    #[arg(long)]
    pub summary_json: Option<String>,

    #[arg(long)]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn data_file(&self) -> &str {
        &self.filein
    }

    fn intervals_file(&self) -> &str {
        &self.intervals
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn debug_file(&self) -> &str {
        &self.debug_file
    }

    fn sample_lines(&self) -> usize {
        self.sample_lines
    }

    fn tolerance_ms(&self) -> u64 {
        self.tolerance_ms
    }

    fn edge_policy(&self) -> EdgePolicy {
        self.edge_policy
    }

    fn verbose(&self) -> bool {
        self.verbose
    }

    fn test_mode(&self) -> bool {
        self.test
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("filein", &self.filein)?;
        validation::validate_path("intervals", &self.intervals)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_file_name("debug_file", &self.debug_file)?;
        validation::validate_range("tolerance_ms", self.tolerance_ms, 0, MAX_TOLERANCE_MS)?;
        if let Some(path) = &self.summary_json {
            validation::validate_path("summary_json", path)?;
        }
        Ok(())
    }
}
