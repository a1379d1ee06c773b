pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use core::{
    classifier::BoundaryClassifier, engine::DemuxEngine, parser::RecordParser,
    pipeline::DemuxPipeline, registry::IntervalRegistry, sink::RoutingSink, summary::RunSummary,
};
pub use utils::error::{DemuxError, Result};
