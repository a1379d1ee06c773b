use crate::config::MAX_TOLERANCE_MS;
use crate::core::classifier::DEFAULT_TOLERANCE_MS;
use crate::core::sample::DEFAULT_SAMPLE_LINES;
use crate::core::{ConfigProvider, EdgePolicy};
use crate::utils::error::{DemuxError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_DEBUG_FILE: &str = "test-data.txt";

/// Run file alternative to the command line flags.
///
/// ```toml
/// [input]
/// data_file = "src.txt"
/// intervals_file = "intervals.txt"
///
/// [output]
/// path = "./out"
///
/// [classification]
/// tolerance_ms = 150
/// edge_policy = "exact"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub classification: Option<ClassificationConfig>,
    pub run: Option<RunConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub data_file: String,
    pub intervals_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub debug_file: Option<String>,
    pub sample_lines: Option<usize>,
    pub summary_json: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationConfig {
    pub tolerance_ms: Option<u64>,
    pub edge_policy: Option<EdgePolicy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    pub test_mode: Option<bool>,
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DemuxError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DemuxError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are
    /// left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DemuxError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Command line switches win over the file; they can only turn things on.
    #[cfg(feature = "cli")]
    pub fn apply_cli_overrides(&mut self, cli: &crate::config::CliConfig) {
        let run = self.run.get_or_insert_with(RunConfig::default);
        if cli.test {
            run.test_mode = Some(true);
        }
        if cli.verbose {
            run.verbose = Some(true);
        }
        if cli.monitor {
            self.monitoring = Some(MonitoringConfig { enabled: true });
        }
        if self.output.summary_json.is_none() {
            self.output.summary_json = cli.summary_json.clone();
        }
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn summary_json(&self) -> Option<&str> {
        self.output.summary_json.as_deref()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("input.data_file", &self.input.data_file)?;
        validation::validate_path("input.intervals_file", &self.input.intervals_file)?;
        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_file_name("output.debug_file", self.debug_file())?;
        validation::validate_range(
            "classification.tolerance_ms",
            self.tolerance_ms(),
            0,
            MAX_TOLERANCE_MS,
        )?;
        if let Some(path) = self.summary_json() {
            validation::validate_path("output.summary_json", path)?;
        }
        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn data_file(&self) -> &str {
        &self.input.data_file
    }

    fn intervals_file(&self) -> &str {
        &self.input.intervals_file
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn debug_file(&self) -> &str {
        self.output.debug_file.as_deref().unwrap_or(DEFAULT_DEBUG_FILE)
    }

    fn sample_lines(&self) -> usize {
        self.output.sample_lines.unwrap_or(DEFAULT_SAMPLE_LINES)
    }

    fn tolerance_ms(&self) -> u64 {
        self.classification
            .as_ref()
            .and_then(|c| c.tolerance_ms)
            .unwrap_or(DEFAULT_TOLERANCE_MS)
    }

    fn edge_policy(&self) -> EdgePolicy {
        self.classification
            .as_ref()
            .and_then(|c| c.edge_policy)
            .unwrap_or_default()
    }

    fn verbose(&self) -> bool {
        self.run.as_ref().and_then(|r| r.verbose).unwrap_or(false)
    }

    fn test_mode(&self) -> bool {
        self.run.as_ref().and_then(|r| r.test_mode).unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
