use anyhow::Context;
use clap::Parser;
use interval_demux::core::ConfigProvider;
use interval_demux::utils::{logger, validation::Validate};
use interval_demux::{
    CliConfig, DemuxEngine, DemuxError, DemuxPipeline, LocalStorage, RunSummary, TomlConfig,
};

fn main() {
    let cli = CliConfig::parse();

    let toml_config = match cli.config.as_deref() {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(mut config) => {
                config.apply_cli_overrides(&cli);
                Some(config)
            }
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(2);
            }
        },
        None => None,
    };

    let verbose = toml_config
        .as_ref()
        .map(|c| c.verbose())
        .unwrap_or(cli.verbose);
    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    let exit_code = match toml_config {
        Some(config) => {
            let monitor = config.monitoring_enabled();
            let summary_json = config.summary_json().map(str::to_string);
            execute(config, monitor, summary_json.as_deref())
        }
        None => {
            let monitor = cli.monitor;
            let summary_json = cli.summary_json.clone();
            execute(cli, monitor, summary_json.as_deref())
        }
    };
    std::process::exit(exit_code);
}

fn execute<C>(config: C, monitor: bool, summary_json: Option<&str>) -> i32
where
    C: ConfigProvider + Validate + std::fmt::Debug,
{
    tracing::info!("Started...");
    tracing::info!("intervals file: {}", config.intervals_file());
    tracing::info!("input file: {}", config.data_file());
    tracing::info!("output path: {}", config.output_path());
    tracing::info!("testing: {}", config.test_mode());
    tracing::info!(
        "tolerance: {}ms, edge policy: {}",
        config.tolerance_ms(),
        config.edge_policy()
    );
    tracing::debug!("config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        return report_failure(&e);
    }

    let storage = LocalStorage::new(config.output_path());
    let pipeline = DemuxPipeline::new(storage, config);
    let mut engine = DemuxEngine::new_with_monitoring(pipeline, monitor);

    match engine.run() {
        Ok(summary) => {
            println!();
            println!("{}", summary);
            if let Some(path) = summary_json {
                if let Err(e) = write_summary_json(path, &summary) {
                    tracing::error!("❌ {:#}", e);
                    eprintln!("❌ {:#}", e);
                    return 3;
                }
                tracing::info!("📁 Summary saved to: {}", path);
            }
            0
        }
        Err(e) => report_failure(&e),
    }
}

fn report_failure(e: &DemuxError) -> i32 {
    tracing::error!(
        "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    e.exit_code().max(1)
}

fn write_summary_json(path: &str, summary: &RunSummary) -> anyhow::Result<()> {
    let json = summary.to_json().context("serializing run summary")?;
    std::fs::write(path, json).with_context(|| format!("writing summary to '{}'", path))?;
    Ok(())
}
