use crate::core::pipeline::{DemuxPipeline, RunPhase};
use crate::core::summary::RunSummary;
use crate::domain::ports::{ConfigProvider, Storage};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use chrono::Local;
use std::time::Instant;

/// Runs Load, Ingest and Report once, in that order. The first fatal error
/// ends the run; files opened so far are closed on the way out.
pub struct DemuxEngine<S: Storage, C: ConfigProvider> {
    pipeline: DemuxPipeline<S, C>,
    monitor: SystemMonitor,
}

impl<S: Storage, C: ConfigProvider> DemuxEngine<S, C> {
    pub fn new(pipeline: DemuxPipeline<S, C>) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: DemuxPipeline<S, C>, monitor_enabled: bool) -> Self {
        let monitor = SystemMonitor::new(monitor_enabled);
        if monitor.is_enabled() {
            tracing::info!("🔍 System monitoring enabled");
        }
        Self { pipeline, monitor }
    }

    pub fn run(&mut self) -> Result<RunSummary> {
        let started_at = Local::now();
        let clock = Instant::now();
        tracing::info!("🚀 Starting interval demux");
        self.monitor.log_stats("Start");

        let phase = RunPhase::Load;
        tracing::info!("📂 {} phase: reading intervals", phase);
        let mut run = self
            .pipeline
            .load()
            .inspect_err(|e| tracing::error!("❌ {} phase failed: {}", phase, e))?;
        tracing::info!(
            "Loaded {} intervals ({} skipped), {} output files",
            run.registry.len(),
            run.registry.skipped().len(),
            run.sink.len()
        );
        self.monitor.log_stats("Load");

        let phase = RunPhase::Ingest;
        tracing::info!("🔄 {} phase: routing records", phase);
        let input = self
            .pipeline
            .ingest(&mut run)
            .inspect_err(|e| tracing::error!("❌ {} phase failed: {}", phase, e))?;
        tracing::info!(
            "Read {} lines, sampled {} into the debug file",
            input.total_lines,
            run.sampler.written()
        );
        self.monitor.log_stats("Ingest");

        let phase = RunPhase::Report;
        tracing::info!("📊 {} phase", phase);
        let summary = self
            .pipeline
            .report(run, input, started_at, clock.elapsed())
            .inspect_err(|e| tracing::error!("❌ {} phase failed: {}", phase, e))?;
        self.monitor.log_final_stats();

        Ok(summary)
    }
}
