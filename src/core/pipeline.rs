use crate::core::classifier::BoundaryClassifier;
use crate::core::inspect::{column_ruler, TEST_MODE_LINES, VERBOSE_RULER_LINES};
use crate::core::parser::RecordParser;
use crate::core::registry::IntervalRegistry;
use crate::core::sample::DebugSampler;
use crate::core::sink::RoutingSink;
use crate::core::summary::{InputStats, RunSummary};
use crate::domain::ports::{ConfigProvider, Storage};
use crate::utils::error::{DemuxError, Result};
use chrono::{DateTime, Local, NaiveDate};
use std::fmt;
use std::io::{BufRead, Write};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Load,
    Ingest,
    Report,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Load => "Load",
            RunPhase::Ingest => "Ingest",
            RunPhase::Report => "Report",
        };
        f.write_str(name)
    }
}

/// Everything the load phase opens. Dropping it closes every file, which is
/// what happens when ingestion stops on a fatal error.
pub struct LoadedRun<W: Write> {
    pub registry: IntervalRegistry,
    pub sink: RoutingSink<W>,
    pub sampler: DebugSampler<W>,
}

pub struct DemuxPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    parser: RecordParser,
    classifier: BoundaryClassifier,
}

impl<S: Storage, C: ConfigProvider> DemuxPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        let classifier = BoundaryClassifier::new(config.tolerance_ms(), config.edge_policy());
        Self {
            storage,
            config,
            parser: RecordParser::new(),
            classifier,
        }
    }

    /// Reads the intervals and creates every output file plus the debug file.
    pub fn load(&self) -> Result<LoadedRun<S::Writer>> {
        let intervals_path = self.config.intervals_file();
        let reader = self
            .storage
            .open_input(intervals_path)
            .map_err(|source| DemuxError::OpenInputError {
                role: "intervals file".to_string(),
                path: intervals_path.to_string(),
                source,
            })?;
        let registry = IntervalRegistry::from_reader(reader)?;

        if registry.is_empty() {
            tracing::warn!("⚠️ No usable intervals in {}, nothing will be written", intervals_path);
        }
        for skipped in registry.skipped() {
            tracing::debug!("skipped interval line {}", skipped.line);
        }

        let sink = RoutingSink::open(&registry, &self.storage)?;

        let debug_file = self.config.debug_file();
        let debug_output = self
            .storage
            .create_output(debug_file)
            .map_err(|source| DemuxError::DestinationError {
                path: debug_file.to_string(),
                source,
            })?;
        let sampler = DebugSampler::new(debug_output, self.config.sample_lines());

        Ok(LoadedRun {
            registry,
            sink,
            sampler,
        })
    }

    /// Streams the data file through the classifier into the sink.
    ///
    /// Line 1 is the header. The first malformed data line stops the run.
    pub fn ingest(&self, run: &mut LoadedRun<S::Writer>) -> Result<InputStats> {
        let data_path = self.config.data_file();
        let input = self
            .storage
            .open_input(data_path)
            .map_err(|source| DemuxError::OpenInputError {
                role: "input data file".to_string(),
                path: data_path.to_string(),
                source,
            })?;

        if self.config.test_mode() {
            return inspect_lines(input, TEST_MODE_LINES);
        }

        let mut stats = InputStats::default();
        let mut current_day: Option<NaiveDate> = None;

        for (index, line) in input.lines().enumerate() {
            let line = line?;
            let line_number = index as u64 + 1;
            stats.total_lines = line_number;

            if self.config.verbose() && line_number <= VERBOSE_RULER_LINES {
                tracing::debug!("index: {}\n{}", line_number, column_ruler(&line));
            }

            // 第一行為表頭
            if line_number == 1 {
                tracing::info!("Skip line: {} {}", line_number, line);
                run.sampler.write_header(&line)?;
                continue;
            }

            let record = self
                .parser
                .parse(&line)
                .map_err(|e| e.at_line(line_number))?;

            let day = record.timestamp.date();
            if current_day != Some(day) {
                tracing::info!("processing: {}", day.format("%d-%m-%Y"));
                current_day = Some(day);
            }

            if stats.first_entry.is_none() {
                stats.first_entry = Some(line.clone());
            }
            run.sampler.sample(line_number, &line, &record)?;

            for event in self.classifier.classify(record, run.registry.ranges()) {
                run.sink.route(&event)?;
                if self.config.verbose() {
                    tracing::debug!(
                        "found for interval: {} line: {} bucket: {} counters: {}",
                        event.interval_id,
                        line_number,
                        event.bucket,
                        run.sink.counters(&event.interval_id).unwrap_or_default()
                    );
                }
            }

            stats.last_entry = Some(line);
        }

        Ok(stats)
    }

    /// Collects the counters and closes every destination.
    pub fn report(
        &self,
        run: LoadedRun<S::Writer>,
        input: InputStats,
        started_at: DateTime<Local>,
        elapsed: Duration,
    ) -> Result<RunSummary> {
        let summary = RunSummary::summarize(&run.registry, &run.sink, input, started_at, elapsed);
        run.sink.close()?;
        Ok(summary)
    }
}

/// Test mode: print a column ruler for the first `limit` lines and stop.
fn inspect_lines<R: BufRead>(input: R, limit: u64) -> Result<InputStats> {
    let mut stats = InputStats::default();
    for (index, line) in input.lines().enumerate() {
        let line_number = index as u64 + 1;
        if line_number > limit {
            break;
        }
        let line = line?;
        println!("index: {}", line_number);
        println!("{}", column_ruler(&line));
        stats.total_lines = line_number;
    }
    Ok(stats)
}
