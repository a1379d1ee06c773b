use crate::core::registry::{IntervalRegistry, SkippedInterval};
use crate::core::sink::RoutingSink;
use crate::domain::model::IntervalCounters;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntervalReport {
    pub id: String,
    pub file_name: String,
    pub counters: IntervalCounters,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InputStats {
    /// Every line read, header included.
    pub total_lines: u64,
    pub first_entry: Option<String>,
    pub last_entry: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub intervals: Vec<IntervalReport>,
    pub skipped_intervals: Vec<SkippedInterval>,
    pub input: InputStats,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    #[serde(serialize_with = "serialize_elapsed_ms")]
    pub elapsed: Duration,
}

impl RunSummary {
    /// Reads the final counters in registry id order.
    pub fn summarize<W: Write>(
        registry: &IntervalRegistry,
        sink: &RoutingSink<W>,
        input: InputStats,
        started_at: DateTime<Local>,
        elapsed: Duration,
    ) -> Self {
        let intervals = registry
            .sorted_ids()
            .filter_map(|id| {
                let counters = sink.counters(id)?;
                Some(IntervalReport {
                    id: id.to_string(),
                    file_name: sink.file_name(id)?.to_string(),
                    counters,
                    total: counters.total(),
                })
            })
            .collect();

        Self {
            intervals,
            skipped_intervals: registry.skipped().to_vec(),
            input,
            started_at,
            finished_at: Local::now(),
            elapsed,
        }
    }

    pub fn total_events(&self) -> u64 {
        self.intervals.iter().map(|i| i.total).sum()
    }

    pub fn interval(&self, id: &str) -> Option<&IntervalReport> {
        self.intervals.iter().find(|i| i.id == id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.intervals {
            writeln!(
                f,
                "id: {} file name: {} lines: {} total: {}",
                report.id, report.file_name, report.counters, report.total
            )?;
        }
        for skipped in &self.skipped_intervals {
            writeln!(f, "skipped interval line {}: {}", skipped.line, skipped.reason)?;
        }
        writeln!(f)?;
        writeln!(f, "total lines: {}", self.input.total_lines)?;
        writeln!(
            f,
            "first entry: {}",
            self.input.first_entry.as_deref().unwrap_or("")
        )?;
        writeln!(
            f,
            "last entry : {}",
            self.input.last_entry.as_deref().unwrap_or("")
        )?;
        writeln!(f)?;
        writeln!(f, "START: {}", self.started_at.format("%H:%M:%S"))?;
        writeln!(f, "END:   {}", self.finished_at.format("%H:%M:%S"))?;
        write!(f, "DURATION: {:?}", self.elapsed)
    }
}

fn serialize_elapsed_ms<S: serde::Serializer>(
    elapsed: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_micros() as f64 / 1000.0)
}
