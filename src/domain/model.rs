use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Renders `yyyy-mm-dd HH:MM:SS.ss`; sub-centisecond digits are truncated.
pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    let centis = (timestamp.nanosecond() % 1_000_000_000) / 10_000_000;
    format!("{}.{:02}", timestamp.format("%Y-%m-%d %H:%M:%S"), centis)
}

/// A named time span that owns one output destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    /// Output file name, e.g. `(A) 01-01-2024 10.00-10.05.txt`.
    pub fn file_name(&self) -> String {
        format!(
            "({}) {}-{}.txt",
            self.id,
            self.start.format("%d-%m-%Y %H.%M"),
            self.end.format("%H.%M")
        )
    }
}

/// One parsed measurement line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: NaiveDateTime,
    pub frequency: f64,
    pub power: f64,
}

impl Record {
    /// `timestamp,frequency,power` with the record's own timestamp.
    pub fn to_line(&self) -> String {
        format_measurement(self.timestamp, self.frequency, self.power).join(",")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bucket {
    StartEdge,
    Interior,
    EndEdge,
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Bucket::StartEdge => "start-edge",
            Bucket::Interior => "interior",
            Bucket::EndEdge => "end-edge",
        };
        f.write_str(name)
    }
}

/// What the classifier decided for one record against one interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationEvent {
    pub interval_id: String,
    pub bucket: Bucket,
    pub emitted_timestamp: NaiveDateTime,
    pub frequency: f64,
    pub power: f64,
}

impl ClassificationEvent {
    /// Output columns: timestamp, frequency (4 decimals), power (3 decimals).
    pub fn fields(&self) -> [String; 3] {
        format_measurement(self.emitted_timestamp, self.frequency, self.power)
    }

    pub fn to_line(&self) -> String {
        self.fields().join(",")
    }
}

fn format_measurement(timestamp: NaiveDateTime, frequency: f64, power: f64) -> [String; 3] {
    [
        format_timestamp(timestamp),
        format!("{:.4}", frequency),
        format!("{:.3}", power),
    ]
}

/// Per-interval bucket counters. Only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalCounters {
    pub start_edge: u64,
    pub interior: u64,
    pub end_edge: u64,
}

impl IntervalCounters {
    pub fn record(&mut self, bucket: Bucket) {
        match bucket {
            Bucket::StartEdge => self.start_edge += 1,
            Bucket::Interior => self.interior += 1,
            Bucket::EndEdge => self.end_edge += 1,
        }
    }

    pub fn get(&self, bucket: Bucket) -> u64 {
        match bucket {
            Bucket::StartEdge => self.start_edge,
            Bucket::Interior => self.interior,
            Bucket::EndEdge => self.end_edge,
        }
    }

    pub fn total(&self) -> u64 {
        self.start_edge + self.interior + self.end_edge
    }
}

impl fmt::Display for IntervalCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{} {} {}}}", self.start_edge, self.interior, self.end_edge)
    }
}

/// How records inside the tolerance band but outside the interval are treated.
///
/// `Exact` snaps to an edge only when the record sits exactly on it; records in
/// the band outside the interval produce nothing. `Band` also snaps those
/// records to the nearest edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum EdgePolicy {
    #[default]
    Exact,
    Band,
}

impl EdgePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgePolicy::Exact => "exact",
            EdgePolicy::Band => "band",
        }
    }
}

impl fmt::Display for EdgePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
