use crate::domain::model::TimeRange;
use crate::utils::error::{DemuxError, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;

/// Interval timestamps: `dd-mm-yyyy HH:MM:SS`, seconds optional.
const WITH_SECONDS: &str = "%d-%m-%Y %H:%M:%S";
const WITHOUT_SECONDS: &str = "%d-%m-%Y %H:%M";

/// An interval definition line that was logged and left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedInterval {
    pub line: u64,
    pub reason: String,
}

/// Named time ranges loaded once from the intervals file.
///
/// Ids are kept in a `BTreeMap`, so iteration is lexicographic by id. A
/// duplicate id replaces the earlier definition.
#[derive(Debug, Default)]
pub struct IntervalRegistry {
    ranges: BTreeMap<String, TimeRange>,
    skipped: Vec<SkippedInterval>,
}

impl IntervalRegistry {
    pub fn load(raw: &str) -> Result<Self> {
        Self::from_reader(raw.as_bytes())
    }

    /// Reads `id,start,end` lines. `#` lines and single-field lines are
    /// ignored; malformed lines are logged and skipped. Quotes are plain
    /// characters and fields are not trimmed, so each record is one line
    /// taken verbatim.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut registry = Self::default();
        for row in csv_reader.byte_records() {
            let row = row?;
            if row.len() < 2 {
                continue;
            }
            let line = row.position().map(|p| p.line()).unwrap_or(0);

            let parsed = csv::StringRecord::from_byte_record(row)
                .map_err(|e| DemuxError::IntervalLineError {
                    line,
                    message: format!("not valid UTF-8: {}", e.utf8_error()),
                })
                .and_then(|row| parse_interval(line, &row));

            match parsed {
                Ok(range) => {
                    tracing::debug!(
                        "interval {}: {} -> {}",
                        range.id,
                        range.start,
                        range.end
                    );
                    if let Some(previous) = registry.ranges.insert(range.id.clone(), range) {
                        tracing::warn!(
                            "⚠️ Interval '{}' defined again on line {}, replacing the earlier definition",
                            previous.id,
                            line
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!("⚠️ Skipping interval: {}", e);
                    if let DemuxError::IntervalLineError { line, message } = e {
                        registry.skipped.push(SkippedInterval {
                            line,
                            reason: message,
                        });
                    }
                }
            }
        }

        Ok(registry)
    }

    pub fn get(&self, id: &str) -> Option<&TimeRange> {
        self.ranges.get(id)
    }

    /// Ids in lexicographic order; only used for reporting.
    pub fn sorted_ids(&self) -> impl Iterator<Item = &str> {
        self.ranges.keys().map(String::as_str)
    }

    pub fn ranges(&self) -> impl Iterator<Item = &TimeRange> {
        self.ranges.values()
    }

    pub fn skipped(&self) -> &[SkippedInterval] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

fn parse_interval(line: u64, row: &csv::StringRecord) -> Result<TimeRange> {
    let malformed = |message: String| DemuxError::IntervalLineError { line, message };

    let id = row.get(0).unwrap_or_default();
    if id.is_empty() {
        return Err(malformed("empty interval id".to_string()));
    }
    let (start_text, end_text) = match (row.get(1), row.get(2)) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(malformed(format!(
                "interval '{}' needs both a start and an end timestamp",
                id
            )))
        }
    };

    let start = parse_interval_timestamp(start_text)
        .map_err(|e| malformed(format!("interval '{}' start '{}': {}", id, start_text, e)))?;
    let end = parse_interval_timestamp(end_text)
        .map_err(|e| malformed(format!("interval '{}' end '{}': {}", id, end_text, e)))?;

    if start >= end {
        return Err(malformed(format!(
            "interval '{}' starts at {} which is not before its end {}",
            id, start, end
        )));
    }

    Ok(TimeRange {
        id: id.to_string(),
        start,
        end,
    })
}

pub fn parse_interval_timestamp(
    text: &str,
) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text, WITH_SECONDS)
        .or_else(|_| NaiveDateTime::parse_from_str(text, WITHOUT_SECONDS))
}
