use crate::domain::model::Record;
use crate::utils::error::{DemuxError, Result};
use chrono::NaiveDateTime;
use std::ops::Range;

/// Input timestamps look like `31/12/2024 23:59:59.75`.
pub const INPUT_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S%.f";

pub const TIMESTAMP_COLUMNS: Range<usize> = 1..23;
pub const FREQUENCY_COLUMNS: Range<usize> = 25..34;
/// Power runs from this offset to the end of the line.
pub const POWER_OFFSET: usize = 35;

/// Fixed-width decoder for one data line.
///
/// Fields are sliced by byte offset, never split on a delimiter. A line that
/// is too short or whose offsets do not fall on character boundaries is
/// rejected the same way as an unparsable value.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordParser;

impl RecordParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, line: &str) -> Result<Record> {
        let timestamp_text = slice(line, "timestamp", TIMESTAMP_COLUMNS)?;
        let frequency_text = slice(line, "frequency", FREQUENCY_COLUMNS)?;
        let power_text = slice(line, "power", POWER_OFFSET..line.len())?;

        let timestamp = NaiveDateTime::parse_from_str(timestamp_text, INPUT_TIMESTAMP_FORMAT)
            .map_err(|e| DemuxError::record("timestamp", timestamp_text, e.to_string()))?;
        let frequency = parse_number("frequency", frequency_text)?;
        let power = parse_number("power", power_text)?;

        Ok(Record {
            timestamp,
            frequency,
            power,
        })
    }
}

fn slice<'a>(line: &'a str, field: &str, columns: Range<usize>) -> Result<&'a str> {
    let (start, end) = (columns.start, columns.end);
    line.get(columns).ok_or_else(|| {
        DemuxError::record(
            field,
            line,
            format!(
                "line is {} bytes, expected bytes {}..{} to hold this field",
                line.len(),
                start,
                end
            ),
        )
    })
}

fn parse_number(field: &str, text: &str) -> Result<f64> {
    let trimmed = text.trim();
    trimmed
        .parse::<f64>()
        .map_err(|e| DemuxError::record(field, trimmed, e.to_string()))
}
