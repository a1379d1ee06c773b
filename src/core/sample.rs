use crate::domain::model::Record;
use crate::utils::error::Result;
use std::io::Write;

pub const DEFAULT_SAMPLE_LINES: usize = 20;

/// Writes the input header and the first few data lines, each followed by
/// its reformatted rendering, for eyeballing the column offsets.
pub struct DebugSampler<W: Write> {
    writer: W,
    limit: usize,
    written: usize,
}

impl<W: Write> DebugSampler<W> {
    /// `limit` is an input line number: data lines numbered up to and
    /// including it are sampled (the header is line 1).
    pub fn new(writer: W, limit: usize) -> Self {
        Self {
            writer,
            limit,
            written: 0,
        }
    }

    pub fn write_header(&mut self, header: &str) -> Result<()> {
        writeln!(self.writer, "{}", header)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn sample(&mut self, line_number: u64, raw: &str, record: &Record) -> Result<()> {
        if line_number > self.limit as u64 {
            return Ok(());
        }
        writeln!(self.writer, "{}", raw)?;
        writeln!(self.writer, "{}", record.to_line())?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Number of data lines sampled so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
