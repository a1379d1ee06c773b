use crate::core::registry::IntervalRegistry;
use crate::domain::model::{ClassificationEvent, IntervalCounters};
use crate::domain::ports::Storage;
use crate::utils::error::{DemuxError, Result};
use std::collections::BTreeMap;
use std::io::Write;

struct Destination<W: Write> {
    file_name: String,
    writer: csv::Writer<W>,
    counters: IntervalCounters,
}

/// Per-interval output files and their bucket counters.
///
/// Every routed event is written and flushed immediately.
pub struct RoutingSink<W: Write> {
    destinations: BTreeMap<String, Destination<W>>,
}

impl<W: Write> RoutingSink<W> {
    /// Creates one destination per registered interval. Any failure aborts the
    /// whole load; destinations already created are dropped (and closed).
    pub fn open<S>(registry: &IntervalRegistry, storage: &S) -> Result<Self>
    where
        S: Storage<Writer = W>,
    {
        let mut destinations = BTreeMap::new();
        for range in registry.ranges() {
            let file_name = range.file_name();
            let output = storage
                .create_output(&file_name)
                .map_err(|source| DemuxError::DestinationError {
                    path: file_name.clone(),
                    source,
                })?;
            tracing::debug!("📁 {} -> {}", range.id, file_name);

            let writer = csv::WriterBuilder::new()
                .has_headers(false)
                .terminator(csv::Terminator::Any(b'\n'))
                .from_writer(output);
            destinations.insert(
                range.id.clone(),
                Destination {
                    file_name,
                    writer,
                    counters: IntervalCounters::default(),
                },
            );
        }
        Ok(Self { destinations })
    }

    pub fn route(&mut self, event: &ClassificationEvent) -> Result<()> {
        let destination = self
            .destinations
            .get_mut(&event.interval_id)
            .ok_or_else(|| DemuxError::ProcessingError {
                message: format!("no destination for interval '{}'", event.interval_id),
            })?;

        destination.writer.write_record(&event.fields())?;
        destination.writer.flush()?;
        destination.counters.record(event.bucket);
        Ok(())
    }

    pub fn counters(&self, interval_id: &str) -> Option<IntervalCounters> {
        self.destinations.get(interval_id).map(|d| d.counters)
    }

    pub fn file_name(&self, interval_id: &str) -> Option<&str> {
        self.destinations
            .get(interval_id)
            .map(|d| d.file_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    /// Flushes and releases every destination.
    pub fn close(mut self) -> Result<()> {
        for destination in self.destinations.values_mut() {
            destination.writer.flush()?;
        }
        Ok(())
    }
}
