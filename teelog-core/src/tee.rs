use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use log::{Level, LevelFilter};

use crate::{
    encoder::{Record, encode},
    log_writer::LogWriter,
};

/// A named writer accepting records at or above `min_level`.
pub struct Destination {
    name: String,
    min_level: LevelFilter,
    writer: Mutex<Box<dyn LogWriter + Send>>,
}

impl Destination {
    pub fn new<W: LogWriter + Send + 'static>(
        name: &str,
        min_level: LevelFilter,
        writer: W,
    ) -> Self {
        Self {
            name: name.into(),
            min_level,
            writer: Mutex::new(Box::new(writer)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_level(&self) -> LevelFilter {
        self.min_level
    }

    pub fn accepts(&self, level: Level) -> bool {
        level <= self.min_level
    }
}

/// Fans each record out to every destination whose minimum level it meets.
///
/// Writes are best effort: failures are counted, never returned.
pub struct Tee {
    destinations: Vec<Destination>,
    write_errors: AtomicU64,
}

impl Tee {
    pub fn new(destinations: Vec<Destination>) -> Self {
        Self {
            destinations,
            write_errors: AtomicU64::new(0),
        }
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.destinations.iter().any(|d| d.accepts(level))
    }

    /// Most verbose level any destination accepts.
    pub fn max_level(&self) -> LevelFilter {
        self.destinations
            .iter()
            .map(Destination::min_level)
            .max()
            .unwrap_or(LevelFilter::Off)
    }

    pub fn write(&self, record: &Record) {
        if !self.enabled(record.level) {
            return;
        }
        let line = encode(record);
        for destination in self.destinations.iter().filter(|d| d.accepts(record.level)) {
            let mut writer = destination
                .writer
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if writer.write_line(&line).is_err() {
                self.write_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn flush(&self) {
        for destination in &self.destinations {
            let mut writer = destination
                .writer
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if writer.flush().is_err() {
                self.write_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Number of failed writes and flushes so far, plus background failures reported by
    /// the writers.
    pub fn write_errors(&self) -> u64 {
        let background: u64 = self
            .destinations
            .iter()
            .map(|destination| {
                destination
                    .writer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .background_errors()
            })
            .sum();
        self.write_errors.load(Ordering::Relaxed) + background
    }
}
