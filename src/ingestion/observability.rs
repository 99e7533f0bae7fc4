//! Ingestion outcome reporting.
//!
//! [`super::file_reader`] reports every attempt to an optional [`IngestionObserver`]. Failures
//! whose severity reaches the configured threshold are additionally raised as alerts.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::TableError;

use super::unified::IngestionFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    Info,
    /// Non-fatal event.
    Warning,
    /// The ingestion failed on its input (parse, schema, inference).
    Error,
    /// The ingestion failed on infrastructure, typically I/O.
    Critical,
}

impl IngestionSeverity {
    /// Severity of an ingestion failure: I/O problems are critical, everything else is an error.
    pub fn of(error: &TableError) -> Self {
        match error {
            TableError::Io(_) => IngestionSeverity::Critical,
            TableError::Csv(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        }
    }
}

/// Context about an ingestion attempt.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    pub path: PathBuf,
    pub format: IngestionFormat,
}

/// Stats reported on successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Number of tables produced (one per sheet for spreadsheets).
    pub tables: usize,
    /// Total rows across all produced tables.
    pub rows: usize,
}

/// Observer interface for ingestion outcomes.
pub trait IngestionObserver: Send + Sync {
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &TableError) {}

    /// Called when a failure meets the alert threshold. Forwards to [`Self::on_failure`] unless
    /// overridden.
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &TableError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Fans callbacks out to a list of observers, in order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &TableError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &TableError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Emits ingestion events as `tracing` events under the `tablekit::ingest` target.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        tracing::info!(
            target: "tablekit::ingest",
            format = ?ctx.format,
            path = %ctx.path.display(),
            tables = stats.tables,
            rows = stats.rows,
            "ingestion succeeded"
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &TableError) {
        tracing::warn!(
            target: "tablekit::ingest",
            ?severity,
            format = ?ctx.format,
            path = %ctx.path.display(),
            %error,
            "ingestion failed"
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &TableError) {
        tracing::error!(
            target: "tablekit::ingest",
            ?severity,
            format = ?ctx.format,
            path = %ctx.path.display(),
            %error,
            "ingestion alert"
        );
    }
}

/// Appends ingestion events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Writes are best-effort; failures to open or write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.append_line(&format!(
            "{} ok format={:?} path={} tables={} rows={}",
            unix_ts(),
            ctx.format,
            ctx.path.display(),
            stats.tables,
            stats.rows
        ));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &TableError) {
        self.append_line(&format!(
            "{} fail severity={:?} format={:?} path={} err={}",
            unix_ts(),
            severity,
            ctx.format,
            ctx.path.display(),
            error
        ));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &TableError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} format={:?} path={} err={}",
            unix_ts(),
            severity,
            ctx.format,
            ctx.path.display(),
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::IngestionSeverity;
    use crate::error::TableError;

    #[test]
    fn io_errors_are_critical() {
        let io = TableError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(IngestionSeverity::of(&io), IngestionSeverity::Critical);
        let schema = TableError::SchemaMismatch {
            message: "bad".to_string(),
        };
        assert_eq!(IngestionSeverity::of(&schema), IngestionSeverity::Error);
        assert!(IngestionSeverity::Critical > IngestionSeverity::Error);
    }
}
