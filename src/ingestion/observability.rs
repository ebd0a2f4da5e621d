//! Hooks for watching path-based ingestion.
//!
//! [`super::ingest_from_path`] reports every attempt to an optional [`IngestionObserver`]: a
//! success with row and column counts, or a failure ranked by [`IngestionSeverity`]. Failures at
//! or above the configured threshold are reported a second time through `on_alert`.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::IngestionError;

use super::unified::IngestionFormat;

/// How bad a failed ingestion is. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    Info,
    Warning,
    /// The input itself was rejected (no header, bad delimiter, malformed record).
    Error,
    /// The input could not be read at all.
    Critical,
}

impl IngestionSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for IngestionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What was being ingested.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    pub path: PathBuf,
    pub format: IngestionFormat,
    /// Field delimiter actually used.
    pub delimiter: u8,
}

/// Shape of a successfully ingested table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    pub rows: usize,
    pub columns: usize,
}

/// Receives ingestion outcomes. All methods default to doing nothing.
pub trait IngestionObserver: Send + Sync {
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// A failure that reached the alert threshold. Forwards to `on_failure` unless overridden.
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Forwards every callback to each of its observers, in insertion order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }

    pub fn push(&mut self, observer: Arc<dyn IngestionObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl FromIterator<Arc<dyn IngestionObserver>> for CompositeObserver {
    fn from_iter<I: IntoIterator<Item = Arc<dyn IngestionObserver>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.observers.iter().for_each(|o| o.on_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.observers.iter().for_each(|o| o.on_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.observers.iter().for_each(|o| o.on_alert(ctx, severity, error));
    }
}

/// Logs outcomes through `tracing` under the `ingest` target: successes at info, failures at
/// warn and alerts at error.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        info!(
            target: "ingest",
            path = %ctx.path.display(),
            format = ?ctx.format,
            delimiter = %char::from(ctx.delimiter).escape_default(),
            rows = stats.rows,
            columns = stats.columns,
            "table loaded"
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        warn!(target: "ingest", path = %ctx.path.display(), %severity, %error, "table not loaded");
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        error!(target: "ingest", path = %ctx.path.display(), %severity, %error, "ingestion alert");
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use super::{
        CompositeObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    };
    use crate::error::IngestionError;
    use crate::ingestion::IngestionFormat;

    #[derive(Default)]
    struct Counter {
        seen: Mutex<Vec<&'static str>>,
    }

    impl IngestionObserver for Counter {
        fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {
            self.seen.lock().unwrap().push("success");
        }

        fn on_failure(&self, _ctx: &IngestionContext, _s: IngestionSeverity, _e: &IngestionError) {
            self.seen.lock().unwrap().push("failure");
        }
    }

    #[test]
    fn composite_fans_out_and_alert_defaults_to_failure() {
        let a = Arc::new(Counter::default());
        let b = Arc::new(Counter::default());
        let observers: [Arc<dyn IngestionObserver>; 2] = [a.clone(), b.clone()];
        let composite: CompositeObserver = observers.into_iter().collect();
        assert_eq!(composite.len(), 2);

        let ctx = IngestionContext {
            path: PathBuf::from("t.csv"),
            format: IngestionFormat::Csv,
            delimiter: b',',
        };
        composite.on_success(&ctx, IngestionStats { rows: 1, columns: 1 });
        composite.on_alert(&ctx, IngestionSeverity::Critical, &IngestionError::MissingHeader);

        assert_eq!(*a.seen.lock().unwrap(), vec!["success", "failure"]);
        assert_eq!(*b.seen.lock().unwrap(), vec!["success", "failure"]);
    }

    #[test]
    fn severities_are_ordered() {
        assert!(IngestionSeverity::Critical > IngestionSeverity::Error);
        assert!(IngestionSeverity::Error > IngestionSeverity::Warning);
        assert_eq!(IngestionSeverity::Critical.to_string(), "critical");
    }
}
