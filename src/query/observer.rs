use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{InvalidAnswer, TransformError};
use crate::transform::Transformation;

/// Which answer of a transformation a round collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStage {
    Transformation,
    TargetColumn,
    Argument,
    FreeText,
}

/// Events emitted by the query builder during a pass.
#[derive(Debug, Clone)]
pub enum QueryEvent {
    PassStarted { tokens: usize },
    RoundAsked {
        round: usize,
        stage: RoundStage,
        choices: usize,
        live: bool,
    },
    AnswerRejected {
        round: usize,
        stage: RoundStage,
        reason: InvalidAnswer,
    },
    TransformationRejected { error: TransformError },
    TransformationCommitted { transformation: Transformation },
    PassFinished {
        elapsed: Duration,
        metrics: QueryMetricsSnapshot,
    },
}

/// Observer hook for query events.
pub trait QueryObserver: Send + Sync {
    fn on_event(&self, event: &QueryEvent);
}

/// Forwards query events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingQueryObserver;

impl QueryObserver for TracingQueryObserver {
    fn on_event(&self, event: &QueryEvent) {
        match event {
            QueryEvent::PassStarted { tokens } => debug!(target: "query", tokens, "pass started"),
            QueryEvent::RoundAsked {
                round,
                stage,
                choices,
                live,
            } => debug!(target: "query", round, ?stage, choices, live, "round asked"),
            QueryEvent::AnswerRejected { round, stage, reason } => {
                warn!(target: "query", round, ?stage, %reason, "answer rejected")
            }
            QueryEvent::TransformationRejected { error } => {
                warn!(target: "query", %error, "transformation rejected")
            }
            QueryEvent::TransformationCommitted { transformation } => {
                debug!(target: "query", %transformation, "transformation committed")
            }
            QueryEvent::PassFinished { elapsed, metrics } => {
                info!(target: "query", ?elapsed, %metrics, "pass finished")
            }
        }
    }
}

/// Counters for the current pass.
///
/// The builder resets these at the start of every pass; callers can snapshot them at any time.
pub struct QueryMetrics {
    pass_id: AtomicU64,
    elapsed_ns: AtomicU64,

    rounds: AtomicU64,
    live_rounds: AtomicU64,
    diagnostics: AtomicU64,
    committed: AtomicU64,
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self {
            pass_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            rounds: AtomicU64::new(0),
            live_rounds: AtomicU64::new(0),
            diagnostics: AtomicU64::new(0),
            committed: AtomicU64::new(0),
        }
    }

    pub fn begin_pass(&self) {
        let _ = self.pass_id.fetch_add(1, Ordering::SeqCst);
        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.rounds.store(0, Ordering::SeqCst);
        self.live_rounds.store(0, Ordering::SeqCst);
        self.diagnostics.store(0, Ordering::SeqCst);
        self.committed.store(0, Ordering::SeqCst);
    }

    pub fn end_pass(&self, elapsed: Duration) {
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    pub fn on_round(&self, live: bool) {
        let _ = self.rounds.fetch_add(1, Ordering::SeqCst);
        if live {
            let _ = self.live_rounds.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn on_diagnostic(&self) {
        let _ = self.diagnostics.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_commit(&self) {
        let _ = self.committed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> QueryMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        QueryMetricsSnapshot {
            pass_id: self.pass_id.load(Ordering::SeqCst),
            elapsed: (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns)),
            rounds: self.rounds.load(Ordering::SeqCst),
            live_rounds: self.live_rounds.load(Ordering::SeqCst),
            diagnostics: self.diagnostics.load(Ordering::SeqCst),
            committed: self.committed.load(Ordering::SeqCst),
        }
    }
}

impl Default for QueryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable snapshot of [`QueryMetrics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMetricsSnapshot {
    pub pass_id: u64,
    pub elapsed: Option<Duration>,
    pub rounds: u64,
    /// Rounds answered by a round-trip to the responder.
    pub live_rounds: u64,
    pub diagnostics: u64,
    pub committed: u64,
}

impl fmt::Display for QueryMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pass_id={}, rounds={}, live_rounds={}, diagnostics={}, committed={}, elapsed={:?}",
            self.pass_id, self.rounds, self.live_rounds, self.diagnostics, self.committed, self.elapsed
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::QueryMetrics;

    #[test]
    fn begin_pass_resets_counters() {
        let m = QueryMetrics::new();
        m.begin_pass();
        m.on_round(false);
        m.on_round(true);
        m.on_diagnostic();
        m.on_commit();
        m.end_pass(Duration::from_millis(3));

        let s = m.snapshot();
        assert_eq!((s.pass_id, s.rounds, s.live_rounds, s.diagnostics, s.committed), (1, 2, 1, 1, 1));
        assert_eq!(s.elapsed, Some(Duration::from_millis(3)));

        m.begin_pass();
        let s = m.snapshot();
        assert_eq!((s.pass_id, s.rounds, s.elapsed), (2, 0, None));
    }
}
