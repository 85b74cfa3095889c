//! Ranking metrics sink: diff scores, plugin latency, path counters.
//!
//! Append-only logs sit behind a `std::sync::Mutex` whose critical
//! section is a single `Vec` push or copy; counters are plain atomics.
//! One `RankingMetrics` is created at process start and shared by every
//! scheduling round through an `Arc`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

/// Thread-safe, append-only sequence of observations.
///
/// Values are never rewritten once appended. The only way to shrink the
/// log is [`ObservationLog::drain`], used by the exporter that publishes
/// the values.
#[derive(Debug, Default)]
pub struct ObservationLog {
    values: Mutex<Vec<u64>>,
}

/// The per-reconciliation diff score sequence.
pub type DiffLog = ObservationLog;

impl ObservationLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> MutexGuard<'_, Vec<u64>> {
        // A panic while pushing cannot leave the Vec half-written.
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a value and return its position in the log.
    pub fn append(&self, value: u64) -> usize {
        let mut values = self.values();
        values.push(value);
        values.len() - 1
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    /// Value at `index`, if it has been appended.
    pub fn get(&self, index: usize) -> Option<u64> {
        self.values().get(index).copied()
    }

    pub fn last(&self) -> Option<u64> {
        self.values().last().copied()
    }

    /// Copy of every value appended so far.
    pub fn snapshot(&self) -> Vec<u64> {
        self.values().clone()
    }

    /// Take every value appended so far, leaving the log empty.
    pub fn drain(&self) -> Vec<u64> {
        let drained = std::mem::take(&mut *self.values());
        debug!(count = drained.len(), "observation log drained");
        drained
    }
}

/// Which path produced the ordering handed to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingPath {
    /// Reconciled ranking-plugin response.
    Plugin,
    /// Local starting-task heuristic.
    LocalFallback,
    /// Snapshot order, unchanged.
    Identity,
}

impl RankingPath {
    pub fn as_str(self) -> &'static str {
        match self {
            RankingPath::Plugin => "plugin",
            RankingPath::LocalFallback => "local_fallback",
            RankingPath::Identity => "identity",
        }
    }
}

impl fmt::Display for RankingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a failed ranking-plugin exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginFailureKind {
    /// Connection, timeout or non-2xx status.
    Transport,
    /// Body did not decode into the expected shape.
    Decode,
    /// Plugin answered with a non-empty `error`.
    PluginReported,
}

impl PluginFailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PluginFailureKind::Transport => "transport",
            PluginFailureKind::Decode => "decode",
            PluginFailureKind::PluginReported => "plugin_reported",
        }
    }
}

impl fmt::Display for PluginFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the ranking engine publishes about itself.
#[derive(Debug, Default)]
pub struct RankingMetrics {
    diff_scores: DiffLog,
    plugin_latency_ms: ObservationLog,
    plugin_rounds: AtomicU64,
    fallback_rounds: AtomicU64,
    identity_rounds: AtomicU64,
    transport_failures: AtomicU64,
    decode_failures: AtomicU64,
    plugin_reported_failures: AtomicU64,
}

impl RankingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-reconciliation diff scores, in call order.
    pub fn diff_scores(&self) -> &DiffLog {
        &self.diff_scores
    }

    /// Wall-clock latency of every completed plugin call, in milliseconds.
    pub fn plugin_latency_ms(&self) -> &ObservationLog {
        &self.plugin_latency_ms
    }

    pub fn record_plugin_latency(&self, millis: u64) {
        self.plugin_latency_ms.append(millis);
    }

    pub fn record_path(&self, path: RankingPath) {
        self.path_counter(path).fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_plugin_failure(&self, kind: PluginFailureKind) {
        self.failure_counter(kind).fetch_add(1, Ordering::Relaxed);
    }

    /// Number of rounds served by `path`.
    pub fn rounds(&self, path: RankingPath) -> u64 {
        self.path_counter(path).load(Ordering::Relaxed)
    }

    /// Number of plugin failures of `kind`.
    pub fn plugin_failures(&self, kind: PluginFailureKind) -> u64 {
        self.failure_counter(kind).load(Ordering::Relaxed)
    }

    fn path_counter(&self, path: RankingPath) -> &AtomicU64 {
        match path {
            RankingPath::Plugin => &self.plugin_rounds,
            RankingPath::LocalFallback => &self.fallback_rounds,
            RankingPath::Identity => &self.identity_rounds,
        }
    }

    fn failure_counter(&self, kind: PluginFailureKind) -> &AtomicU64 {
        match kind {
            PluginFailureKind::Transport => &self.transport_failures,
            PluginFailureKind::Decode => &self.decode_failures,
            PluginFailureKind::PluginReported => &self.plugin_reported_failures,
        }
    }
}

/// Compute P50 and P99 from a list of samples.
///
/// Returns (p50, p99) in the samples' unit. If empty, returns (0.0, 0.0).
pub fn compute_percentiles(samples: &[u64]) -> (f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }

    let mut sorted = samples.to_vec();
    sorted.sort_unstable();

    let p50_idx = (sorted.len() as f64 * 0.50) as usize;
    let p99_idx = (sorted.len() as f64 * 0.99) as usize;

    let p50 = sorted[p50_idx.min(sorted.len() - 1)] as f64;
    let p99 = sorted[p99_idx.min(sorted.len() - 1)] as f64;

    (p50, p99)
}
