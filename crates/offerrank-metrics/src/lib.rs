//! offerrank-metrics: observability values computed by the ranking engine.
//!
//! The engine only computes these values; publishing them is left to
//! whoever scrapes or drains the sink.
//!
//! # Architecture
//!
//! ```text
//! RankingMetrics
//!   ├── diff_scores()        ← one entry per reconciliation (append-only)
//!   ├── plugin_latency_ms()  ← one entry per completed plugin call
//!   └── path / failure counters (atomics)
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for a /metrics endpoint
//! ```

pub mod collector;
pub mod prometheus;

pub use collector::{
    DiffLog, ObservationLog, PluginFailureKind, RankingMetrics, RankingPath, compute_percentiles,
};
pub use prometheus::render_prometheus;
