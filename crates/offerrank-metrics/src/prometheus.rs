//! Prometheus text exposition format.
//!
//! Renders the ranking metrics sink for scraping by a Prometheus server
//! or compatible agent. Rendering reads the logs without draining them.

use std::fmt::Write;

use crate::collector::{PluginFailureKind, RankingMetrics, RankingPath, compute_percentiles};

const PATHS: [RankingPath; 3] = [
    RankingPath::Plugin,
    RankingPath::LocalFallback,
    RankingPath::Identity,
];

const FAILURE_KINDS: [PluginFailureKind; 3] = [
    PluginFailureKind::Transport,
    PluginFailureKind::Decode,
    PluginFailureKind::PluginReported,
];

/// Render the ranking metrics into Prometheus text format.
pub fn render_prometheus(metrics: &RankingMetrics) -> String {
    let mut out = String::new();

    out.push_str("# HELP offerrank_rounds_total Scheduling rounds served, by ranking path.\n");
    out.push_str("# TYPE offerrank_rounds_total counter\n");
    for path in PATHS {
        let _ = writeln!(
            out,
            "offerrank_rounds_total{{path=\"{}\"}} {}",
            path,
            metrics.rounds(path)
        );
    }

    out.push_str("# HELP offerrank_plugin_failures_total Failed ranking plugin exchanges, by kind.\n");
    out.push_str("# TYPE offerrank_plugin_failures_total counter\n");
    for kind in FAILURE_KINDS {
        let _ = writeln!(
            out,
            "offerrank_plugin_failures_total{{kind=\"{}\"}} {}",
            kind,
            metrics.plugin_failures(kind)
        );
    }

    let diffs = metrics.diff_scores().snapshot();
    out.push_str("# HELP offerrank_diff_scores_recorded Reconciliations recorded in the diff log.\n");
    out.push_str("# TYPE offerrank_diff_scores_recorded gauge\n");
    let _ = writeln!(out, "offerrank_diff_scores_recorded {}", diffs.len());

    out.push_str("# HELP offerrank_diff_score_last Most recent plugin/scheduler diff score.\n");
    out.push_str("# TYPE offerrank_diff_score_last gauge\n");
    let _ = writeln!(
        out,
        "offerrank_diff_score_last {}",
        diffs.last().copied().unwrap_or(0)
    );

    let (p50, p99) = compute_percentiles(&metrics.plugin_latency_ms().snapshot());
    out.push_str("# HELP offerrank_plugin_latency_ms Ranking plugin call latency in milliseconds.\n");
    out.push_str("# TYPE offerrank_plugin_latency_ms summary\n");
    let _ = writeln!(out, "offerrank_plugin_latency_ms{{quantile=\"0.5\"}} {p50:.2}");
    let _ = writeln!(out, "offerrank_plugin_latency_ms{{quantile=\"0.99\"}} {p99:.2}");

    out
}
