//! Prometheus metrics for the Coinvic node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`]; the HTTP `/metrics`
//! endpoint encodes it into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

use crate::NodeError;

/// Node-level counters, gauges and the cycle duration histogram.
pub struct NodeMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    pub blocks_produced: IntCounter,
    pub intents_submitted: IntCounter,
    /// Intents refused at submission.
    pub intents_rejected: IntCounter,
    pub intents_applied: IntCounter,
    /// Intents consumed by a block without moving value.
    pub intents_skipped: IntCounter,
    /// Production cycles that failed and committed nothing.
    pub cycles_failed: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub chain_height: IntGauge,
    pub pending_intents: IntGauge,
    pub account_count: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    pub cycle_duration_ms: Histogram,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, NodeError> {
    register_int_counter_with_registry!(Opts::new(name, help), registry)
        .map_err(|e| NodeError::Other(format!("failed to register {name}: {e}")))
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<IntGauge, NodeError> {
    register_int_gauge_with_registry!(Opts::new(name, help), registry)
        .map_err(|e| NodeError::Other(format!("failed to register {name}: {e}")))
}

impl NodeMetrics {
    /// Create a fresh set of metrics under a new [`Registry`].
    pub fn new() -> Result<Self, NodeError> {
        let registry = Registry::new();

        let blocks_produced = counter(
            &registry,
            "coinvic_blocks_produced_total",
            "Total blocks produced and committed",
        )?;
        let intents_submitted = counter(
            &registry,
            "coinvic_intents_submitted_total",
            "Total intents accepted at submission",
        )?;
        let intents_rejected = counter(
            &registry,
            "coinvic_intents_rejected_total",
            "Total intents rejected at submission",
        )?;
        let intents_applied = counter(
            &registry,
            "coinvic_intents_applied_total",
            "Total intents applied to the master ledger",
        )?;
        let intents_skipped = counter(
            &registry,
            "coinvic_intents_skipped_total",
            "Total intents dropped at application",
        )?;
        let cycles_failed = counter(
            &registry,
            "coinvic_production_cycles_failed_total",
            "Total production cycles aborted without commit",
        )?;

        let chain_height = gauge(&registry, "coinvic_chain_height", "Latest committed block number")?;
        let pending_intents = gauge(
            &registry,
            "coinvic_pending_intents",
            "Unprocessed intents waiting for the next block",
        )?;
        let account_count = gauge(
            &registry,
            "coinvic_account_count",
            "Accounts in the master ledger",
        )?;

        // 1 ms to ~16 s.
        let buckets = prometheus::exponential_buckets(1.0, 2.0, 15)
            .map_err(|e| NodeError::Other(e.to_string()))?;
        let cycle_duration_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "coinvic_production_cycle_ms",
                "Duration of block production cycles in milliseconds"
            )
            .buckets(buckets),
            registry
        )
        .map_err(|e| NodeError::Other(format!("failed to register cycle histogram: {e}")))?;

        Ok(Self {
            registry,
            blocks_produced,
            intents_submitted,
            intents_rejected,
            intents_applied,
            intents_skipped,
            cycles_failed,
            chain_height,
            pending_intents,
            account_count,
            cycle_duration_ms,
        })
    }

    /// Encode every registered metric in the Prometheus text format.
    pub fn encode_text(&self) -> Result<String, NodeError> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|e| NodeError::Other(format!("metrics encoding failed: {e}")))?;
        String::from_utf8(buf).map_err(|e| NodeError::Other(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_increment() {
        let metrics = NodeMetrics::new().unwrap();
        assert_eq!(metrics.blocks_produced.get(), 0);
        metrics.blocks_produced.inc();
        metrics.intents_applied.inc_by(3);
        assert_eq!(metrics.blocks_produced.get(), 1);
        assert_eq!(metrics.intents_applied.get(), 3);
    }

    #[test]
    fn text_encoding_contains_metric_names() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.chain_height.set(7);
        metrics.cycle_duration_ms.observe(12.0);
        let text = metrics.encode_text().unwrap();
        assert!(text.contains("coinvic_chain_height 7"));
        assert!(text.contains("coinvic_production_cycle_ms_count 1"));
        assert!(text.contains("coinvic_intents_skipped_total 0"));
    }

    #[test]
    fn separate_instances_do_not_collide() {
        let a = NodeMetrics::new().unwrap();
        let b = NodeMetrics::new().unwrap();
        a.intents_submitted.inc();
        assert_eq!(b.intents_submitted.get(), 0);
    }
}
