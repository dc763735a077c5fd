//! # Prometheus Metrics
//!
//! Operational metrics for the node, scraped at `/metrics` on the metrics
//! port. Everything lives in a dedicated [`prometheus::Registry`] with the
//! `msgboard` prefix.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use msgboard_contracts::{BoardEvent, Outcome, Receipt};

#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    pub blocks_produced_total: IntCounter,
    /// Transactions handed to the ledger, including nonce rejections.
    pub transactions_submitted_total: IntCounter,
    /// Included transactions whose call succeeded.
    pub transactions_committed_total: IntCounter,
    /// Rejections, labelled by board error code or `bad_nonce`.
    pub transactions_rejected_total: IntCounterVec,
    /// Successful board actions by kind (post, reply, edit, ...).
    pub board_actions_total: IntCounterVec,
    pub block_height: IntGauge,
    pub contract_balance: IntGauge,
    pub total_messages: IntGauge,
    pub transaction_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("msgboard".into()), None)?;

        let blocks_produced_total =
            IntCounter::new("blocks_produced_total", "Total number of blocks produced")?;
        registry.register(Box::new(blocks_produced_total.clone()))?;

        let transactions_submitted_total = IntCounter::new(
            "transactions_submitted_total",
            "Total number of transactions submitted to the ledger",
        )?;
        registry.register(Box::new(transactions_submitted_total.clone()))?;

        let transactions_committed_total = IntCounter::new(
            "transactions_committed_total",
            "Total number of included transactions whose call succeeded",
        )?;
        registry.register(Box::new(transactions_committed_total.clone()))?;

        let transactions_rejected_total = IntCounterVec::new(
            Opts::new(
                "transactions_rejected_total",
                "Total number of rejected transactions by reason",
            ),
            &["code"],
        )?;
        registry.register(Box::new(transactions_rejected_total.clone()))?;

        let board_actions_total = IntCounterVec::new(
            Opts::new("board_actions_total", "Successful board actions by kind"),
            &["action"],
        )?;
        registry.register(Box::new(board_actions_total.clone()))?;

        let block_height = IntGauge::new("block_height", "Current ledger block height")?;
        registry.register(Box::new(block_height.clone()))?;

        let contract_balance =
            IntGauge::new("contract_balance", "Fees currently held by the board")?;
        registry.register(Box::new(contract_balance.clone()))?;

        let total_messages =
            IntGauge::new("total_messages", "Posts and replies ever created")?;
        registry.register(Box::new(total_messages.clone()))?;

        let transaction_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "transaction_latency_seconds",
                "Ledger submit latency in seconds, journaling included",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
        )?;
        registry.register(Box::new(transaction_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            blocks_produced_total,
            transactions_submitted_total,
            transactions_committed_total,
            transactions_rejected_total,
            board_actions_total,
            block_height,
            contract_balance,
            total_messages,
            transaction_latency_seconds,
        })
    }

    /// Updates counters from an included transaction's receipt.
    pub fn observe_receipt(&self, receipt: &Receipt) {
        match receipt.outcome {
            Outcome::Ok(_) => self.transactions_committed_total.inc(),
            Outcome::Err { code } => self
                .transactions_rejected_total
                .with_label_values(&[&code.to_string()])
                .inc(),
        }
        for event in &receipt.events {
            if let Some(action) = action_label(event) {
                self.board_actions_total.with_label_values(&[action]).inc();
            }
        }
    }

    pub fn observe_bad_nonce(&self) {
        self.transactions_rejected_total
            .with_label_values(&["bad_nonce"])
            .inc();
    }

    /// Encodes all registered metrics into the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

fn action_label(event: &BoardEvent) -> Option<&'static str> {
    match event {
        BoardEvent::MessagePosted { .. } => Some("post"),
        BoardEvent::ReplyPosted { .. } => Some("reply"),
        BoardEvent::MessageEdited { .. } => Some("edit"),
        BoardEvent::MessagePinned { .. } => Some("pin"),
        BoardEvent::ReactionAdded { .. } => Some("react"),
        BoardEvent::MessageDeleted { .. } => Some("delete"),
        _ => None,
    }
}

pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgboard_contracts::CallOutput;

    fn receipt(outcome: Outcome, events: Vec<BoardEvent>) -> Receipt {
        Receipt {
            tx_id: "00".into(),
            sender: "alice".into(),
            nonce: 0,
            height: 1,
            call: "post-message".into(),
            outcome,
            events,
        }
    }

    #[test]
    fn receipts_feed_counters() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.observe_receipt(&receipt(
            Outcome::Ok(CallOutput::MessageId(0)),
            vec![BoardEvent::MessagePosted {
                message_id: 0,
                author: "alice".into(),
                fee: 10_000,
                expires_at: 145,
            }],
        ));
        metrics.observe_receipt(&receipt(Outcome::Err { code: 106 }, vec![]));
        metrics.observe_bad_nonce();

        assert_eq!(metrics.transactions_committed_total.get(), 1);
        assert_eq!(
            metrics
                .transactions_rejected_total
                .with_label_values(&["106"])
                .get(),
            1
        );
        assert_eq!(
            metrics.board_actions_total.with_label_values(&["post"]).get(),
            1
        );

        let text = metrics.encode().unwrap();
        assert!(text.contains("msgboard_transactions_rejected_total{code=\"bad_nonce\"} 1"));
    }
}
