//! Structured run logging
//!
//! Wraps the `tracing` events a report run emits so every event carries the
//! same `run_id` and `event` fields. The subscriber (plain or JSON) is
//! installed by the binary.

use crate::coordinator::RunFailure;
use tracing::{error, info, warn};

/// Structured logger for one report run
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    run_id: String,
}

impl StructuredLogger {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
        }
    }

    /// Logger keyed by the current UTC time
    pub fn for_now() -> Self {
        Self::new(chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string())
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Log run start
    pub fn log_run_started(&self, instances: usize) {
        info!(
            event = "run_started",
            run_id = %self.run_id,
            instances = instances,
            "Capacity report run started"
        );
    }

    /// Log the start of one Prism Central instance
    pub fn log_instance_started(&self, address: &str, position: usize, total: usize) {
        info!(
            event = "instance_started",
            run_id = %self.run_id,
            address = %address,
            position = position,
            total = total,
            "Polling Prism Central instance"
        );
    }

    /// Log the inventory size of an instance
    pub fn log_inventory(&self, address: &str, addressable_clusters: usize, listed: usize) {
        if addressable_clusters == 0 {
            warn!(
                event = "inventory_loaded",
                run_id = %self.run_id,
                address = %address,
                addressable_clusters = addressable_clusters,
                listed = listed,
                "Prism Central lists no addressable clusters"
            );
        } else {
            info!(
                event = "inventory_loaded",
                run_id = %self.run_id,
                address = %address,
                addressable_clusters = addressable_clusters,
                listed = listed,
                "Cluster inventory loaded"
            );
        }
    }

    /// Log one cluster's RF2 result
    pub fn log_rf2(&self, cluster: &str, address: &str, percent: u32) {
        info!(
            event = "rf2_computed",
            run_id = %self.run_id,
            cluster = %cluster,
            address = %address,
            rf2_percent = percent,
            "RF2 storage utilization computed"
        );
    }

    /// Log instance completion
    pub fn log_instance_completed(&self, address: &str, rows: usize) {
        info!(
            event = "instance_completed",
            run_id = %self.run_id,
            address = %address,
            rows = rows,
            "Prism Central instance complete"
        );
    }

    /// Log a failed run; every accumulated row is discarded
    pub fn log_run_failed(&self, failure: &RunFailure, discarded_rows: usize) {
        error!(
            event = "run_failed",
            run_id = %self.run_id,
            address = %failure.address,
            stage = %failure.stage,
            cluster = ?failure.cluster,
            error_kind = failure.source.kind(),
            error = %failure.source,
            discarded_rows = discarded_rows,
            "Capacity report run failed, no report will be written"
        );
    }

    /// Log a successful run
    pub fn log_run_completed(&self, instances: usize, rows: usize) {
        info!(
            event = "run_completed",
            run_id = %self.run_id,
            instances = instances,
            rows = rows,
            "Capacity report run complete"
        );
    }
}
