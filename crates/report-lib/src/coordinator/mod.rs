//! Run coordination across Prism Central instances
//!
//! Instances are polled one at a time. Each moves through
//! `Pending -> Fetching -> Assembling -> Done`; the first error anywhere
//! moves the whole run to `Failed`, drops every row collected so far and
//! skips the export sink.

use crate::assembler::{assemble, reported_clusters, InstanceMetrics};
use crate::client::PrismApi;
use crate::decoder::{decode_series, MetricSeries};
use crate::directory::{ClusterDirectory, ClusterListRequest};
use crate::error::{ReportError, ReportResult};
use crate::fetcher::fetch_metric;
use crate::models::{ClusterReportRow, MetricKind, TargetInstance};
use crate::observability::StructuredLogger;
use crate::storage;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;


/// Tunables for a report run
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Averaging window requested from the groups API, in seconds
    pub downsampling_interval_secs: u64,
    /// Page length requested from the cluster inventory
    pub inventory_length: u32,
    /// Pause between per-cluster storage queries
    pub cluster_delay: Duration,
    /// Pause between Prism Central instances
    pub instance_delay: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            downsampling_interval_secs: 300,
            inventory_length: 500,
            cluster_delay: Duration::from_millis(250),
            instance_delay: Duration::from_millis(100),
        }
    }
}

/// Per-instance progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStage {
    Pending,
    Fetching,
    Assembling,
    Done,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStage::Pending => "pending",
            RunStage::Fetching => "fetching",
            RunStage::Assembling => "assembling",
            RunStage::Done => "done",
        };
        f.write_str(s)
    }
}

/// Whole-run state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Done,
    Failed,
}

/// Why a run stopped: where it happened and the underlying error
#[derive(Debug, Error)]
#[error("{stage} {address}{}: {source}", cluster_suffix(.cluster))]
pub struct RunFailure {
    /// Prism Central instance being polled
    pub address: String,
    /// Stage the instance was in
    pub stage: RunStage,
    /// Cluster being processed, for per-cluster steps
    pub cluster: Option<String>,
    #[source]
    pub source: ReportError,
}

fn cluster_suffix(cluster: &Option<String>) -> String {
    cluster
        .as_deref()
        .map(|c| format!(" (cluster {})", c))
        .unwrap_or_default()
}

/// Export collaborator. Called once, and only for a fully successful run.
pub trait ReportSink {
    fn export(&mut self, rows: &[ClusterReportRow]) -> anyhow::Result<()>;
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub instances: usize,
    pub rows: Vec<ClusterReportRow>,
}

/// Rows accumulated so far, owned by the run and threaded through each instance
#[derive(Debug, Default)]
pub struct ReportBuilder {
    rows: Vec<ClusterReportRow>,
    instances: usize,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one completed instance's rows
    pub fn with_instance(mut self, rows: Vec<ClusterReportRow>) -> Self {
        self.rows.extend(rows);
        self.instances += 1;
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn finish(self) -> RunSummary {
        RunSummary {
            instances: self.instances,
            rows: self.rows,
        }
    }
}

/// Drives the pipeline across every configured instance
pub struct RunCoordinator<'a> {
    api: &'a dyn PrismApi,
    config: PollerConfig,
    logger: StructuredLogger,
    state: RunState,
}

impl<'a> RunCoordinator<'a> {
    pub fn new(api: &'a dyn PrismApi, config: PollerConfig, logger: StructuredLogger) -> Self {
        Self {
            api,
            config,
            logger,
            state: RunState::Running,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Poll every target and hand the rows to `sink` if, and only if, all succeed
    pub async fn run(
        &mut self,
        targets: &[TargetInstance],
        sink: &mut dyn ReportSink,
    ) -> anyhow::Result<RunSummary> {
        let summary = self.collect(targets).await?;
        sink.export(&summary.rows)?;
        Ok(summary)
    }

    /// Poll every target and return the rows, or the first failure
    pub async fn collect(&mut self, targets: &[TargetInstance]) -> Result<RunSummary, RunFailure> {
        self.state = RunState::Running;
        self.logger.log_run_started(targets.len());

        let mut builder = ReportBuilder::new();

        for (i, target) in targets.iter().enumerate() {
            if i > 0 {
                pause(self.config.instance_delay).await;
            }
            self.logger
                .log_instance_started(&target.address, i + 1, targets.len());

            builder = match self.poll_instance(target, builder).await {
                Ok(builder) => builder,
                Err((failure, discarded)) => {
                    self.state = RunState::Failed;
                    self.logger.log_run_failed(&failure, discarded);
                    return Err(failure);
                }
            };
        }

        self.state = RunState::Done;
        let summary = builder.finish();
        self.logger
            .log_run_completed(summary.instances, summary.rows.len());
        Ok(summary)
    }

    /// Run one instance to `Done`. On failure the builder is consumed and dropped.
    async fn poll_instance(
        &self,
        target: &TargetInstance,
        builder: ReportBuilder,
    ) -> Result<ReportBuilder, (RunFailure, usize)> {
        let address = target.address.as_str();
        let mut stage = RunStage::Pending;
        debug!(address = %address, stage = %stage, "Instance queued");

        let fail = |stage: RunStage, cluster: Option<String>, source: ReportError| {
            (
                RunFailure {
                    address: address.to_string(),
                    stage,
                    cluster,
                    source,
                },
                builder.row_count(),
            )
        };

        stage = RunStage::Fetching;
        debug!(address = %address, stage = %stage, "Fetching inventory and metrics");

        let directory = self
            .load_directory(address)
            .await
            .map_err(|e| fail(stage, None, e))?;
        let metrics = self
            .load_metrics(address)
            .await
            .map_err(|e| fail(stage, None, e))?;

        let clusters = reported_clusters(&directory, &metrics).map_err(|e| fail(stage, None, e))?;

        let mut rf2 = BTreeMap::new();
        for (i, cluster) in clusters.iter().enumerate() {
            if i > 0 {
                pause(self.config.cluster_delay).await;
            }
            let percent = storage::calculate(self.api, &cluster.external_address)
                .await
                .map_err(|e| fail(stage, Some(cluster.name.clone()), e))?;
            self.logger
                .log_rf2(&cluster.name, &cluster.external_address, percent);
            rf2.insert(cluster.name.clone(), percent);
        }

        stage = RunStage::Assembling;
        debug!(address = %address, stage = %stage, "Assembling rows");

        let rows = assemble(&directory, &metrics, &rf2).map_err(|e| fail(stage, None, e))?;

        stage = RunStage::Done;
        debug!(address = %address, stage = %stage, rows = rows.len(), "Instance done");
        self.logger.log_instance_completed(address, rows.len());

        Ok(builder.with_instance(rows))
    }

    async fn load_directory(&self, address: &str) -> ReportResult<ClusterDirectory> {
        let request = ClusterListRequest::new(self.config.inventory_length);
        let inventory = self.api.list_clusters(address, &request).await?;
        let directory = ClusterDirectory::from_inventory(address, &inventory)?;
        self.logger
            .log_inventory(address, directory.len(), inventory.entities.len());
        Ok(directory)
    }

    /// One query per metric, in `MetricKind::ALL` order, each awaited before the next
    async fn load_metrics(&self, address: &str) -> ReportResult<InstanceMetrics> {
        Ok(InstanceMetrics {
            cpu: self.load_series(address, MetricKind::CpuUsage).await?,
            memory: self.load_series(address, MetricKind::MemoryUsage).await?,
            storage: self.load_series(address, MetricKind::StorageUsage).await?,
            latency: self.load_series(address, MetricKind::ControllerLatency).await?,
            iops: self.load_series(address, MetricKind::ControllerIops).await?,
        })
    }

    async fn load_series(&self, address: &str, kind: MetricKind) -> ReportResult<MetricSeries> {
        let raw = fetch_metric(
            self.api,
            address,
            kind,
            self.config.downsampling_interval_secs,
        )
        .await?;
        decode_series(kind.attribute(), &raw)
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
