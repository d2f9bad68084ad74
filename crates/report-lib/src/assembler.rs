//! Report assembly
//!
//! Joins the cluster directory, the five decoded metric series and the RF2
//! storage figures on cluster name. Rows come out in ascending name order
//! no matter what order each series was delivered in.

use crate::decoder::MetricSeries;
use crate::directory::ClusterDirectory;
use crate::error::{ReportError, ReportResult};
use crate::models::{ClusterIdentity, ClusterReportRow, MetricKind};
use std::collections::{BTreeMap, BTreeSet};

/// Parts-per-million per percent
pub const PPM_PER_PERCENT: f64 = 10_000.0;

/// Microseconds per millisecond
pub const USECS_PER_MS: f64 = 1_000.0;

/// Label used when a cluster has no RF2 figure
pub const RF2_ATTRIBUTE: &str = "rf2_storage_percent";

pub fn ppm_to_percent(ppm: f64) -> f64 {
    ppm / PPM_PER_PERCENT
}

pub fn usecs_to_ms(usecs: f64) -> f64 {
    usecs / USECS_PER_MS
}

/// The five decoded series of one Prism Central instance
#[derive(Debug, Clone)]
pub struct InstanceMetrics {
    pub cpu: MetricSeries,
    pub memory: MetricSeries,
    pub storage: MetricSeries,
    pub latency: MetricSeries,
    pub iops: MetricSeries,
}

impl InstanceMetrics {
    pub fn series(&self, kind: MetricKind) -> &MetricSeries {
        match kind {
            MetricKind::CpuUsage => &self.cpu,
            MetricKind::MemoryUsage => &self.memory,
            MetricKind::StorageUsage => &self.storage,
            MetricKind::ControllerLatency => &self.latency,
            MetricKind::ControllerIops => &self.iops,
        }
    }

    /// Every cluster named by any series, ascending
    pub fn cluster_names(&self) -> BTreeSet<&str> {
        MetricKind::ALL
            .iter()
            .flat_map(|kind| self.series(*kind).names())
            .collect()
    }
}

/// Clusters the report will cover, resolved against the directory.
///
/// Fails if any series names a cluster the inventory does not know.
pub fn reported_clusters<'a>(
    directory: &'a ClusterDirectory,
    metrics: &InstanceMetrics,
) -> ReportResult<Vec<&'a ClusterIdentity>> {
    metrics
        .cluster_names()
        .into_iter()
        .map(|name| directory.lookup(name))
        .collect()
}

/// Build one row per reported cluster
pub fn assemble(
    directory: &ClusterDirectory,
    metrics: &InstanceMetrics,
    rf2: &BTreeMap<String, u32>,
) -> ReportResult<Vec<ClusterReportRow>> {
    reported_clusters(directory, metrics)?
        .into_iter()
        .map(|identity| assemble_row(identity, metrics, rf2))
        .collect()
}

fn assemble_row(
    identity: &ClusterIdentity,
    metrics: &InstanceMetrics,
    rf2: &BTreeMap<String, u32>,
) -> ReportResult<ClusterReportRow> {
    let name = identity.name.as_str();

    let rf2_storage_percent = *rf2.get(name).ok_or_else(|| ReportError::MissingSample {
        cluster: name.to_string(),
        attribute: RF2_ATTRIBUTE.to_string(),
    })?;

    Ok(ClusterReportRow {
        unique_id: identity.unique_id.clone(),
        external_address: identity.external_address.clone(),
        name: identity.name.clone(),
        iops: metrics.iops.number(name)?,
        latency_ms: usecs_to_ms(metrics.latency.number(name)?),
        cpu_percent: ppm_to_percent(metrics.cpu.number(name)?),
        memory_percent: ppm_to_percent(metrics.memory.number(name)?),
        storage_percent: metrics.storage.number(name)?,
        rf2_storage_percent,
    })
}
