//! Core data models for the capacity report

use serde::{Deserialize, Serialize};

/// One Prism Central endpoint to poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetInstance {
    pub address: String,
}

impl TargetInstance {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

/// Addressable identity of a cluster registered with Prism Central
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterIdentity {
    pub name: String,
    pub external_address: String,
    pub unique_id: String,
}

/// Raw storage figures summed across every pool of one cluster
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StoragePoolSample {
    pub capacity_bytes: f64,
    pub used_bytes: f64,
}

impl StoragePoolSample {
    /// Fold another pool's figures into this one
    pub fn accumulate(&mut self, other: StoragePoolSample) {
        self.capacity_bytes += other.capacity_bytes;
        self.used_bytes += other.used_bytes;
    }
}

/// Metric series queried from the groups API, one query each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    CpuUsage,
    MemoryUsage,
    StorageUsage,
    ControllerLatency,
    ControllerIops,
}

impl MetricKind {
    /// Query order
    pub const ALL: [MetricKind; 5] = [
        MetricKind::CpuUsage,
        MetricKind::MemoryUsage,
        MetricKind::StorageUsage,
        MetricKind::ControllerLatency,
        MetricKind::ControllerIops,
    ];

    /// Attribute name understood by the groups API
    pub fn attribute(&self) -> &'static str {
        match self {
            MetricKind::CpuUsage => "hypervisor_cpu_usage_ppm",
            MetricKind::MemoryUsage => "hypervisor_memory_usage_ppm",
            MetricKind::StorageUsage => "storage_usage_percentage",
            MetricKind::ControllerLatency => "controller_avg_io_latency_usecs",
            MetricKind::ControllerIops => "controller_num_iops",
        }
    }

    /// Aggregation applied over the downsampling window
    pub fn operation(&self) -> &'static str {
        "AVG"
    }
}

/// Final per-cluster report row. Plain numbers; formatting happens at export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterReportRow {
    pub unique_id: String,
    pub external_address: String,
    pub name: String,
    pub iops: f64,
    pub latency_ms: f64,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub storage_percent: f64,
    pub rf2_storage_percent: u32,
}
