//! RF2-adjusted usable storage utilization
//!
//! Storage pool figures are raw: with replication factor 2 every byte is
//! stored twice, so both capacity and usage are halved. A fixed 80% of the
//! halved capacity is treated as usable.

use crate::client::PrismApi;
use crate::decoder::parse_number;
use crate::error::{ReportError, ReportResult};
use crate::models::StoragePoolSample;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Bytes per TiB
pub const TIB: f64 = 1_099_511_627_776.0;

/// Replication factor applied to raw pool figures
pub const REPLICATION_FACTOR: f64 = 2.0;

/// Fraction of RF2 capacity considered usable
pub const USABLE_MARGIN: f64 = 0.80;

/// Usage statistic carrying used bytes
pub const USAGE_BYTES_STAT: &str = "storage.usage_bytes";

/// Response body of `GET /storage_pools`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoragePoolsResponse {
    #[serde(default)]
    pub entities: Vec<StoragePoolEntity>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoragePoolEntity {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capacity: Option<serde_json::Value>,
    #[serde(default, rename = "usageStats")]
    pub usage_stats: HashMap<String, serde_json::Value>,
}

impl StoragePoolEntity {
    /// Raw figures for this pool
    pub fn sample(&self, address: &str) -> ReportResult<StoragePoolSample> {
        let capacity = self
            .capacity
            .as_ref()
            .ok_or_else(|| missing_field(address, "capacity"))?;
        let used = self
            .usage_stats
            .get(USAGE_BYTES_STAT)
            .ok_or_else(|| missing_field(address, USAGE_BYTES_STAT))?;

        Ok(StoragePoolSample {
            capacity_bytes: json_number("capacity", capacity)?,
            used_bytes: json_number(USAGE_BYTES_STAT, used)?,
        })
    }
}

impl StoragePoolsResponse {
    /// Sum of every pool on the cluster
    pub fn total(&self, address: &str) -> ReportResult<StoragePoolSample> {
        let mut total = StoragePoolSample::default();
        for pool in &self.entities {
            total.accumulate(pool.sample(address)?);
        }
        Ok(total)
    }
}

fn missing_field(address: &str, field: &str) -> ReportError {
    ReportError::UnexpectedResponse {
        url: address.to_string(),
        message: format!("storage pool entry without {}", field),
    }
}

fn json_number(field: &str, value: &serde_json::Value) -> ReportResult<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().ok_or_else(|| ReportError::ValueFormat {
            field: field.to_string(),
            value: n.to_string(),
        }),
        serde_json::Value::String(s) => parse_number(field, s),
        other => Err(ReportError::ValueFormat {
            field: field.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Usable storage utilization as a whole percentage
pub fn rf2_percentage(address: &str, sample: StoragePoolSample) -> ReportResult<u32> {
    let adjusted_total = sample.capacity_bytes / REPLICATION_FACTOR / TIB * USABLE_MARGIN;
    let adjusted_used = sample.used_bytes / REPLICATION_FACTOR / TIB;

    if !adjusted_total.is_finite() || adjusted_total <= 0.0 {
        return Err(ReportError::Arithmetic {
            address: address.to_string(),
            reason: format!("total capacity is {} bytes", sample.capacity_bytes),
        });
    }
    if !adjusted_used.is_finite() || adjusted_used < 0.0 {
        return Err(ReportError::Arithmetic {
            address: address.to_string(),
            reason: format!("used capacity is {} bytes", sample.used_bytes),
        });
    }

    let percentage = (adjusted_used / adjusted_total * 100.0).round();
    if percentage > u32::MAX as f64 {
        return Err(ReportError::Arithmetic {
            address: address.to_string(),
            reason: format!("percentage {} out of range", percentage),
        });
    }

    Ok(percentage as u32)
}

/// Query a cluster's storage pools and compute its RF2 utilization
pub async fn calculate(api: &dyn PrismApi, address: &str) -> ReportResult<u32> {
    let pools = api.storage_pools(address).await?;
    let sample = pools.total(address)?;
    let percentage = rf2_percentage(address, sample)?;

    debug!(
        address = %address,
        pools = pools.entities.len(),
        capacity_bytes = sample.capacity_bytes,
        used_bytes = sample.used_bytes,
        rf2_percent = percentage,
        "Computed RF2 storage utilization"
    );

    Ok(percentage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(capacity_tib: f64, used_tib: f64) -> StoragePoolSample {
        StoragePoolSample {
            capacity_bytes: capacity_tib * TIB,
            used_bytes: used_tib * TIB,
        }
    }

    #[test]
    fn test_rf2_half_of_usable() {
        // (3.2 / 2) / ((8 / 2) * 0.8) = 1.6 / 3.2
        assert_eq!(rf2_percentage("c", sample(8.0, 3.2)).unwrap(), 50);
    }

    #[test]
    fn test_rf2_full_usable() {
        assert_eq!(rf2_percentage("c", sample(8.0, 6.4)).unwrap(), 100);
    }

    #[test]
    fn test_rf2_rounds_to_nearest() {
        // 1.0 / 3.2 = 31.25%
        assert_eq!(rf2_percentage("c", sample(8.0, 2.0)).unwrap(), 31);
        // 1.1 / 3.2 = 34.375%
        assert_eq!(rf2_percentage("c", sample(8.0, 2.2)).unwrap(), 34);
        // 0.9 / 1.6 = 56.25%, 0.91 / 1.6 = 56.875%
        assert_eq!(rf2_percentage("c", sample(4.0, 1.82)).unwrap(), 57);
    }

    #[test]
    fn test_rf2_zero_capacity_is_arithmetic_error() {
        let err = rf2_percentage("10.0.0.9", sample(0.0, 1.0)).unwrap_err();
        assert!(matches!(err, ReportError::Arithmetic { ref address, .. } if address == "10.0.0.9"));
    }

    #[test]
    fn test_pools_are_summed() {
        let pools: StoragePoolsResponse = serde_json::from_str(&format!(
            r#"{{"entities": [
                {{"name": "sp1", "capacity": {cap}, "usageStats": {{"storage.usage_bytes": "{used}"}}}},
                {{"name": "sp2", "capacity": {cap}, "usageStats": {{"storage.usage_bytes": "{used}"}}}}
            ]}}"#,
            cap = 4_u64 * 1_099_511_627_776,
            used = 1_099_511_627_776_u64,
        ))
        .unwrap();

        let total = pools.total("c").unwrap();
        assert_eq!(total.capacity_bytes, 8.0 * TIB);
        assert_eq!(total.used_bytes, 2.0 * TIB);
        assert_eq!(rf2_percentage("c", total).unwrap(), 31);
    }

    #[test]
    fn test_no_pools_is_zero_capacity() {
        let total = StoragePoolsResponse::default().total("c").unwrap();
        assert!(matches!(
            rf2_percentage("c", total),
            Err(ReportError::Arithmetic { .. })
        ));
    }

    #[test]
    fn test_non_numeric_usage_is_value_format_error() {
        let pools: StoragePoolsResponse = serde_json::from_str(
            r#"{"entities": [{"capacity": 100, "usageStats": {"storage.usage_bytes": "lots"}}]}"#,
        )
        .unwrap();
        assert!(matches!(
            pools.total("c"),
            Err(ReportError::ValueFormat { .. })
        ));
    }

    #[test]
    fn test_missing_usage_stat() {
        let pools: StoragePoolsResponse =
            serde_json::from_str(r#"{"entities": [{"capacity": 100, "usageStats": {}}]}"#).unwrap();
        assert!(matches!(
            pools.total("c"),
            Err(ReportError::UnexpectedResponse { .. })
        ));
    }
}
