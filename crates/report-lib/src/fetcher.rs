//! Grouped-metrics queries against Prism Central
//!
//! Each metric is its own query. The result is returned as the raw
//! interleaved value array; splitting it into pairs is the decoder's job.

use crate::client::PrismApi;
use crate::error::{ReportError, ReportResult};
use crate::models::MetricKind;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Grouping key shared by every query
pub const CLUSTER_NAME_ATTRIBUTE: &str = "cluster_name";

/// Request body for `POST /groups`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupsRequest {
    pub downsampling_interval: u64,
    pub entity_type: String,
    pub group_member_attributes: Vec<GroupMemberAttribute>,
    pub group_member_sort_attribute: String,
    pub group_member_sort_order: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMemberAttribute {
    pub attribute: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl GroupsRequest {
    /// Query for one metric, grouped and sorted ascending by cluster name
    pub fn for_metric(kind: MetricKind, downsampling_interval: u64) -> Self {
        Self {
            downsampling_interval,
            entity_type: "cluster".to_string(),
            group_member_attributes: vec![
                GroupMemberAttribute {
                    attribute: CLUSTER_NAME_ATTRIBUTE.to_string(),
                    operation: None,
                },
                GroupMemberAttribute {
                    attribute: kind.attribute().to_string(),
                    operation: Some(kind.operation().to_string()),
                },
            ],
            group_member_sort_attribute: CLUSTER_NAME_ATTRIBUTE.to_string(),
            group_member_sort_order: "ASCENDING".to_string(),
        }
    }
}

/// Response body of `POST /groups`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupsResponse {
    #[serde(default)]
    pub group_results: Vec<GroupResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupResult {
    #[serde(default)]
    pub entity_results: Vec<EntityResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityResult {
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub data: Vec<EntityData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityData {
    pub name: String,
    #[serde(default)]
    pub values: Vec<TimedValues>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimedValues {
    #[serde(default)]
    pub values: Vec<serde_json::Value>,
    #[serde(default)]
    pub time: Option<i64>,
}

impl GroupsResponse {
    /// Flatten into `name, value, name, value, ...` in delivery order.
    ///
    /// Every entity must carry exactly one sample for the name column and
    /// one for the metric column. An entity with a missing sample fails the
    /// whole series instead of shifting later pairs.
    pub fn flatten(&self, attribute: &str) -> ReportResult<Vec<String>> {
        let mut raw = Vec::new();

        for entity in self
            .group_results
            .iter()
            .flat_map(|group| group.entity_results.iter())
        {
            let samples: Vec<String> = entity
                .data
                .iter()
                .filter_map(|column| column.values.first())
                .filter_map(|sample| sample.values.first())
                .map(json_to_raw)
                .collect();

            if samples.len() != 2 {
                return Err(ReportError::malformed(
                    attribute,
                    format!(
                        "entity {} has {} of 2 samples",
                        entity.entity_id.as_deref().unwrap_or("<unnamed>"),
                        samples.len()
                    ),
                ));
            }
            raw.extend(samples);
        }

        Ok(raw)
    }
}

fn json_to_raw(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Issue one grouped-metrics query and return the raw interleaved array
pub async fn fetch_metric(
    api: &dyn PrismApi,
    address: &str,
    kind: MetricKind,
    downsampling_interval: u64,
) -> ReportResult<Vec<String>> {
    let request = GroupsRequest::for_metric(kind, downsampling_interval);
    let response = api.groups(address, &request).await?;
    let raw = response.flatten(kind.attribute())?;

    debug!(
        address = %address,
        attribute = kind.attribute(),
        elements = raw.len(),
        "Fetched grouped metric"
    );

    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(GroupsRequest::for_metric(MetricKind::CpuUsage, 300)).unwrap();

        assert_eq!(body["downsampling_interval"], 300);
        assert_eq!(body["entity_type"], "cluster");
        assert_eq!(body["group_member_sort_attribute"], "cluster_name");
        assert_eq!(body["group_member_sort_order"], "ASCENDING");

        let attrs = body["group_member_attributes"].as_array().unwrap();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0]["attribute"], "cluster_name");
        assert!(attrs[0].get("operation").is_none());
        assert_eq!(attrs[1]["attribute"], "hypervisor_cpu_usage_ppm");
        assert_eq!(attrs[1]["operation"], "AVG");
    }

    #[test]
    fn test_flatten_interleaves_name_and_value() {
        let response: GroupsResponse = serde_json::from_str(
            r#"{"group_results": [{"entity_results": [
                {"entity_id": "a", "data": [
                    {"name": "cluster_name", "values": [{"values": ["alpha"], "time": 1}]},
                    {"name": "controller_num_iops", "values": [{"values": ["1200"], "time": 1}]}
                ]},
                {"entity_id": "b", "data": [
                    {"name": "cluster_name", "values": [{"values": ["beta"], "time": 1}]},
                    {"name": "controller_num_iops", "values": [{"values": [340], "time": 1}]}
                ]}
            ]}]}"#,
        )
        .unwrap();

        assert_eq!(
            response.flatten("controller_num_iops").unwrap(),
            vec!["alpha", "1200", "beta", "340"]
        );
    }

    #[test]
    fn test_entity_without_sample_is_malformed() {
        let response: GroupsResponse = serde_json::from_str(
            r#"{"group_results": [{"entity_results": [
                {"entity_id": "a", "data": [
                    {"name": "cluster_name", "values": [{"values": ["alpha"]}]},
                    {"name": "controller_num_iops", "values": []}
                ]}
            ]}]}"#,
        )
        .unwrap();

        let err = response.flatten("controller_num_iops").unwrap_err();
        assert!(matches!(err, ReportError::MalformedSeries { ref attribute, .. } if attribute == "controller_num_iops"));
    }

    #[test]
    fn test_two_entities_without_samples_do_not_shift_pairs() {
        // Dropping both empty columns would leave "alpha, beta, gamma, 5"
        let response: GroupsResponse = serde_json::from_str(
            r#"{"group_results": [{"entity_results": [
                {"entity_id": "a", "data": [
                    {"name": "cluster_name", "values": [{"values": ["alpha"]}]},
                    {"name": "controller_num_iops", "values": []}
                ]},
                {"entity_id": "b", "data": [
                    {"name": "cluster_name", "values": [{"values": ["beta"]}]},
                    {"name": "controller_num_iops", "values": []}
                ]},
                {"entity_id": "c", "data": [
                    {"name": "cluster_name", "values": [{"values": ["gamma"]}]},
                    {"name": "controller_num_iops", "values": [{"values": ["5"]}]}
                ]}
            ]}]}"#,
        )
        .unwrap();

        let err = response.flatten("controller_num_iops").unwrap_err();
        match err {
            ReportError::MalformedSeries { reason, .. } => assert!(reason.contains("entity a")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_response_flattens_to_nothing() {
        let response = GroupsResponse::default();
        assert!(response.flatten("controller_num_iops").unwrap().is_empty());
    }
}
