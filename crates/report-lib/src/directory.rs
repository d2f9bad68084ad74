//! Cluster directory built from the Prism Central inventory

use crate::error::{ReportError, ReportResult};
use crate::models::ClusterIdentity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Request body for `POST /clusters/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterListRequest {
    pub kind: String,
    pub length: u32,
}

impl ClusterListRequest {
    pub fn new(length: u32) -> Self {
        Self {
            kind: "cluster".to_string(),
            length,
        }
    }
}

/// Response body of `POST /clusters/list`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterListResponse {
    #[serde(default)]
    pub entities: Vec<ClusterEntity>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterEntity {
    #[serde(default)]
    pub spec: ClusterSpec,
    #[serde(default)]
    pub metadata: EntityMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub resources: ClusterResources,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterResources {
    #[serde(default)]
    pub network: ClusterNetwork,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterNetwork {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ip: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityMetadata {
    #[serde(default)]
    pub uuid: Option<String>,
}

/// Name-keyed lookup of addressable clusters
#[derive(Debug, Clone, Default)]
pub struct ClusterDirectory {
    entries: BTreeMap<String, ClusterIdentity>,
}

impl ClusterDirectory {
    /// Build the directory from an inventory response.
    ///
    /// Entries without an external address (Prism Central's own
    /// registration) cannot be queried for storage and are left out.
    pub fn from_inventory(source: &str, inventory: &ClusterListResponse) -> ReportResult<Self> {
        let mut entries = BTreeMap::new();

        for entity in &inventory.entities {
            let name = entity.spec.name.clone().ok_or_else(|| {
                ReportError::UnexpectedResponse {
                    url: source.to_string(),
                    message: "cluster entity without spec.name".to_string(),
                }
            })?;

            let Some(external_address) = entity
                .spec
                .resources
                .network
                .external_ip
                .clone()
                .filter(|ip| !ip.trim().is_empty())
            else {
                debug!(cluster = %name, "Skipping cluster without external address");
                continue;
            };

            let unique_id = entity.metadata.uuid.clone().ok_or_else(|| {
                ReportError::UnexpectedResponse {
                    url: source.to_string(),
                    message: format!("cluster {:?} has no metadata.uuid", name),
                }
            })?;

            let identity = ClusterIdentity {
                name: name.clone(),
                external_address,
                unique_id,
            };

            if entries.insert(name.clone(), identity).is_some() {
                return Err(ReportError::UnexpectedResponse {
                    url: source.to_string(),
                    message: format!("cluster name {:?} listed more than once", name),
                });
            }
        }

        Ok(Self { entries })
    }

    /// Build directly from identities (mostly for tests and fakes)
    pub fn from_identities(identities: impl IntoIterator<Item = ClusterIdentity>) -> Self {
        Self {
            entries: identities
                .into_iter()
                .map(|identity| (identity.name.clone(), identity))
                .collect(),
        }
    }

    /// Resolve a cluster name, failing if the inventory does not know it
    pub fn lookup(&self, name: &str) -> ReportResult<&ClusterIdentity> {
        self.entries
            .get(name)
            .ok_or_else(|| ReportError::DirectoryLookup {
                name: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identities in ascending name order
    pub fn iter(&self) -> impl Iterator<Item = &ClusterIdentity> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> ClusterListResponse {
        serde_json::from_str(
            r#"{
                "entities": [
                    {"spec": {"name": "beta", "resources": {"network": {"external_ip": "10.0.0.2"}}},
                     "metadata": {"uuid": "uuid-beta"}},
                    {"spec": {"name": "Unnamed", "resources": {"network": {}}},
                     "metadata": {"uuid": "uuid-pc"}},
                    {"spec": {"name": "alpha", "resources": {"network": {"external_ip": "10.0.0.1"}}},
                     "metadata": {"uuid": "uuid-alpha"}}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_known_cluster() {
        let directory = ClusterDirectory::from_inventory("pc", &inventory()).unwrap();

        let alpha = directory.lookup("alpha").unwrap();
        assert_eq!(alpha.external_address, "10.0.0.1");
        assert_eq!(alpha.unique_id, "uuid-alpha");
        assert_eq!(directory.len(), 2);
    }

    #[test]
    fn test_lookup_unknown_cluster_fails() {
        let directory = ClusterDirectory::from_inventory("pc", &inventory()).unwrap();

        let err = directory.lookup("gamma").unwrap_err();
        assert!(matches!(err, ReportError::DirectoryLookup { ref name } if name == "gamma"));
    }

    #[test]
    fn test_cluster_without_address_is_not_addressable() {
        let directory = ClusterDirectory::from_inventory("pc", &inventory()).unwrap();
        assert!(matches!(
            directory.lookup("Unnamed"),
            Err(ReportError::DirectoryLookup { .. })
        ));
    }

    #[test]
    fn test_iteration_is_name_ordered() {
        let directory = ClusterDirectory::from_inventory("pc", &inventory()).unwrap();
        let names: Vec<_> = directory.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut inv = inventory();
        inv.entities.push(inv.entities[0].clone());
        let err = ClusterDirectory::from_inventory("pc", &inv).unwrap_err();
        assert!(matches!(err, ReportError::UnexpectedResponse { .. }));
    }

    #[test]
    fn test_list_request_body() {
        let body = serde_json::to_value(ClusterListRequest::new(500)).unwrap();
        assert_eq!(body["kind"], "cluster");
        assert_eq!(body["length"], 500);
    }
}
