//! HTTP client for Prism Central and Prism Element
//!
//! Every call is a single request with a fixed timeout. Nothing is
//! retried: a failed request is reported to the caller as-is.

use crate::directory::{ClusterListRequest, ClusterListResponse};
use crate::error::{ReportError, ReportResult};
use crate::fetcher::{GroupsRequest, GroupsResponse};
use crate::storage::StoragePoolsResponse;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Grouped-metrics endpoint on Prism Central
pub const GROUPS_PATH: &str = "/api/nutanix/v3/groups";

/// Cluster inventory endpoint on Prism Central
pub const CLUSTERS_LIST_PATH: &str = "/api/nutanix/v3/clusters/list";

/// Storage pool endpoint on a cluster's Prism Element
pub const STORAGE_POOLS_PATH: &str = "/PrismGateway/services/rest/v1/storage_pools";

/// Configuration for the Prism HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// URL scheme used for every endpoint
    pub scheme: String,
    /// Port Prism listens on, for both Central and Element
    pub port: u16,
    /// Basic auth user
    pub username: String,
    /// Basic auth password
    pub password: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Skip certificate validation (self-signed Prism certificates)
    pub accept_invalid_certs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            port: 9440,
            username: "admin".to_string(),
            password: String::new(),
            request_timeout: Duration::from_secs(5),
            accept_invalid_certs: true,
        }
    }
}

/// Calls the pipeline makes against Prism
#[async_trait]
pub trait PrismApi: Send + Sync {
    /// Cluster inventory of a Prism Central instance
    async fn list_clusters(
        &self,
        address: &str,
        request: &ClusterListRequest,
    ) -> ReportResult<ClusterListResponse>;

    /// Grouped-metrics query against a Prism Central instance
    async fn groups(&self, address: &str, request: &GroupsRequest) -> ReportResult<GroupsResponse>;

    /// Storage pools of one cluster, addressed by its external IP
    async fn storage_pools(&self, address: &str) -> ReportResult<StoragePoolsResponse>;
}

/// reqwest-backed implementation of [`PrismApi`]
pub struct PrismClient {
    client: Client,
    config: ClientConfig,
}

impl PrismClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> ReportResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| ReportError::transport("<client>", e))?;

        Ok(Self { client, config })
    }

    /// Build the URL for an endpoint on the given host
    pub fn endpoint(&self, address: &str, path: &str) -> ReportResult<Url> {
        let base = format!("{}://{}:{}", self.config.scheme, address, self.config.port);
        Url::parse(&base)
            .and_then(|url| url.join(path))
            .map_err(|e| ReportError::transport(base.clone(), format!("invalid URL: {}", e)))
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// Send a request and decode the JSON body, mapping transport failures with `on_transport`
    async fn send<T: DeserializeOwned>(
        &self,
        url: &Url,
        builder: RequestBuilder,
        on_transport: impl Fn(String) -> ReportError,
    ) -> ReportResult<T> {
        debug!(url = %url, "Sending request");

        let response = self
            .authed(builder)
            .send()
            .await
            .map_err(|e| on_transport(describe(&e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(on_transport(format!("API error ({}): {}", status, body)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| on_transport(describe(&e)))?;

        serde_json::from_str(&body).map_err(|e| ReportError::UnexpectedResponse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}

#[async_trait]
impl PrismApi for PrismClient {
    async fn list_clusters(
        &self,
        address: &str,
        request: &ClusterListRequest,
    ) -> ReportResult<ClusterListResponse> {
        let url = self.endpoint(address, CLUSTERS_LIST_PATH)?;
        let builder = self.client.post(url.clone()).json(request);
        self.send(&url, builder, |msg| ReportError::transport(url.as_str(), msg))
            .await
    }

    async fn groups(&self, address: &str, request: &GroupsRequest) -> ReportResult<GroupsResponse> {
        let url = self.endpoint(address, GROUPS_PATH)?;
        let builder = self.client.post(url.clone()).json(request);
        self.send(&url, builder, |msg| ReportError::transport(url.as_str(), msg))
            .await
    }

    async fn storage_pools(&self, address: &str) -> ReportResult<StoragePoolsResponse> {
        let url = self
            .endpoint(address, STORAGE_POOLS_PATH)
            .map_err(|e| ReportError::storage_query(address, e))?;
        let builder = self.client.get(url.clone());
        self.send(&url, builder, |msg| ReportError::storage_query(address, msg))
            .await
    }
}
