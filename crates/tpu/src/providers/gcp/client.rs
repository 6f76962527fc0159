//! Google Cloud REST client implementation.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use tracing::{debug, warn};

use super::auth;
use super::models::{
    ComputeAllowed, ComputeFirewall, ComputeNetwork, ComputeOperation, ComputeSubnetwork,
    ErrorResponse, FirewallLogConfig, ListLocationsResponse, ListNodesResponse, RoutingConfig,
    ShieldedInstanceConfig, TpuNetworkConfig, TpuNode, TpuOperation,
};
use crate::providers::traits::{
    AcceleratorNode, CloudProvider, Direction, FirewallRule, Network, NetworkConfig,
    NetworkRequest, NodeRequest, NodeState, Operation, ProviderError, RoutingMode, Subnetwork,
    SubnetworkRequest,
};

/// Base URL for the Compute Engine v1 API.
const COMPUTE_API_URL: &str = "https://compute.googleapis.com/compute/v1";

/// Base URL for the Cloud TPU v2 API.
const TPU_API_URL: &str = "https://tpu.googleapis.com/v2";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Polling interval when waiting for operations.
const POLL_INTERVAL_SECS: u64 = 5;

/// Upper bound on a single long-running operation.
const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 1800;

/// Page size for list calls.
const LIST_PAGE_SIZE: u32 = 1000;

/// Where a compute operation lives.
#[derive(Debug, Clone)]
enum ComputeScope {
    Global,
    Region(String),
}

/// Google Cloud provider backed by the Compute Engine and Cloud TPU REST APIs.
#[derive(Clone)]
pub struct Gcp {
    /// HTTP client.
    client: Client,
    /// OAuth bearer token.
    access_token: String,
    /// Explicit default project, if any.
    project: Option<String>,
    compute_url: String,
    tpu_url: String,
    request_timeout: Duration,
    poll_interval: Duration,
    operation_timeout: Duration,
}

impl Gcp {
    /// Create a new GCP provider.
    ///
    /// # Arguments
    /// * `access_token` - OAuth access token
    /// * `project` - Default project; discovered from the environment if `None`
    ///
    /// # Errors
    /// Returns error if HTTP client cannot be created.
    pub fn new(
        access_token: impl Into<String>,
        project: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            access_token: access_token.into(),
            project: project.filter(|p| !p.trim().is_empty()),
            compute_url: COMPUTE_API_URL.to_string(),
            tpu_url: TPU_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
            operation_timeout: Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS),
        })
    }

    /// Create a provider using an access token from the environment or `gcloud`.
    ///
    /// # Errors
    /// Returns error if no token can be found or the HTTP client fails.
    pub async fn from_environment(project: Option<String>) -> Result<Self, ProviderError> {
        let token = auth::discover_access_token().await?;
        Self::new(token, project)
    }

    /// Point the client at different API roots.
    #[must_use]
    pub fn with_endpoints(
        mut self,
        compute_url: impl Into<String>,
        tpu_url: impl Into<String>,
    ) -> Self {
        self.compute_url = compute_url.into().trim_end_matches('/').to_string();
        self.tpu_url = tpu_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the timeout for each HTTP request.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the delay between operation polls.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set how long to wait for any single operation.
    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Make an authenticated request and parse the JSON response.
    async fn request<T, B>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, ProviderError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        debug!(method = %method, url = %url, "Request");

        let mut builder = self
            .client
            .request(method, url)
            .bearer_auth(&self.access_token)
            .timeout(self.request_timeout)
            .query(query);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        Self::handle_response(response).await
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        self.request::<T, ()>(Method::GET, url, query, None).await
    }

    async fn post<T, B>(
        &self,
        url: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T, ProviderError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        self.request(Method::POST, url, query, Some(body)).await
    }

    async fn delete<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        self.request::<T, ()>(Method::DELETE, url, &[], None).await
    }

    /// Handle API response, parsing JSON or classifying the error.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, body = %text, "Failed to parse response");
                ProviderError::Serialization(e)
            })
        } else {
            Err(classify_http_error(status, &text))
        }
    }

    fn compute_operation_url(&self, project: &str, scope: &ComputeScope, op: &str) -> String {
        match scope {
            ComputeScope::Global => {
                format!("{}/projects/{project}/global/operations/{op}", self.compute_url)
            }
            ComputeScope::Region(region) => format!(
                "{}/projects/{project}/regions/{region}/operations/{op}",
                self.compute_url
            ),
        }
    }

    /// Poll a compute operation until it reports `DONE`.
    async fn wait_compute(
        &self,
        project: &str,
        scope: &ComputeScope,
        mut op: ComputeOperation,
    ) -> Result<(), ProviderError> {
        let start = Instant::now();
        loop {
            if op.status == "DONE" {
                return compute_operation_result(op);
            }
            if start.elapsed() > self.operation_timeout {
                return Err(ProviderError::Timeout(self.operation_timeout.as_secs()));
            }

            debug!(
                operation = %op.name,
                status = %op.status,
                elapsed_secs = start.elapsed().as_secs(),
                "Polling compute operation"
            );
            tokio::time::sleep(self.poll_interval).await;
            op = self
                .get(&self.compute_operation_url(project, scope, &op.name), &[])
                .await?;
        }
    }

    /// Wrap a submitted compute operation in a lazily polled handle.
    fn compute_handle(
        &self,
        description: String,
        project: &str,
        scope: ComputeScope,
        op: ComputeOperation,
    ) -> Operation<()> {
        let this = self.clone();
        let project = project.to_string();
        Operation::new(description, async move {
            this.wait_compute(&project, &scope, op).await
        })
    }

    /// Poll a TPU operation until `done`, returning its response payload.
    async fn wait_tpu(
        &self,
        mut op: TpuOperation,
    ) -> Result<Option<serde_json::Value>, ProviderError> {
        let start = Instant::now();
        loop {
            if op.done {
                if let Some(status) = op.error {
                    return Err(classify_operation_code(
                        rpc_code_name(status.code),
                        status.message,
                    ));
                }
                return Ok(op.response);
            }
            if start.elapsed() > self.operation_timeout {
                return Err(ProviderError::Timeout(self.operation_timeout.as_secs()));
            }

            debug!(
                operation = %op.name,
                elapsed_secs = start.elapsed().as_secs(),
                "Polling TPU operation"
            );
            tokio::time::sleep(self.poll_interval).await;
            op = self.get(&format!("{}/{}", self.tpu_url, op.name), &[]).await?;
        }
    }

    /// Wrap a TPU operation whose result is the node `node_name`.
    fn node_handle(
        &self,
        description: String,
        node_name: String,
        op: TpuOperation,
    ) -> Operation<AcceleratorNode> {
        let this = self.clone();
        Operation::new(description, async move {
            match this.wait_tpu(op).await? {
                Some(response) => {
                    let node: TpuNode = serde_json::from_value(response)?;
                    if node.name.is_empty() {
                        this.get_node(&node_name).await
                    } else {
                        Ok(to_accelerator_node(node))
                    }
                }
                None => this.get_node(&node_name).await,
            }
        })
    }

    /// Fetch every page of a TPU list call.
    async fn list_pages<P, I>(
        &self,
        url: &str,
        page_size: u32,
        split: impl Fn(P) -> (Vec<I>, Option<String>),
    ) -> Result<Vec<I>, ProviderError>
    where
        P: serde::de::DeserializeOwned,
    {
        let page_size = page_size.clamp(1, LIST_PAGE_SIZE);
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", page_size.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let page: P = self.get(url, &query).await?;
            let (batch, next) = split(page);
            items.extend(batch);

            match next.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => return Ok(items),
            }
        }
    }
}

#[async_trait]
impl CloudProvider for Gcp {
    async fn default_project(&self) -> Result<String, ProviderError> {
        match &self.project {
            Some(project) => Ok(project.clone()),
            None => auth::discover_project().await,
        }
    }

    async fn list_locations(
        &self,
        project: &str,
        page_size: u32,
    ) -> Result<BTreeMap<String, String>, ProviderError> {
        let url = format!("{}/projects/{project}/locations", self.tpu_url);
        let locations = self
            .list_pages(&url, page_size, |page: ListLocationsResponse| {
                (page.locations, page.next_page_token)
            })
            .await?;

        Ok(locations
            .into_iter()
            .map(|l| (l.location_id, l.name))
            .collect())
    }

    async fn insert_network(
        &self,
        project: &str,
        req: NetworkRequest,
    ) -> Result<Operation<()>, ProviderError> {
        let body = ComputeNetwork {
            name: req.name.clone(),
            self_link: None,
            auto_create_subnetworks: Some(req.auto_create_subnetworks),
            routing_config: Some(RoutingConfig {
                routing_mode: routing_mode_name(req.routing_mode).to_string(),
            }),
        };
        let url = format!("{}/projects/{project}/global/networks", self.compute_url);
        let op: ComputeOperation = self.post(&url, &[], &body).await?;

        Ok(self.compute_handle(
            format!("create network {}", req.name),
            project,
            ComputeScope::Global,
            op,
        ))
    }

    async fn get_network(&self, project: &str, name: &str) -> Result<Network, ProviderError> {
        let url = format!("{}/projects/{project}/global/networks/{name}", self.compute_url);
        let network: ComputeNetwork = self.get(&url, &[]).await?;
        Ok(Network {
            self_link: network.self_link.unwrap_or_else(|| url.clone()),
            name: network.name,
        })
    }

    async fn delete_network(
        &self,
        project: &str,
        name: &str,
    ) -> Result<Operation<()>, ProviderError> {
        let url = format!("{}/projects/{project}/global/networks/{name}", self.compute_url);
        let op: ComputeOperation = self.delete(&url).await?;
        Ok(self.compute_handle(
            format!("delete network {name}"),
            project,
            ComputeScope::Global,
            op,
        ))
    }

    async fn insert_subnetwork(
        &self,
        project: &str,
        req: SubnetworkRequest,
    ) -> Result<Operation<()>, ProviderError> {
        let body = ComputeSubnetwork {
            name: req.name.clone(),
            self_link: None,
            network: req.network,
            region: None,
            ip_cidr_range: req.ip_cidr_range,
            stack_type: Some(req.stack_type),
        };
        let url = format!(
            "{}/projects/{project}/regions/{}/subnetworks",
            self.compute_url, req.region
        );
        let op: ComputeOperation = self.post(&url, &[], &body).await?;

        Ok(self.compute_handle(
            format!("create subnetwork {}", req.name),
            project,
            ComputeScope::Region(req.region),
            op,
        ))
    }

    async fn get_subnetwork(
        &self,
        project: &str,
        region: &str,
        name: &str,
    ) -> Result<Subnetwork, ProviderError> {
        let url = format!(
            "{}/projects/{project}/regions/{region}/subnetworks/{name}",
            self.compute_url
        );
        let subnet: ComputeSubnetwork = self.get(&url, &[]).await?;
        Ok(Subnetwork {
            self_link: subnet.self_link.unwrap_or_else(|| url.clone()),
            region: subnet
                .region
                .as_deref()
                .map_or_else(|| region.to_string(), |r| last_segment(r).to_string()),
            name: subnet.name,
            network: subnet.network,
            ip_cidr_range: subnet.ip_cidr_range,
        })
    }

    async fn delete_subnetwork(
        &self,
        project: &str,
        region: &str,
        name: &str,
    ) -> Result<Operation<()>, ProviderError> {
        let url = format!(
            "{}/projects/{project}/regions/{region}/subnetworks/{name}",
            self.compute_url
        );
        let op: ComputeOperation = self.delete(&url).await?;
        Ok(self.compute_handle(
            format!("delete subnetwork {name}"),
            project,
            ComputeScope::Region(region.to_string()),
            op,
        ))
    }

    async fn insert_firewall(
        &self,
        project: &str,
        rule: FirewallRule,
    ) -> Result<Operation<()>, ProviderError> {
        let body = ComputeFirewall {
            name: rule.name.clone(),
            network: rule.network,
            direction: match rule.direction {
                Direction::Ingress => "INGRESS".to_string(),
                Direction::Egress => "EGRESS".to_string(),
            },
            allowed: rule
                .allowed
                .into_iter()
                .map(|a| ComputeAllowed {
                    ip_protocol: a.protocol,
                    ports: a.ports,
                })
                .collect(),
            source_ranges: rule.source_ranges,
            priority: rule.priority,
            log_config: FirewallLogConfig {
                enable: rule.log_enabled,
            },
        };
        let url = format!("{}/projects/{project}/global/firewalls", self.compute_url);
        let op: ComputeOperation = self.post(&url, &[], &body).await?;

        Ok(self.compute_handle(
            format!("create firewall {}", rule.name),
            project,
            ComputeScope::Global,
            op,
        ))
    }

    async fn delete_firewall(
        &self,
        project: &str,
        name: &str,
    ) -> Result<Operation<()>, ProviderError> {
        let url = format!("{}/projects/{project}/global/firewalls/{name}", self.compute_url);
        let op: ComputeOperation = self.delete(&url).await?;
        Ok(self.compute_handle(
            format!("delete firewall {name}"),
            project,
            ComputeScope::Global,
            op,
        ))
    }

    async fn create_node(
        &self,
        parent: &str,
        req: NodeRequest,
    ) -> Result<Operation<AcceleratorNode>, ProviderError> {
        let node_name = format!("{parent}/nodes/{}", req.node_id);
        let body = TpuNode {
            description: Some(req.description),
            accelerator_type: req.accelerator_type,
            runtime_version: req.runtime_version,
            network_config: Some(TpuNetworkConfig {
                network: Some(req.network_config.network),
                subnetwork: Some(req.network_config.subnetwork),
                enable_external_ips: req.network_config.enable_external_ips,
                can_ip_forward: req.network_config.can_ip_forward,
            }),
            shielded_instance_config: Some(ShieldedInstanceConfig::default()),
            metadata: BTreeMap::from([("startup-script".to_string(), req.startup_script)]),
            ..TpuNode::default()
        };

        let url = format!("{}/{parent}/nodes", self.tpu_url);
        let op: TpuOperation = self
            .post(&url, &[("nodeId", req.node_id.clone())], &body)
            .await?;

        Ok(self.node_handle(format!("create node {}", req.node_id), node_name, op))
    }

    async fn get_node(&self, name: &str) -> Result<AcceleratorNode, ProviderError> {
        let node: TpuNode = self.get(&format!("{}/{name}", self.tpu_url), &[]).await?;
        Ok(to_accelerator_node(node))
    }

    async fn list_nodes(&self, parent: &str) -> Result<Vec<AcceleratorNode>, ProviderError> {
        let url = format!("{}/{parent}/nodes", self.tpu_url);
        let nodes = self
            .list_pages(&url, LIST_PAGE_SIZE, |page: ListNodesResponse| {
                (page.nodes, page.next_page_token)
            })
            .await?;
        Ok(nodes.into_iter().map(to_accelerator_node).collect())
    }

    async fn start_node(&self, name: &str) -> Result<Operation<AcceleratorNode>, ProviderError> {
        let url = format!("{}/{name}:start", self.tpu_url);
        let op: TpuOperation = self.post(&url, &[], &serde_json::json!({})).await?;
        Ok(self.node_handle(format!("start node {name}"), name.to_string(), op))
    }

    async fn stop_node(&self, name: &str) -> Result<Operation<AcceleratorNode>, ProviderError> {
        let url = format!("{}/{name}:stop", self.tpu_url);
        let op: TpuOperation = self.post(&url, &[], &serde_json::json!({})).await?;
        Ok(self.node_handle(format!("stop node {name}"), name.to_string(), op))
    }

    async fn delete_node(&self, name: &str) -> Result<Operation<()>, ProviderError> {
        let op: TpuOperation = self.delete(&format!("{}/{name}", self.tpu_url)).await?;
        let this = self.clone();
        Ok(Operation::new(format!("delete node {name}"), async move {
            this.wait_tpu(op).await.map(|_| ())
        }))
    }
}

fn routing_mode_name(mode: RoutingMode) -> &'static str {
    match mode {
        RoutingMode::Regional => "REGIONAL",
        RoutingMode::Global => "GLOBAL",
    }
}

fn last_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Map an HTTP error response onto the provider error taxonomy.
fn classify_http_error(status: StatusCode, body: &str) -> ProviderError {
    let parsed = serde_json::from_str::<ErrorResponse>(body).ok();
    let canonical = parsed
        .as_ref()
        .and_then(|e| e.error.status.clone())
        .unwrap_or_default();
    let message = parsed
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| body.to_string());

    match (status, canonical.as_str()) {
        (StatusCode::CONFLICT, _) | (_, "ALREADY_EXISTS") => ProviderError::AlreadyExists(message),
        (StatusCode::NOT_FOUND, _) | (_, "NOT_FOUND") => ProviderError::NotFound(message),
        (StatusCode::TOO_MANY_REQUESTS, _) | (_, "RESOURCE_EXHAUSTED") => {
            ProviderError::ResourceExhausted(message)
        }
        _ => ProviderError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Map a failed operation's error code onto the provider error taxonomy.
fn classify_operation_code(code: &str, message: String) -> ProviderError {
    match code {
        "ALREADY_EXISTS" | "RESOURCE_ALREADY_EXISTS" => ProviderError::AlreadyExists(message),
        "NOT_FOUND" | "RESOURCE_NOT_FOUND" => ProviderError::NotFound(message),
        "RESOURCE_EXHAUSTED" | "QUOTA_EXCEEDED" | "ZONE_RESOURCE_POOL_EXHAUSTED"
        | "ZONE_RESOURCE_POOL_EXHAUSTED_WITH_DETAILS" => ProviderError::ResourceExhausted(message),
        other => ProviderError::Operation {
            code: other.to_string(),
            message,
        },
    }
}

/// Canonical name of a `google.rpc.Code`.
fn rpc_code_name(code: i32) -> &'static str {
    match code {
        1 => "CANCELLED",
        3 => "INVALID_ARGUMENT",
        4 => "DEADLINE_EXCEEDED",
        5 => "NOT_FOUND",
        6 => "ALREADY_EXISTS",
        7 => "PERMISSION_DENIED",
        8 => "RESOURCE_EXHAUSTED",
        9 => "FAILED_PRECONDITION",
        10 => "ABORTED",
        13 => "INTERNAL",
        14 => "UNAVAILABLE",
        _ => "UNKNOWN",
    }
}

fn compute_operation_result(op: ComputeOperation) -> Result<(), ProviderError> {
    let Some(first) = op.error.and_then(|e| e.errors.into_iter().next()) else {
        return Ok(());
    };
    let message = first.message.unwrap_or_else(|| first.code.clone());

    match classify_operation_code(&first.code, message) {
        ProviderError::Operation { code, message } => match op.http_error_status_code {
            Some(status) => Err(classify_http_error(
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                &message,
            )),
            None => Err(ProviderError::Operation { code, message }),
        },
        classified => Err(classified),
    }
}

/// Convert an API node into our `AcceleratorNode` type.
fn to_accelerator_node(node: TpuNode) -> AcceleratorNode {
    let state = match node.state.as_deref() {
        Some("CREATING") => NodeState::Creating,
        Some("READY") => NodeState::Ready,
        Some("STARTING" | "RESTARTING") => NodeState::Starting,
        Some("STOPPING") => NodeState::Stopping,
        Some("STOPPED") => NodeState::Stopped,
        Some("DELETING") => NodeState::Deleting,
        _ => NodeState::Unknown,
    };

    AcceleratorNode {
        name: node.name,
        accelerator_type: node.accelerator_type,
        runtime_version: node.runtime_version,
        network_config: node.network_config.map(|c| NetworkConfig {
            network: c.network.unwrap_or_default(),
            subnetwork: c.subnetwork.unwrap_or_default(),
            enable_external_ips: c.enable_external_ips,
            can_ip_forward: c.can_ip_forward,
        }),
        state,
        created_at: node
            .create_time
            .as_deref()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::gcp::models::{ComputeOperationError, ComputeOperationErrorItem};

    #[test]
    fn test_http_error_classification() {
        let conflict = r#"{"error":{"code":409,"message":"The resource 'exp1' already exists"}}"#;
        assert!(matches!(
            classify_http_error(StatusCode::CONFLICT, conflict),
            ProviderError::AlreadyExists(m) if m.contains("already exists")
        ));

        let envelope = r#"{"error":{"code":400,"message":"dup subnet","status":"ALREADY_EXISTS"}}"#;
        assert!(matches!(
            classify_http_error(StatusCode::BAD_REQUEST, envelope),
            ProviderError::AlreadyExists(m) if m == "dup subnet"
        ));

        assert!(matches!(
            classify_http_error(StatusCode::NOT_FOUND, "gone"),
            ProviderError::NotFound(m) if m == "gone"
        ));

        let quota = r#"{"error":{"code":429,"message":"no capacity","status":"RESOURCE_EXHAUSTED"}}"#;
        assert!(matches!(
            classify_http_error(StatusCode::TOO_MANY_REQUESTS, quota),
            ProviderError::ResourceExhausted(_)
        ));

        assert!(matches!(
            classify_http_error(StatusCode::FORBIDDEN, "denied"),
            ProviderError::Api { status: 403, .. }
        ));
    }

    #[test]
    fn test_compute_operation_error_classification() {
        let op = ComputeOperation {
            name: "op-1".into(),
            status: "DONE".into(),
            error: Some(ComputeOperationError {
                errors: vec![ComputeOperationErrorItem {
                    code: "RESOURCE_ALREADY_EXISTS".into(),
                    message: Some("exists".into()),
                }],
            }),
            http_error_status_code: Some(409),
        };
        assert!(matches!(
            compute_operation_result(op),
            Err(ProviderError::AlreadyExists(_))
        ));

        let clean = ComputeOperation {
            name: "op-2".into(),
            status: "DONE".into(),
            error: None,
            http_error_status_code: None,
        };
        assert!(compute_operation_result(clean).is_ok());
    }

    #[test]
    fn test_rpc_codes_map_to_taxonomy() {
        assert!(matches!(
            classify_operation_code(rpc_code_name(8), "quota".into()),
            ProviderError::ResourceExhausted(_)
        ));
        assert!(matches!(
            classify_operation_code(rpc_code_name(6), "dup".into()),
            ProviderError::AlreadyExists(_)
        ));
        assert!(matches!(
            classify_operation_code(rpc_code_name(13), "oops".into()),
            ProviderError::Operation { code, .. } if code == "INTERNAL"
        ));
    }

    #[test]
    fn test_node_state_mapping() {
        let node = TpuNode {
            name: "projects/p/locations/z/nodes/exp1".into(),
            accelerator_type: "v2-8".into(),
            runtime_version: "v2".into(),
            state: Some("STOPPED".into()),
            create_time: Some("2024-05-01T10:00:00Z".into()),
            ..TpuNode::default()
        };
        let converted = to_accelerator_node(node);
        assert_eq!(converted.state, NodeState::Stopped);
        assert_eq!(converted.node_id(), "exp1");
        assert!(converted.created_at.is_some());
    }

    #[test]
    fn test_firewall_body_serialization() {
        let body = ComputeFirewall {
            name: "exp1-allow-ssh".into(),
            network: "https://net/exp1".into(),
            direction: "INGRESS".into(),
            allowed: vec![ComputeAllowed {
                ip_protocol: "tcp".into(),
                ports: vec!["22".into()],
            }],
            source_ranges: vec!["0.0.0.0/0".into()],
            priority: 1000,
            log_config: FirewallLogConfig { enable: false },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["allowed"][0]["IPProtocol"], "tcp");
        assert_eq!(json["sourceRanges"][0], "0.0.0.0/0");
        assert_eq!(json["logConfig"]["enable"], false);
    }
}
