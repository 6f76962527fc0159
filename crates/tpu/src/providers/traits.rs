//! Cloud provider trait and common types.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during cloud provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The resource being created already exists.
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Quota or capacity exhausted.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// A long-running operation finished with an error.
    #[error("Operation failed: {code} - {message}")]
    Operation { code: String, message: String },

    /// Operation timed out.
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A provider response tagged by how the orchestrator should treat it.
///
/// Creation steps accept `AlreadyExists`, teardown steps accept `NotFound`,
/// node creation reports `ResourceExhausted`. Everything else is `Failed`.
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    AlreadyExists(ProviderError),
    NotFound(ProviderError),
    ResourceExhausted(ProviderError),
    Failed(ProviderError),
}

impl<T> From<Result<T, ProviderError>> for Outcome<T> {
    fn from(result: Result<T, ProviderError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(e @ ProviderError::AlreadyExists(_)) => Self::AlreadyExists(e),
            Err(e @ ProviderError::NotFound(_)) => Self::NotFound(e),
            Err(e @ ProviderError::ResourceExhausted(_)) => Self::ResourceExhausted(e),
            Err(e) => Self::Failed(e),
        }
    }
}

/// Handle to a submitted long-running operation.
///
/// Submission has already happened when the handle exists; nothing is polled
/// until [`Operation::wait`] is awaited.
pub struct Operation<T> {
    description: String,
    completion: BoxFuture<'static, Result<T, ProviderError>>,
}

impl<T: Send + 'static> Operation<T> {
    /// Wrap a completion future.
    pub fn new(
        description: impl Into<String>,
        completion: impl Future<Output = Result<T, ProviderError>> + Send + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            completion: Box::pin(completion),
        }
    }

    /// An operation that has already completed with `value`.
    pub fn done(description: impl Into<String>, value: T) -> Self {
        Self::new(description, futures::future::ready(Ok(value)))
    }

    /// What this operation is doing, for logs.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Block until the provider reports the operation finished.
    ///
    /// # Errors
    /// Returns the operation's error, classified like a direct API error.
    pub async fn wait(self) -> Result<T, ProviderError> {
        debug!(operation = %self.description, "Waiting for operation");
        let result = self.completion.await;
        debug!(operation = %self.description, ok = result.is_ok(), "Operation finished");
        result
    }
}

/// Wait on a freshly submitted operation.
///
/// Submission and completion errors come back through the same `Result`, so
/// callers can tag both with a single [`Outcome`].
///
/// # Errors
/// Returns the submission error or the operation's own error.
pub async fn complete<T: Send + 'static>(
    submitted: Result<Operation<T>, ProviderError>,
) -> Result<T, ProviderError> {
    submitted?.wait().await
}

impl<T> fmt::Debug for Operation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Network routing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingMode {
    Regional,
    Global,
}

/// Request to create a VPC network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRequest {
    pub name: String,
    pub auto_create_subnetworks: bool,
    pub routing_mode: RoutingMode,
}

/// A VPC network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    pub self_link: String,
}

/// Request to create a subnetwork.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetworkRequest {
    pub name: String,
    pub region: String,
    /// Self-link of the parent network.
    pub network: String,
    pub ip_cidr_range: String,
    /// e.g. `IPV4_ONLY`.
    pub stack_type: String,
}

/// A subnetwork.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnetwork {
    pub name: String,
    pub self_link: String,
    /// Self-link of the parent network.
    pub network: String,
    pub region: String,
    pub ip_cidr_range: String,
}

/// Firewall traffic direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Ingress,
    Egress,
}

/// A protocol and port set allowed by a firewall rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedTraffic {
    pub protocol: String,
    pub ports: Vec<String>,
}

/// A firewall rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    pub name: String,
    /// Self-link of the network the rule applies to.
    pub network: String,
    pub direction: Direction,
    pub allowed: Vec<AllowedTraffic>,
    pub source_ranges: Vec<String>,
    pub priority: u32,
    pub log_enabled: bool,
}

/// Accelerator node lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeState {
    Creating,
    Ready,
    Starting,
    Stopping,
    Stopped,
    Deleting,
    /// The node does not exist.
    Absent,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creating => write!(f, "creating"),
            Self::Ready => write!(f, "ready"),
            Self::Starting => write!(f, "starting"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
            Self::Deleting => write!(f, "deleting"),
            Self::Absent => write!(f, "absent"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl NodeState {
    /// Whether the node is between stable states and will change on its own.
    #[must_use]
    pub fn is_transitional(self) -> bool {
        matches!(self, Self::Creating | Self::Starting | Self::Stopping)
    }
}

/// Network attachment of an accelerator node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network self-link.
    pub network: String,
    /// Subnetwork self-link.
    pub subnetwork: String,
    pub enable_external_ips: bool,
    pub can_ip_forward: bool,
}

/// Request to create an accelerator node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRequest {
    pub node_id: String,
    pub description: String,
    pub accelerator_type: String,
    pub runtime_version: String,
    pub network_config: NetworkConfig,
    /// Script run on first boot.
    pub startup_script: String,
}

/// An accelerator node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceleratorNode {
    /// Full resource name, `projects/{p}/locations/{z}/nodes/{id}`.
    pub name: String,
    pub accelerator_type: String,
    pub runtime_version: String,
    pub network_config: Option<NetworkConfig>,
    pub state: NodeState,
    pub created_at: Option<DateTime<Utc>>,
}

impl AcceleratorNode {
    /// The short node ID (last segment of the resource name).
    #[must_use]
    pub fn node_id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Trait for the cloud resource-management API.
///
/// Mutating calls return an [`Operation`] once the request has been accepted.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Project from ambient credentials or environment.
    async fn default_project(&self) -> Result<String, ProviderError>;

    /// Map of zone ID to location resource name, all pages of `page_size`.
    async fn list_locations(
        &self,
        project: &str,
        page_size: u32,
    ) -> Result<BTreeMap<String, String>, ProviderError>;

    /// Create a network.
    async fn insert_network(
        &self,
        project: &str,
        req: NetworkRequest,
    ) -> Result<Operation<()>, ProviderError>;

    /// Get a network by name.
    async fn get_network(&self, project: &str, name: &str) -> Result<Network, ProviderError>;

    /// Delete a network.
    async fn delete_network(&self, project: &str, name: &str)
        -> Result<Operation<()>, ProviderError>;

    /// Create a subnetwork.
    async fn insert_subnetwork(
        &self,
        project: &str,
        req: SubnetworkRequest,
    ) -> Result<Operation<()>, ProviderError>;

    /// Get a subnetwork by name.
    async fn get_subnetwork(
        &self,
        project: &str,
        region: &str,
        name: &str,
    ) -> Result<Subnetwork, ProviderError>;

    /// Delete a subnetwork.
    async fn delete_subnetwork(
        &self,
        project: &str,
        region: &str,
        name: &str,
    ) -> Result<Operation<()>, ProviderError>;

    /// Create a firewall rule.
    async fn insert_firewall(
        &self,
        project: &str,
        rule: FirewallRule,
    ) -> Result<Operation<()>, ProviderError>;

    /// Delete a firewall rule.
    async fn delete_firewall(
        &self,
        project: &str,
        name: &str,
    ) -> Result<Operation<()>, ProviderError>;

    /// Create an accelerator node under `parent`.
    async fn create_node(
        &self,
        parent: &str,
        req: NodeRequest,
    ) -> Result<Operation<AcceleratorNode>, ProviderError>;

    /// Get a node by full resource name.
    async fn get_node(&self, name: &str) -> Result<AcceleratorNode, ProviderError>;

    /// List nodes under `parent`.
    async fn list_nodes(&self, parent: &str) -> Result<Vec<AcceleratorNode>, ProviderError>;

    /// Start a stopped node.
    async fn start_node(&self, name: &str) -> Result<Operation<AcceleratorNode>, ProviderError>;

    /// Stop a running node.
    async fn stop_node(&self, name: &str) -> Result<Operation<AcceleratorNode>, ProviderError>;

    /// Delete a node.
    async fn delete_node(&self, name: &str) -> Result<Operation<()>, ProviderError>;
}
