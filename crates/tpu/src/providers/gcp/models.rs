//! Google Cloud REST API models.
//!
//! Compute Engine v1 (networks, subnetworks, firewalls) and Cloud TPU v2
//! (locations, nodes). Both use camelCase JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Errors
// ============================================================================

/// Error envelope returned by Google APIs on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    /// Canonical status, e.g. `ALREADY_EXISTS`.
    pub status: Option<String>,
}

// ============================================================================
// Compute Engine
// ============================================================================

/// Network routing configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingConfig {
    pub routing_mode: String,
}

/// Network resource.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeNetwork {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_create_subnetworks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_config: Option<RoutingConfig>,
}

/// Subnetwork resource.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeSubnetwork {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    pub network: String,
    /// Region URL on reads; omitted on insert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub ip_cidr_range: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_type: Option<String>,
}

/// Allowed protocol/ports entry of a firewall.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComputeAllowed {
    #[serde(rename = "IPProtocol")]
    pub ip_protocol: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
}

/// Firewall logging configuration.
#[derive(Debug, Serialize, Deserialize)]
pub struct FirewallLogConfig {
    pub enable: bool,
}

/// Firewall resource.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeFirewall {
    pub name: String,
    pub network: String,
    pub direction: String,
    pub allowed: Vec<ComputeAllowed>,
    pub source_ranges: Vec<String>,
    pub priority: u32,
    pub log_config: FirewallLogConfig,
}

/// Compute Engine operation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeOperation {
    pub name: String,
    /// `PENDING`, `RUNNING` or `DONE`.
    pub status: String,
    pub error: Option<ComputeOperationError>,
    pub http_error_status_code: Option<u16>,
}

/// Errors attached to a finished compute operation.
#[derive(Debug, Deserialize)]
pub struct ComputeOperationError {
    #[serde(default)]
    pub errors: Vec<ComputeOperationErrorItem>,
}

/// A single compute operation error.
#[derive(Debug, Deserialize)]
pub struct ComputeOperationErrorItem {
    /// e.g. `RESOURCE_ALREADY_EXISTS`, `QUOTA_EXCEEDED`.
    pub code: String,
    pub message: Option<String>,
}

// ============================================================================
// Cloud TPU
// ============================================================================

/// A TPU location.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// `projects/{p}/locations/{zone}`.
    pub name: String,
    /// Zone ID, e.g. `us-central1-c`.
    pub location_id: String,
}

/// One page of locations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLocationsResponse {
    #[serde(default)]
    pub locations: Vec<Location>,
    pub next_page_token: Option<String>,
}

/// TPU node network configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TpuNetworkConfig {
    pub network: Option<String>,
    pub subnetwork: Option<String>,
    #[serde(default)]
    pub enable_external_ips: bool,
    #[serde(default)]
    pub can_ip_forward: bool,
}

/// Shielded VM settings; sent empty.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShieldedInstanceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_secure_boot: Option<bool>,
}

/// TPU node resource.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TpuNode {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub accelerator_type: String,
    #[serde(default)]
    pub runtime_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_config: Option<TpuNetworkConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shielded_instance_config: Option<ShieldedInstanceConfig>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

/// One page of nodes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNodesResponse {
    #[serde(default)]
    pub nodes: Vec<TpuNode>,
    pub next_page_token: Option<String>,
}

/// Status of a failed TPU operation (`google.rpc.Status`).
#[derive(Debug, Deserialize)]
pub struct RpcStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// TPU long-running operation.
#[derive(Debug, Deserialize)]
pub struct TpuOperation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    pub error: Option<RpcStatus>,
    pub response: Option<serde_json::Value>,
}
