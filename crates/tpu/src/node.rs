//! Accelerator node creation and power actions.

use std::time::Instant;

use tracing::{error, info, warn};

use crate::network::NetworkTopology;
use crate::providers::{
    AcceleratorNode, CloudProvider, NetworkConfig, NodeRequest, NodeState, Outcome,
    ProviderError,
};
use crate::settings::ProvisionSettings;
use crate::zone::ZoneContext;

/// What to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    /// Node ID, shared with its network resources.
    pub name: String,
    /// TPU software version, e.g. `tpu-ubuntu2204-base`.
    pub runtime_version: String,
    /// e.g. `v2-8`.
    pub accelerator_type: String,
    /// Leave the node running instead of stopping it after creation.
    pub keep_running: bool,
}

/// Result of a node creation attempt.
#[derive(Debug, Clone)]
pub enum NodeOutcome {
    /// The node exists and is `Ready`, or `Stopped` unless `keep_running`.
    Provisioned(AcceleratorNode),
    /// The provider is out of quota or capacity. Nothing was rolled back.
    QuotaExhausted {
        message: String,
        /// Zones worth retrying in.
        available_zones: Vec<String>,
    },
}

/// Build the creation request for `spec` attached to `topology`.
#[must_use]
pub fn node_request(
    settings: &ProvisionSettings,
    spec: &NodeSpec,
    topology: &NetworkTopology,
) -> NodeRequest {
    NodeRequest {
        node_id: spec.name.clone(),
        description: settings.node_description.clone(),
        accelerator_type: spec.accelerator_type.clone(),
        runtime_version: spec.runtime_version.clone(),
        network_config: NetworkConfig {
            network: topology.network_self_link.clone(),
            subnetwork: topology.subnet_self_link.clone(),
            enable_external_ips: true,
            can_ip_forward: true,
        },
        startup_script: settings.startup_script.clone(),
    }
}

/// Create the node and wait until it is ready, then stop it unless asked not to.
///
/// An existing node of the same name is reused once it has finished creating,
/// starting or stopping.
///
/// # Errors
/// Returns any provider error except resource exhaustion, which is reported
/// as [`NodeOutcome::QuotaExhausted`].
pub async fn create_node(
    provider: &dyn CloudProvider,
    ctx: &ZoneContext,
    settings: &ProvisionSettings,
    spec: &NodeSpec,
    topology: &NetworkTopology,
) -> Result<NodeOutcome, ProviderError> {
    info!(
        node = %spec.name,
        accelerator_type = %spec.accelerator_type,
        runtime_version = %spec.runtime_version,
        "Creating TPU node"
    );

    let request = node_request(settings, spec, topology);
    let op = match Outcome::from(provider.create_node(ctx.parent(), request).await) {
        Outcome::Success(op) => Some(op),
        Outcome::AlreadyExists(_) => {
            info!(node = %spec.name, "already exists");
            None
        }
        Outcome::ResourceExhausted(e) => return Ok(quota_exhausted(ctx, &e)),
        Outcome::NotFound(e) | Outcome::Failed(e) => return Err(e),
    };

    let node = match op {
        Some(op) => {
            info!(node = %spec.name, "Waiting for operation to complete");
            match Outcome::from(op.wait().await) {
                Outcome::Success(node) => node,
                Outcome::AlreadyExists(_) => provider.get_node(&ctx.node_name(&spec.name)).await?,
                Outcome::ResourceExhausted(e) => return Ok(quota_exhausted(ctx, &e)),
                Outcome::NotFound(e) | Outcome::Failed(e) => return Err(e),
            }
        }
        None => provider.get_node(&ctx.node_name(&spec.name)).await?,
    };
    let node = await_settled(provider, settings, node).await?;

    match node.state {
        NodeState::Ready => info!(node = %spec.name, "TPU node has been created"),
        NodeState::Stopped => info!(node = %spec.name, "TPU node exists and is stopped"),
        state => warn!(node = %spec.name, state = %state, "TPU node is not ready"),
    }

    if spec.keep_running || node.state == NodeState::Stopped {
        return Ok(NodeOutcome::Provisioned(node));
    }
    let node = stop_node(provider, &node.name).await?;
    Ok(NodeOutcome::Provisioned(node))
}

/// Stop a node and wait for it to reach `Stopped`.
///
/// # Errors
/// Returns the provider error if the stop request or operation fails.
pub async fn stop_node(
    provider: &dyn CloudProvider,
    name: &str,
) -> Result<AcceleratorNode, ProviderError> {
    info!(node = %name, "Stopping");
    let node = provider.stop_node(name).await?.wait().await?;
    info!(node = %name, state = %node.state, "Stopped");
    Ok(node)
}

/// Start a node and wait for it to come back up.
///
/// # Errors
/// Returns the provider error if the start request or operation fails.
pub async fn start_node(
    provider: &dyn CloudProvider,
    name: &str,
) -> Result<AcceleratorNode, ProviderError> {
    info!(node = %name, "Starting");
    let node = provider.start_node(name).await?.wait().await?;
    info!(node = %name, state = %node.state, "Started");
    Ok(node)
}

/// Re-read `node` until it leaves a transitional state.
///
/// # Errors
/// Returns the provider error of a failed lookup, or
/// [`ProviderError::Timeout`] once `settings.settle_timeout()` has passed.
pub async fn await_settled(
    provider: &dyn CloudProvider,
    settings: &ProvisionSettings,
    mut node: AcceleratorNode,
) -> Result<AcceleratorNode, ProviderError> {
    let start = Instant::now();
    while node.state.is_transitional() {
        if start.elapsed() > settings.settle_timeout() {
            return Err(ProviderError::Timeout(settings.settle_timeout_secs));
        }
        info!(node = %node.name, state = %node.state, "Waiting for TPU node to settle");
        tokio::time::sleep(settings.settle_poll_interval()).await;
        node = provider.get_node(&node.name).await?;
    }
    Ok(node)
}

fn quota_exhausted(ctx: &ZoneContext, e: &ProviderError) -> NodeOutcome {
    let available_zones = ctx.available_zones();
    error!(error = %e, "Resource exhausted");
    error!(
        available_zones = ?available_zones,
        "Try later or a different zone"
    );
    NodeOutcome::QuotaExhausted {
        message: e.to_string(),
        available_zones,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_request_attaches_topology() {
        let topology = NetworkTopology {
            network_name: "exp1".into(),
            subnet_name: "exp1".into(),
            subnet_self_link: "links/subnetworks/exp1".into(),
            network_self_link: "links/networks/exp1".into(),
            firewall_name: "exp1-allow-ssh".into(),
            cidr_range: "10.0.0.0/16".into(),
            externally_owned: false,
        };
        let spec = NodeSpec {
            name: "exp1".into(),
            runtime_version: "v2".into(),
            accelerator_type: "v2-8".into(),
            keep_running: false,
        };

        let req = node_request(&ProvisionSettings::default(), &spec, &topology);
        assert_eq!(req.node_id, "exp1");
        assert_eq!(req.network_config.network, "links/networks/exp1");
        assert_eq!(req.network_config.subnetwork, "links/subnetworks/exp1");
        assert!(req.network_config.enable_external_ips);
        assert!(req.network_config.can_ip_forward);
        assert!(req.startup_script.starts_with("#!/bin/bash"));
    }
}
