//! Provisioning and teardown entry points.

use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::network::{provision_subnet, NetworkTopology};
use crate::node::{self, create_node, NodeOutcome, NodeSpec};
use crate::providers::{AcceleratorNode, CloudProvider};
use crate::settings::ProvisionSettings;
use crate::teardown;
use crate::zone::{ZoneCache, ZoneContext};

/// Request to provision a node and its network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub node: NodeSpec,
    /// Existing subnet (name or self-link) to attach to instead of creating one.
    pub subnet: Option<String>,
}

impl ProvisionRequest {
    /// Request a node that is stopped right after creation.
    pub fn new(
        name: impl Into<String>,
        runtime_version: impl Into<String>,
        accelerator_type: impl Into<String>,
    ) -> Self {
        Self {
            node: NodeSpec {
                name: name.into(),
                runtime_version: runtime_version.into(),
                accelerator_type: accelerator_type.into(),
                keep_running: false,
            },
            subnet: None,
        }
    }

    /// Attach to an existing subnet.
    #[must_use]
    pub fn with_subnet(mut self, subnet: impl Into<String>) -> Self {
        self.subnet = Some(subnet.into());
        self
    }

    /// Leave the node running after creation.
    #[must_use]
    pub fn keep_running(mut self, keep_running: bool) -> Self {
        self.node.keep_running = keep_running;
        self
    }
}

/// Result of [`Orchestrator::provision`].
#[derive(Debug, Clone)]
pub enum ProvisionOutcome {
    /// Network and node are in place.
    Provisioned {
        topology: NetworkTopology,
        node: AcceleratorNode,
    },
    /// The network is in place but the node could not be created for lack of
    /// quota. Nothing was rolled back.
    QuotaExhausted {
        topology: NetworkTopology,
        message: String,
        available_zones: Vec<String>,
    },
}

/// Composes zone resolution, network and node provisioning, and teardown.
///
/// Owns the zone cache; concurrent runs against the same names are only as
/// safe as the provider's "already exists"/"not found" semantics.
pub struct Orchestrator {
    provider: Arc<dyn CloudProvider>,
    zones: ZoneCache,
    settings: ProvisionSettings,
}

impl Orchestrator {
    /// Create an orchestrator with default settings.
    #[must_use]
    pub fn new(provider: Arc<dyn CloudProvider>) -> Self {
        Self::with_settings(provider, ProvisionSettings::default())
    }

    /// Create an orchestrator with explicit settings.
    #[must_use]
    pub fn with_settings(provider: Arc<dyn CloudProvider>, settings: ProvisionSettings) -> Self {
        Self {
            provider,
            zones: ZoneCache::new(),
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &ProvisionSettings {
        &self.settings
    }

    /// Resolve and validate a project/zone pair.
    ///
    /// # Errors
    /// See [`ZoneContext::resolve`].
    pub async fn context(
        &self,
        project: Option<String>,
        zone: Option<String>,
    ) -> Result<ZoneContext> {
        ZoneContext::resolve(
            self.provider.as_ref(),
            &self.zones,
            &self.settings,
            project,
            zone,
        )
        .await
    }

    /// Provision network, subnet, firewall and node for `request`.
    ///
    /// # Errors
    /// Returns the first fatal provider error. Quota exhaustion is not an
    /// error; it comes back as [`ProvisionOutcome::QuotaExhausted`].
    pub async fn provision(
        &self,
        ctx: &ZoneContext,
        request: &ProvisionRequest,
    ) -> Result<ProvisionOutcome> {
        let provider = self.provider.as_ref();
        let name = &request.node.name;

        let topology = provision_subnet(
            provider,
            ctx,
            &self.settings,
            name,
            request.subnet.as_deref(),
        )
        .await?;

        let outcome = match create_node(provider, ctx, &self.settings, &request.node, &topology)
            .await?
        {
            NodeOutcome::Provisioned(node) => {
                info!(node = %name, state = %node.state, "Provisioning complete");
                ProvisionOutcome::Provisioned { topology, node }
            }
            NodeOutcome::QuotaExhausted {
                message,
                available_zones,
            } => ProvisionOutcome::QuotaExhausted {
                topology,
                message,
                available_zones,
            },
        };
        Ok(outcome)
    }

    /// Delete node `name` and, unless `keep_network`, its network resources.
    ///
    /// # Errors
    /// See [`teardown::destroy`].
    pub async fn destroy(&self, ctx: &ZoneContext, name: &str, keep_network: bool) -> Result<()> {
        teardown::destroy(self.provider.as_ref(), ctx, name, keep_network).await
    }

    /// List nodes in the context zone, or in every available zone.
    ///
    /// # Errors
    /// Returns the provider error of the first failing listing.
    pub async fn list_nodes(
        &self,
        ctx: &ZoneContext,
        all_zones: bool,
    ) -> Result<Vec<AcceleratorNode>> {
        let parents = if all_zones {
            ctx.location_names()
        } else {
            vec![ctx.parent().to_string()]
        };

        let mut nodes = Vec::new();
        for parent in &parents {
            nodes.extend(self.provider.list_nodes(parent).await?);
        }
        Ok(nodes)
    }

    /// Fetch node `name`.
    ///
    /// # Errors
    /// Returns the provider error, including "not found".
    pub async fn get_node(&self, ctx: &ZoneContext, name: &str) -> Result<AcceleratorNode> {
        Ok(self.provider.get_node(&ctx.node_name(name)).await?)
    }

    /// Start node `name` and wait for it.
    ///
    /// # Errors
    /// Returns the provider error.
    pub async fn start_node(&self, ctx: &ZoneContext, name: &str) -> Result<AcceleratorNode> {
        Ok(node::start_node(self.provider.as_ref(), &ctx.node_name(name)).await?)
    }

    /// Stop node `name` and wait for it.
    ///
    /// # Errors
    /// Returns the provider error.
    pub async fn stop_node(&self, ctx: &ZoneContext, name: &str) -> Result<AcceleratorNode> {
        Ok(node::stop_node(self.provider.as_ref(), &ctx.node_name(name)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provision_request_builder() {
        let req = ProvisionRequest::new("exp1", "v2", "v2-8")
            .with_subnet("shared")
            .keep_running(true);
        assert_eq!(req.node.name, "exp1");
        assert_eq!(req.subnet.as_deref(), Some("shared"));
        assert!(req.node.keep_running);

        let default = ProvisionRequest::new("exp1", "v2", "v2-8");
        assert!(!default.node.keep_running);
        assert!(default.subnet.is_none());
    }
}
