//! Network, subnet and firewall provisioning.
//!
//! Every step treats "already exists" as success, so provisioning the same
//! name twice converges on the same topology.

use serde::Serialize;
use tracing::{error, info};

use crate::providers::{
    complete, AllowedTraffic, CloudProvider, Direction, FirewallRule, NetworkRequest, Outcome,
    ProviderError, RoutingMode, Subnetwork, SubnetworkRequest,
};
use crate::settings::ProvisionSettings;
use crate::zone::ZoneContext;

/// Suffix appended to a deployment name to form its firewall rule name.
pub const FIREWALL_SUFFIX: &str = "-allow-ssh";

/// Name of the SSH firewall rule paired with `name`.
#[must_use]
pub fn firewall_name(name: &str) -> String {
    format!("{name}{FIREWALL_SUFFIX}")
}

/// The network resources a node attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkTopology {
    pub network_name: String,
    pub subnet_name: String,
    pub subnet_self_link: String,
    pub network_self_link: String,
    pub firewall_name: String,
    pub cidr_range: String,
    /// Supplied by the caller; never created or deleted here.
    pub externally_owned: bool,
}

impl NetworkTopology {
    fn from_subnet(subnet: Subnetwork, externally_owned: bool) -> Self {
        Self {
            network_name: last_segment(&subnet.network).to_string(),
            firewall_name: firewall_name(&subnet.name),
            subnet_name: subnet.name,
            subnet_self_link: subnet.self_link,
            network_self_link: subnet.network,
            cidr_range: subnet.ip_cidr_range,
            externally_owned,
        }
    }
}

/// Ensure network, subnet and firewall `name` exist and return the subnet.
///
/// With `external_subnet` (a name or self-link) nothing is created; the
/// existing subnet is fetched and marked externally owned.
///
/// Subnet creation is submitted before the firewall and only awaited after the
/// firewall completes.
///
/// # Errors
/// Any provider error other than "already exists" is returned unchanged.
pub async fn provision_subnet(
    provider: &dyn CloudProvider,
    ctx: &ZoneContext,
    settings: &ProvisionSettings,
    name: &str,
    external_subnet: Option<&str>,
) -> Result<NetworkTopology, ProviderError> {
    if let Some(subnet) = external_subnet {
        let subnet_name = last_segment(subnet);
        info!(subnet = %subnet_name, region = %ctx.region(), "Using existing subnetwork");
        let subnet = provider
            .get_subnetwork(ctx.project(), ctx.region(), subnet_name)
            .await?;
        return Ok(NetworkTopology::from_subnet(subnet, true));
    }

    info!(network = %name, "Provisioning network");
    let created = complete(
        provider
            .insert_network(
                ctx.project(),
                NetworkRequest {
                    name: name.to_string(),
                    auto_create_subnetworks: false,
                    routing_mode: RoutingMode::Regional,
                },
            )
            .await,
    )
    .await;
    tolerate_existing("network", name, Outcome::from(created))?;
    let network = provider.get_network(ctx.project(), name).await?;

    info!(subnetwork = %name, region = %ctx.region(), "Provisioning subnetwork");
    let submitted = provider
        .insert_subnetwork(
            ctx.project(),
            SubnetworkRequest {
                name: name.to_string(),
                region: ctx.region().to_string(),
                network: network.self_link.clone(),
                ip_cidr_range: settings.cidr_range.clone(),
                stack_type: "IPV4_ONLY".to_string(),
            },
        )
        .await;
    let pending_subnet = match Outcome::from(submitted) {
        Outcome::Success(op) => {
            info!(subnetwork = %name, "submitted");
            Some(op)
        }
        Outcome::AlreadyExists(_) => {
            info!(subnetwork = %name, "already exists");
            None
        }
        Outcome::NotFound(e) | Outcome::ResourceExhausted(e) | Outcome::Failed(e) => {
            error!(subnetwork = %name, error = %e, "Subnetwork creation failed");
            return Err(e);
        }
    };

    let fw_name = firewall_name(name);
    info!(firewall = %fw_name, "Provisioning firewall rule");
    let created = complete(
        provider
            .insert_firewall(
                ctx.project(),
                FirewallRule {
                    name: fw_name.clone(),
                    network: network.self_link.clone(),
                    direction: Direction::Ingress,
                    allowed: vec![AllowedTraffic {
                        protocol: "tcp".to_string(),
                        ports: vec!["22".to_string()],
                    }],
                    source_ranges: vec![settings.ssh_source_range.clone()],
                    priority: settings.firewall_priority,
                    log_enabled: false,
                },
            )
            .await,
    )
    .await;
    tolerate_existing("firewall", &fw_name, Outcome::from(created))?;

    if let Some(op) = pending_subnet {
        info!(subnetwork = %name, "Waiting for subnetwork");
        tolerate_existing("subnetwork", name, Outcome::from(op.wait().await))?;
    }

    let subnet = provider
        .get_subnetwork(ctx.project(), ctx.region(), name)
        .await?;
    Ok(NetworkTopology::from_subnet(subnet, false))
}

/// Accept success or "already exists"; anything else is fatal.
fn tolerate_existing(
    kind: &str,
    name: &str,
    outcome: Outcome<()>,
) -> Result<(), ProviderError> {
    match outcome {
        Outcome::Success(()) => {
            info!(kind, name, "done");
            Ok(())
        }
        Outcome::AlreadyExists(_) => {
            info!(kind, name, "already exists");
            Ok(())
        }
        Outcome::NotFound(e) | Outcome::ResourceExhausted(e) | Outcome::Failed(e) => {
            error!(kind, name, error = %e, "Provisioning failed");
            Err(e)
        }
    }
}

pub(crate) fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}
