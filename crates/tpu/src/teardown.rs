//! Teardown in reverse dependency order.
//!
//! "Not found" counts as success at every step, and each step is attempted
//! even when an earlier one failed. Nothing is retried.

use tracing::{error, info};

use crate::error::{Error, Result, StepFailure};
use crate::network::firewall_name;
use crate::providers::{complete, CloudProvider, Operation, Outcome, ProviderError};
use crate::zone::ZoneContext;

/// How a delete step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Deleted,
    /// Nothing to delete.
    NotFound,
}

/// Delete node `name` if it exists.
///
/// # Errors
/// Returns any provider error other than "not found".
pub async fn destroy_node(
    provider: &dyn CloudProvider,
    ctx: &ZoneContext,
    name: &str,
) -> Result<Removal, ProviderError> {
    info!(node = %name, "Deleting TPU node");

    let node = match Outcome::from(provider.get_node(&ctx.node_name(name)).await) {
        Outcome::Success(node) => node,
        Outcome::NotFound(_) => {
            info!(node = %name, "TPU node not found");
            return Ok(Removal::NotFound);
        }
        Outcome::AlreadyExists(e) | Outcome::ResourceExhausted(e) | Outcome::Failed(e) => {
            error!(node = %name, error = %e, "Failed to look up TPU node");
            return Err(e);
        }
    };

    delete_step("node", name, provider.delete_node(&node.name).await).await
}

/// Delete firewall `name-allow-ssh`, subnet `name` and network `name`.
///
/// # Errors
/// Returns [`Error::Teardown`] listing every step that failed.
pub async fn destroy_network(
    provider: &dyn CloudProvider,
    ctx: &ZoneContext,
    name: &str,
) -> Result<()> {
    let failures = network_failures(provider, ctx, name).await;
    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::Teardown {
            name: name.to_string(),
            failures,
        })
    }
}

/// Delete the node, then its network unless `keep_network`.
///
/// Network cleanup runs even when node cleanup fails.
///
/// # Errors
/// Returns [`Error::Teardown`] listing every step that failed.
pub async fn destroy(
    provider: &dyn CloudProvider,
    ctx: &ZoneContext,
    name: &str,
    keep_network: bool,
) -> Result<()> {
    let mut failures = Vec::new();

    if let Err(e) = destroy_node(provider, ctx, name).await {
        failures.push(StepFailure::new(format!("node {name}"), e));
    }

    if keep_network {
        info!(network = %name, "Keeping network, subnetwork and firewall rule");
    } else {
        failures.extend(network_failures(provider, ctx, name).await);
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::Teardown {
            name: name.to_string(),
            failures,
        })
    }
}

async fn network_failures(
    provider: &dyn CloudProvider,
    ctx: &ZoneContext,
    name: &str,
) -> Vec<StepFailure> {
    let mut failures = Vec::new();

    let fw_name = firewall_name(name);
    info!(firewall = %fw_name, "Deleting firewall rule");
    let submitted = provider.delete_firewall(ctx.project(), &fw_name).await;
    if let Err(e) = delete_step("firewall", &fw_name, submitted).await {
        failures.push(StepFailure::new(format!("firewall {fw_name}"), e));
    }

    info!(subnetwork = %name, "Deleting subnetwork");
    let submitted = provider
        .delete_subnetwork(ctx.project(), ctx.region(), name)
        .await;
    if let Err(e) = delete_step("subnetwork", name, submitted).await {
        failures.push(StepFailure::new(format!("subnetwork {name}"), e));
    }

    info!(network = %name, "Deleting network");
    let submitted = provider.delete_network(ctx.project(), name).await;
    if let Err(e) = delete_step("network", name, submitted).await {
        failures.push(StepFailure::new(format!("network {name}"), e));
    }

    failures
}

/// Wait on a delete and accept success or "not found".
async fn delete_step(
    kind: &str,
    name: &str,
    submitted: Result<Operation<()>, ProviderError>,
) -> Result<Removal, ProviderError> {
    match Outcome::from(complete(submitted).await) {
        Outcome::Success(()) => {
            info!(kind, name, "done");
            Ok(Removal::Deleted)
        }
        Outcome::NotFound(_) => {
            info!(kind, name, "not found");
            Ok(Removal::NotFound)
        }
        Outcome::AlreadyExists(e) | Outcome::ResourceExhausted(e) | Outcome::Failed(e) => {
            error!(kind, name, error = %e, "Delete failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_step_tolerates_not_found() {
        let missing: Result<Operation<()>, ProviderError> = Err(ProviderError::NotFound("exp1".into()));
        assert_eq!(
            delete_step("network", "exp1", missing).await.unwrap(),
            Removal::NotFound
        );

        let late_missing: Result<Operation<()>, ProviderError> = Ok(Operation::new("delete network exp1", async {
            Err(ProviderError::NotFound("exp1".into()))
        }));
        assert_eq!(
            delete_step("network", "exp1", late_missing).await.unwrap(),
            Removal::NotFound
        );

        let deleted: Result<Operation<()>, ProviderError> = Ok(Operation::done("delete network exp1", ()));
        assert_eq!(
            delete_step("network", "exp1", deleted).await.unwrap(),
            Removal::Deleted
        );
    }

    #[tokio::test]
    async fn test_delete_step_propagates_other_errors() {
        let failed: Result<Operation<()>, ProviderError> = Err(ProviderError::Api {
            status: 403,
            message: "denied".into(),
        });
        assert!(matches!(
            delete_step("firewall", "exp1-allow-ssh", failed).await,
            Err(ProviderError::Api { status: 403, .. })
        ));
    }
}
