//! Ephemeral TPU provisioning for accelerator experiments.
//!
//! This crate creates a TPU node together with the network it needs
//! (VPC network, subnet, SSH firewall rule) and tears all of it down again.
//!
//! ## Flow
//!
//! ```text
//! provision:  ZoneContext ──► provision_subnet ──► create_node
//!                              network             submit
//!                              subnet (submit) ┐   wait Ready
//!                              firewall (wait) │   stop (unless keep_running)
//!                              subnet (wait) ◄─┘
//!
//! destroy:    ZoneContext ──► node ──► firewall ──► subnet ──► network
//!                             every step tolerates "not found"
//! ```
//!
//! Creation tolerates "already exists" at every step, so provisioning is
//! idempotent per name. Quota exhaustion during node creation is reported,
//! not raised.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tpu::{Gcp, Orchestrator, ProvisionRequest};
//!
//! let provider = Arc::new(Gcp::from_environment(None).await?);
//! let orchestrator = Orchestrator::new(provider);
//! let ctx = orchestrator.context(None, Some("us-central1-c".into())).await?;
//!
//! orchestrator
//!     .provision(&ctx, &ProvisionRequest::new("exp1", "tpu-ubuntu2204-base", "v2-8"))
//!     .await?;
//!
//! orchestrator.destroy(&ctx, "exp1", false).await?;
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod network;
pub mod node;
pub mod orchestrator;
pub mod providers;
pub mod settings;
pub mod teardown;
pub mod zone;

pub use error::{Error, Result, StepFailure};
pub use network::{NetworkTopology, FIREWALL_SUFFIX};
pub use node::{NodeOutcome, NodeSpec};
pub use orchestrator::{Orchestrator, ProvisionOutcome, ProvisionRequest};
pub use providers::gcp::Gcp;
pub use providers::{AcceleratorNode, CloudProvider, NodeState, ProviderError};
pub use settings::ProvisionSettings;
pub use teardown::Removal;
pub use zone::{ZoneCache, ZoneContext};
