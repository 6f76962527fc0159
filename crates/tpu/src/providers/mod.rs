//! Cloud provider implementations.
//!
//! This module contains the [`CloudProvider`] trait and the Google Cloud
//! implementation used by the orchestrator.

pub mod gcp;
pub mod traits;

pub use traits::{
    complete, AcceleratorNode, AllowedTraffic, CloudProvider, Direction, FirewallRule, Network,
    NetworkConfig, NetworkRequest, NodeRequest, NodeState, Operation, Outcome, ProviderError,
    RoutingMode, Subnetwork, SubnetworkRequest,
};
