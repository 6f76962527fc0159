//! Provisioning settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Zone used when none is given.
pub const DEFAULT_ZONE: &str = "us-central1-c";

/// Address block of every created subnet.
pub const DEFAULT_CIDR_RANGE: &str = "10.0.0.0/16";

/// Largest page the locations API accepts.
pub const MAX_LOCATIONS_PAGE_SIZE: u32 = 1000;

/// Installs the TPU runtime and the FHE workload library on first boot.
pub const DEFAULT_STARTUP_SCRIPT: &str = r#"#!/bin/bash
set -eux
pip install -U "jax[tpu]" -f https://storage.googleapis.com/jax-releases/libtpu_releases.html
pip install jax==0.6.0
pip install jaxlib==0.6.0
pip install jaxite
pip install absl-py
"#;

/// Knobs for network and node provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionSettings {
    /// Zone used when the caller gives none.
    pub fallback_zone: String,
    /// CIDR of created subnets.
    pub cidr_range: String,
    /// Priority of the SSH firewall rule.
    pub firewall_priority: u32,
    /// Source range allowed to reach port 22.
    pub ssh_source_range: String,
    /// Description attached to created nodes.
    pub node_description: String,
    /// First-boot script for created nodes.
    pub startup_script: String,
    /// Page size for the locations listing, capped at [`MAX_LOCATIONS_PAGE_SIZE`].
    pub locations_page_size: u32,
    /// Delay between lookups of a node still creating, starting or stopping.
    pub settle_poll_secs: u64,
    /// How long to wait for such a node before giving up.
    pub settle_timeout_secs: u64,
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            fallback_zone: DEFAULT_ZONE.to_string(),
            cidr_range: DEFAULT_CIDR_RANGE.to_string(),
            firewall_priority: 1000,
            ssh_source_range: "0.0.0.0/0".to_string(),
            node_description: "Created automatically for accelerator experiments".to_string(),
            startup_script: DEFAULT_STARTUP_SCRIPT.to_string(),
            locations_page_size: MAX_LOCATIONS_PAGE_SIZE,
            settle_poll_secs: 5,
            settle_timeout_secs: 1800,
        }
    }
}

impl ProvisionSettings {
    /// Page size actually sent to the provider.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.locations_page_size.clamp(1, MAX_LOCATIONS_PAGE_SIZE)
    }

    #[must_use]
    pub fn settle_poll_interval(&self) -> Duration {
        Duration::from_secs(self.settle_poll_secs)
    }

    #[must_use]
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_secs(self.settle_timeout_secs)
    }
}
