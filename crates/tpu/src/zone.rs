//! Project/zone resolution and the per-project zone cache.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::providers::{CloudProvider, ProviderError};
use crate::settings::ProvisionSettings;

/// Zone ID to location resource name.
pub type ZoneMap = BTreeMap<String, String>;

/// Available zones per project, fetched once and kept for the owner's lifetime.
#[derive(Debug, Default)]
pub struct ZoneCache {
    entries: RwLock<HashMap<String, Arc<ZoneMap>>>,
}

impl ZoneCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Zones for `project`, listing them from the provider on first use.
    ///
    /// # Errors
    /// Returns the provider error if the listing fails. Failures are not cached.
    pub async fn available_zones(
        &self,
        provider: &dyn CloudProvider,
        project: &str,
        page_size: u32,
    ) -> Result<Arc<ZoneMap>, ProviderError> {
        if let Some(zones) = self.entries.read().await.get(project) {
            debug!(project = %project, "Zone list cache hit");
            return Ok(Arc::clone(zones));
        }

        let zones = Arc::new(provider.list_locations(project, page_size).await?);
        debug!(project = %project, count = zones.len(), "Fetched zone list");

        let mut entries = self.entries.write().await;
        Ok(Arc::clone(
            entries.entry(project.to_string()).or_insert(zones),
        ))
    }

    /// Number of cached projects.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing has been cached yet.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Immutable addressing for one provisioning or teardown call.
#[derive(Debug, Clone)]
pub struct ZoneContext {
    project: String,
    zone: String,
    region: String,
    parent: String,
    zones: Arc<ZoneMap>,
}

impl ZoneContext {
    /// Resolve `project` and `zone`, validating the zone against the provider.
    ///
    /// A missing project comes from the provider's ambient discovery; a missing
    /// zone falls back to `settings.fallback_zone`.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the project cannot be found or the zone is
    /// not available, and [`Error::Provider`] if listing zones fails.
    pub async fn resolve(
        provider: &dyn CloudProvider,
        cache: &ZoneCache,
        settings: &ProvisionSettings,
        project: Option<String>,
        zone: Option<String>,
    ) -> Result<Self> {
        let project = match project.filter(|p| !p.trim().is_empty()) {
            Some(project) => project,
            None => provider.default_project().await.map_err(|e| Error::Config {
                message: format!("could not determine project: {e}"),
                available_zones: Vec::new(),
            })?,
        };
        let zone = zone
            .filter(|z| !z.trim().is_empty())
            .unwrap_or_else(|| settings.fallback_zone.clone());

        let zones = cache
            .available_zones(provider, &project, settings.page_size())
            .await?;

        if !zones.contains_key(&zone) {
            let available: Vec<String> = zones.keys().cloned().collect();
            error!(project = %project, zone = %zone, available = ?available, "Zone not available");
            return Err(Error::Config {
                message: format!("zone {zone} is not available in project {project}"),
                available_zones: available,
            });
        }

        let region = region_of(&zone)
            .ok_or_else(|| Error::Config {
                message: format!("zone {zone} has no region suffix"),
                available_zones: Vec::new(),
            })?
            .to_string();

        info!(project = %project, zone = %zone, "Using project and zone");

        Ok(Self {
            parent: format!("projects/{project}/locations/{zone}"),
            project,
            zone,
            region,
            zones,
        })
    }

    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    #[must_use]
    pub fn zone(&self) -> &str {
        &self.zone
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// `projects/{project}/locations/{zone}`.
    #[must_use]
    pub fn parent(&self) -> &str {
        &self.parent
    }

    /// Full resource name of node `id` in this zone.
    #[must_use]
    pub fn node_name(&self, id: &str) -> String {
        format!("{}/nodes/{id}", self.parent)
    }

    /// Zone IDs available to the project, sorted.
    #[must_use]
    pub fn available_zones(&self) -> Vec<String> {
        self.zones.keys().cloned().collect()
    }

    /// Location resource names of every available zone.
    #[must_use]
    pub fn location_names(&self) -> Vec<String> {
        self.zones.values().cloned().collect()
    }
}

/// Region of a zone: the zone minus its trailing `-<suffix>`.
#[must_use]
pub fn region_of(zone: &str) -> Option<&str> {
    zone.rsplit_once('-')
        .map(|(region, _)| region)
        .filter(|region| !region.is_empty())
}
