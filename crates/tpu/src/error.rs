//! Orchestrator error types.

use std::fmt;

use thiserror::Error;

use crate::providers::ProviderError;

/// Errors surfaced by the orchestrator.
#[derive(Error, Debug)]
pub enum Error {
    /// Project or zone could not be resolved.
    #[error("{message}{}", zones_hint(.available_zones))]
    Config {
        message: String,
        /// Zones the caller could retry with.
        available_zones: Vec<String>,
    },

    /// Provider error, unchanged.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// One or more teardown steps failed; the others were still attempted.
    #[error("teardown of {name} incomplete: {}", join_failures(.failures))]
    Teardown {
        name: String,
        failures: Vec<StepFailure>,
    },
}

/// Result alias for orchestrator operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A failed teardown step.
#[derive(Debug)]
pub struct StepFailure {
    /// e.g. `firewall exp1-allow-ssh`.
    pub resource: String,
    pub source: ProviderError,
}

impl StepFailure {
    #[must_use]
    pub fn new(resource: impl Into<String>, source: ProviderError) -> Self {
        Self {
            resource: resource.into(),
            source,
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.resource, self.source)
    }
}

fn zones_hint(zones: &[String]) -> String {
    if zones.is_empty() {
        String::new()
    } else {
        format!("; available zones: {}", zones.join(", "))
    }
}

fn join_failures(failures: &[StepFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
