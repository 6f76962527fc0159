//! Google Cloud provider.
//!
//! Implements the [`CloudProvider`] trait on top of two REST APIs:
//!
//! - **Compute Engine v1** - networks, subnetworks, firewall rules
//! - **Cloud TPU v2** - locations and accelerator nodes
//!
//! ## Example
//!
//! ```ignore
//! use tpu::providers::gcp::Gcp;
//! use tpu::providers::traits::CloudProvider;
//!
//! let provider = Gcp::from_environment(None).await?;
//! let zones = provider.list_locations("my-project", 1000).await?;
//! ```
//!
//! [`CloudProvider`]: crate::providers::traits::CloudProvider

pub mod auth;
mod client;
mod models;

pub use client::Gcp;
