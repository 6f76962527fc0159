//! TPU CLI - provision and tear down TPU nodes with their networks.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tpu::{Gcp, NodeState, Orchestrator, ProvisionOutcome, ProvisionRequest, ProvisionSettings};

/// TPU CLI - Provision ephemeral TPU nodes for accelerator experiments.
#[derive(Parser)]
#[command(name = "tpu")]
#[command(about = "Provision and tear down TPU nodes and their networks")]
struct Cli {
    /// GCP project (or set `GOOGLE_CLOUD_PROJECT`; falls back to gcloud config).
    #[arg(long, env = "GOOGLE_CLOUD_PROJECT", default_value = "")]
    project: String,

    /// Zone to use (defaults to us-central1-c).
    #[arg(long, env = "TPU_ZONE", default_value = "")]
    zone: String,

    /// OAuth access token (or set `GOOGLE_OAUTH_ACCESS_TOKEN`; falls back to gcloud).
    #[arg(long, env = "GOOGLE_OAUTH_ACCESS_TOKEN", default_value = "", hide_env_values = true)]
    access_token: String,

    /// Enable verbose logging.
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create network, subnet, firewall rule and TPU node.
    Provision {
        /// Name shared by the node and its network resources.
        #[arg(long)]
        name: String,

        /// TPU runtime version.
        #[arg(long)]
        runtime_version: String,

        /// TPU accelerator type (e.g. v2-8).
        #[arg(long)]
        accelerator_type: String,

        /// Existing subnet name or self-link to use instead of creating one.
        #[arg(long)]
        subnet: Option<String>,

        /// Leave the node running after creation.
        #[arg(long, default_value = "false")]
        keep_running: bool,
    },

    /// Delete the TPU node and its network resources.
    Destroy {
        /// Name used at provisioning time.
        #[arg(long)]
        name: String,

        /// Keep network, subnet and firewall rule.
        #[arg(long, default_value = "false")]
        keep_network: bool,
    },

    /// List TPU nodes.
    List {
        /// List nodes in every available zone.
        #[arg(long, default_value = "false")]
        all_zones: bool,
    },

    /// Start a stopped TPU node.
    Start {
        /// Node name.
        #[arg(long)]
        name: String,
    },

    /// Stop a running TPU node.
    Stop {
        /// Node name.
        #[arg(long)]
        name: String,
    },

    /// List zones available to the project.
    Zones,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let project = non_empty(&cli.project);
    let zone = non_empty(&cli.zone);

    // Create provider
    let provider = match non_empty(&cli.access_token) {
        Some(token) => Gcp::new(token, project.clone()),
        None => Gcp::from_environment(project.clone()).await,
    }
    .context("Failed to create GCP provider")?;

    let orchestrator = Orchestrator::with_settings(Arc::new(provider), ProvisionSettings::default());
    let ctx = orchestrator.context(project, zone).await?;

    match cli.command {
        Commands::Provision {
            name,
            runtime_version,
            accelerator_type,
            subnet,
            keep_running,
        } => {
            let mut request = ProvisionRequest::new(&name, runtime_version, accelerator_type)
                .keep_running(keep_running);
            if let Some(subnet) = subnet {
                request = request.with_subnet(subnet);
            }

            match orchestrator.provision(&ctx, &request).await? {
                ProvisionOutcome::Provisioned { topology, node } => {
                    println!("\n✅ TPU node provisioned!");
                    println!("   Node:     {}", node.name);
                    println!("   State:    {}", node.state);
                    println!("   Subnet:   {} ({})", topology.subnet_name, topology.cidr_range);
                    println!("   Firewall: {}", topology.firewall_name);
                    if node.state == NodeState::Stopped {
                        println!("\n💡 Run `tpu start --name {name}` when you need it");
                    }
                }
                ProvisionOutcome::QuotaExhausted {
                    message,
                    available_zones,
                    ..
                } => {
                    println!("\n⚠️  Resource exhausted: {message}");
                    println!("   Try later or a different zone. Available zones:");
                    println!("   {}", available_zones.join(", "));
                    println!("\n💡 Run `tpu destroy --name {name}` to remove the network");
                }
            }
        }

        Commands::Destroy { name, keep_network } => {
            info!(name = %name, keep_network, "Destroying");
            orchestrator.destroy(&ctx, &name, keep_network).await?;
            println!("\n✅ {name} destroyed");
        }

        Commands::List { all_zones } => {
            let nodes = orchestrator.list_nodes(&ctx, all_zones).await?;

            println!(
                "\n{:<60} {:<12} {:<12} {:<20}",
                "NAME", "TYPE", "STATE", "RUNTIME"
            );
            println!("{}", "-".repeat(106));

            for node in nodes {
                let state_emoji = match node.state {
                    NodeState::Ready => "🟢",
                    NodeState::Creating | NodeState::Starting | NodeState::Stopping => "🟡",
                    NodeState::Stopped => "🔴",
                    _ => "⚪",
                };

                println!(
                    "{:<60} {:<12} {} {:<10} {:<20}",
                    node.name, node.accelerator_type, state_emoji, node.state, node.runtime_version
                );
            }
            println!();
        }

        Commands::Start { name } => {
            let node = orchestrator.start_node(&ctx, &name).await?;
            println!("\n✅ {} is {}", node.name, node.state);
        }

        Commands::Stop { name } => {
            let node = orchestrator.stop_node(&ctx, &name).await?;
            println!("\n✅ {} is {}", node.name, node.state);
        }

        Commands::Zones => {
            println!("\n📍 Zones available in {}", ctx.project());
            for zone in ctx.available_zones() {
                println!("   {zone}");
            }
            println!();
        }
    }

    Ok(())
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
