//! zunletd — drive the capsule-backed pod provider from the command line.
//!
//! Every subcommand builds one [`ZunProvider`] from `zunlet.toml` plus the
//! environment (`ZUN_ENDPOINT`, `OS_AUTH_TOKEN`, `OS_REGION_NAME`), runs a
//! single provider operation and prints the result as JSON.
//!
//! # Usage
//!
//! ```text
//! zunletd --config /etc/zunlet/zunlet.toml pods
//! zunletd create --file web.json
//! zunletd status ns1 web
//! zunletd delete ns1 web
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use zunlet_provider::ZunProvider;

mod commands;

#[derive(Parser)]
#[command(
    name = "zunletd",
    about = "Run pods as remote capsules",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to zunlet.toml. Defaults apply when the file is absent.
    #[arg(long, env = "ZUNLET_CONFIG", default_value = "zunlet.toml", global = true)]
    config: PathBuf,

    /// Override the node name pods are matched against.
    #[arg(long, global = true)]
    node_name: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the pods placed on this node.
    Pods,
    /// Show one pod.
    Get { namespace: String, name: String },
    /// Show one pod's status (null when it does not exist).
    Status { namespace: String, name: String },
    /// Create a pod from a JSON manifest.
    Create {
        /// Pod manifest, as printed by `kubectl get pod -o json`.
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Delete a pod's capsule.
    Delete { namespace: String, name: String },
    /// Show what this node reports to the control plane.
    Node,
    /// Fetch container logs.
    Logs {
        namespace: String,
        pod: String,
        container: String,
        /// Number of trailing lines.
        #[arg(long, default_value = "100")]
        tail: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,zunlet=debug".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(&cli.config, cli.node_name.as_deref())?;
    info!(node = %config.node.name, config = ?cli.config, "configuration loaded");

    let provider = ZunProvider::from_config(config)?;

    let output = match cli.command {
        Command::Pods => commands::pods::list(&provider).await?,
        Command::Get { namespace, name } => {
            commands::pods::get(&provider, &namespace, &name).await?
        }
        Command::Status { namespace, name } => {
            commands::pods::status(&provider, &namespace, &name).await?
        }
        Command::Create { file } => commands::pods::create(&provider, &file).await?,
        Command::Delete { namespace, name } => {
            commands::pods::delete(&provider, &namespace, &name).await?
        }
        Command::Node => commands::node::report(&provider),
        Command::Logs {
            namespace,
            pod,
            container,
            tail,
        } => commands::pods::logs(&provider, &namespace, &pod, &container, tail).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
