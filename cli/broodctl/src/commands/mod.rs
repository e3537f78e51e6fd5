//! CLI commands.

mod birds;
mod eggs;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::client::ApiClient;
use crate::output::OutputFormat;

/// broodctl - Manage birds and inspect their eggs.
#[derive(Debug, Parser)]
#[command(name = "broodctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// Controller API base URL.
    #[arg(
        long,
        global = true,
        env = "BROOD_API_URL",
        default_value = "http://127.0.0.1:8080"
    )]
    api_url: String,

    /// Namespace to operate in.
    #[arg(short, long, global = true, env = "BROOD_NAMESPACE", default_value = "default")]
    namespace: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage birds.
    Birds(birds::BirdsCommand),

    /// Inspect eggs.
    Eggs(eggs::EggsCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let ctx = CommandContext {
            api_url: self.api_url,
            namespace: self.namespace,
            format: OutputFormat::parse(&self.format),
        };

        match self.command {
            Commands::Birds(cmd) => cmd.run(ctx).await,
            Commands::Eggs(cmd) => cmd.run(ctx).await,
            Commands::Version => {
                println!("broodctl {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub api_url: String,
    pub namespace: String,
    pub format: OutputFormat,
}

impl CommandContext {
    pub fn client(&self) -> Result<ApiClient> {
        ApiClient::new(&self.api_url)
    }

    /// Path of a namespaced collection, e.g. `/v1/namespaces/default/birds`.
    pub fn collection_path(&self, resource: &str) -> String {
        format!("/v1/namespaces/{}/{}", self.namespace, resource)
    }
}

/// Render an optional count, showing `-` when unset.
fn count_cell(value: Option<i32>) -> String {
    value.map_or_else(|| "-".to_string(), |n| n.to_string())
}

fn age_cell(created: Option<chrono::DateTime<chrono::Utc>>) -> String {
    created
        .map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_default()
}
