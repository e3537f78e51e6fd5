//! Egg commands.

use anyhow::Result;
use brood_api::Egg;
use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::output::{print_output, print_single, OutputFormat};

use super::{age_cell, CommandContext};

/// Egg commands.
#[derive(Debug, Args)]
pub struct EggsCommand {
    #[command(subcommand)]
    command: EggsSubcommand,
}

#[derive(Debug, Subcommand)]
enum EggsSubcommand {
    /// List eggs in the namespace.
    List(ListEggsArgs),

    /// Get egg details.
    Get(GetEggArgs),
}

#[derive(Debug, Args)]
struct ListEggsArgs {
    /// Only show eggs with this parent bird.
    #[arg(long)]
    bird: Option<String>,
}

#[derive(Debug, Args)]
struct GetEggArgs {
    /// Egg name.
    name: String,
}

impl EggsCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            EggsSubcommand::List(args) => list_eggs(ctx, args).await,
            EggsSubcommand::Get(args) => get_egg(ctx, args).await,
        }
    }
}

/// Table row for an egg.
#[derive(Debug, Clone, Serialize, Tabled)]
pub(super) struct EggRow {
    #[tabled(rename = "Name")]
    name: String,

    #[tabled(rename = "Parent")]
    parent: String,

    #[tabled(rename = "Controller")]
    controller: String,

    #[tabled(rename = "Created")]
    created_at: String,
}

impl From<&Egg> for EggRow {
    fn from(egg: &Egg) -> Self {
        Self {
            name: egg.metadata.name.clone(),
            parent: egg.spec.parent.clone(),
            controller: egg
                .metadata
                .controller_ref()
                .map(|r| format!("{}/{}", r.kind, r.name))
                .unwrap_or_else(|| "<none>".to_string()),
            created_at: age_cell(egg.metadata.creation_timestamp),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct ListEggsResponse {
    items: Vec<Egg>,
    total: usize,
}

async fn list_eggs(ctx: CommandContext, args: ListEggsArgs) -> Result<()> {
    let client = ctx.client()?;
    let path = match args.bird.as_deref() {
        Some(bird) => format!("{}/{bird}/eggs", ctx.collection_path("birds")),
        None => ctx.collection_path("eggs"),
    };
    let response: ListEggsResponse = client.get(&path).await?;

    match ctx.format {
        OutputFormat::Table => {
            let rows: Vec<EggRow> = response.items.iter().map(EggRow::from).collect();
            print_output(&rows, ctx.format);
        }
        OutputFormat::Json => print_single(&response),
    }

    Ok(())
}

async fn get_egg(ctx: CommandContext, args: GetEggArgs) -> Result<()> {
    let client = ctx.client()?;
    let path = format!("{}/{}", ctx.collection_path("eggs"), args.name);
    let egg: Egg = client.get(&path).await?;

    match ctx.format {
        OutputFormat::Table => print_output(&[EggRow::from(&egg)], ctx.format),
        OutputFormat::Json => print_single(&egg),
    }

    Ok(())
}
