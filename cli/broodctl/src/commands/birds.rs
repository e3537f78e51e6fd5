//! Bird commands.

use anyhow::Result;
use brood_api::{Bird, Egg};
use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::output::{print_output, print_single, print_success, OutputFormat};

use super::eggs::EggRow;
use super::{age_cell, count_cell, CommandContext};

/// Bird commands.
#[derive(Debug, Args)]
pub struct BirdsCommand {
    #[command(subcommand)]
    command: BirdsSubcommand,
}

#[derive(Debug, Subcommand)]
enum BirdsSubcommand {
    /// List birds in the namespace.
    List,

    /// Get bird details.
    Get(BirdNameArgs),

    /// Create or update a bird.
    Apply(ApplyBirdArgs),

    /// Delete a bird. Its eggs are garbage-collected.
    Delete(BirdNameArgs),

    /// List the eggs a bird controls.
    Eggs(BirdNameArgs),
}

#[derive(Debug, Args)]
struct BirdNameArgs {
    /// Bird name.
    name: String,
}

#[derive(Debug, Args)]
struct ApplyBirdArgs {
    /// Bird name.
    name: String,

    /// Desired number of eggs. Omit to leave it unset.
    #[arg(long)]
    eggs: Option<i32>,
}

impl BirdsCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            BirdsSubcommand::List => list_birds(ctx).await,
            BirdsSubcommand::Get(args) => get_bird(ctx, args).await,
            BirdsSubcommand::Apply(args) => apply_bird(ctx, args).await,
            BirdsSubcommand::Delete(args) => delete_bird(ctx, args).await,
            BirdsSubcommand::Eggs(args) => list_bird_eggs(ctx, args).await,
        }
    }
}

/// Table row for a bird.
#[derive(Debug, Clone, Serialize, Tabled)]
struct BirdRow {
    #[tabled(rename = "Name")]
    name: String,

    #[tabled(rename = "Desired")]
    desired: String,

    #[tabled(rename = "Observed")]
    observed: String,

    #[tabled(rename = "Ver")]
    resource_version: u64,

    #[tabled(rename = "Created")]
    created_at: String,
}

impl From<&Bird> for BirdRow {
    fn from(bird: &Bird) -> Self {
        Self {
            name: bird.metadata.name.clone(),
            desired: count_cell(bird.spec.egg_numbers),
            observed: count_cell(bird.status.egg_numbers),
            resource_version: bird.metadata.resource_version,
            created_at: age_cell(bird.metadata.creation_timestamp),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct ListResponse<T> {
    items: Vec<T>,
    total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplyBirdRequest {
    egg_numbers: Option<i32>,
}

async fn list_birds(ctx: CommandContext) -> Result<()> {
    let client = ctx.client()?;
    let response: ListResponse<Bird> = client.get(&ctx.collection_path("birds")).await?;

    match ctx.format {
        OutputFormat::Table => {
            let rows: Vec<BirdRow> = response.items.iter().map(BirdRow::from).collect();
            print_output(&rows, ctx.format);
        }
        OutputFormat::Json => print_single(&response),
    }

    Ok(())
}

async fn get_bird(ctx: CommandContext, args: BirdNameArgs) -> Result<()> {
    let client = ctx.client()?;
    let path = format!("{}/{}", ctx.collection_path("birds"), args.name);
    let bird: Bird = client.get(&path).await?;

    match ctx.format {
        OutputFormat::Table => print_output(&[BirdRow::from(&bird)], ctx.format),
        OutputFormat::Json => print_single(&bird),
    }

    Ok(())
}

async fn apply_bird(ctx: CommandContext, args: ApplyBirdArgs) -> Result<()> {
    if matches!(args.eggs, Some(n) if n < 0) {
        return Err(anyhow::anyhow!("--eggs must be >= 0"));
    }

    let client = ctx.client()?;
    let path = format!("{}/{}", ctx.collection_path("birds"), args.name);
    let request = ApplyBirdRequest {
        egg_numbers: args.eggs,
    };
    let (bird, created): (Bird, bool) = client.put(&path, &request).await?;

    match ctx.format {
        OutputFormat::Json => print_single(&bird),
        OutputFormat::Table => {
            let verb = if created { "Created" } else { "Updated" };
            print_success(&format!(
                "{verb} bird '{}/{}' (eggs: {})",
                bird.metadata.namespace,
                bird.metadata.name,
                count_cell(bird.spec.egg_numbers)
            ));
        }
    }

    Ok(())
}

async fn delete_bird(ctx: CommandContext, args: BirdNameArgs) -> Result<()> {
    let client = ctx.client()?;
    let path = format!("{}/{}", ctx.collection_path("birds"), args.name);
    client.delete(&path).await?;

    match ctx.format {
        OutputFormat::Json => print_single(&serde_json::json!({ "deleted": args.name })),
        OutputFormat::Table => print_success(&format!(
            "Deleted bird '{}/{}'",
            ctx.namespace, args.name
        )),
    }

    Ok(())
}

async fn list_bird_eggs(ctx: CommandContext, args: BirdNameArgs) -> Result<()> {
    let client = ctx.client()?;
    let path = format!("{}/{}/eggs", ctx.collection_path("birds"), args.name);
    let response: ListResponse<Egg> = client.get(&path).await?;

    match ctx.format {
        OutputFormat::Table => {
            let rows: Vec<EggRow> = response.items.iter().map(EggRow::from).collect();
            print_output(&rows, ctx.format);
        }
        OutputFormat::Json => print_single(&response),
    }

    Ok(())
}
