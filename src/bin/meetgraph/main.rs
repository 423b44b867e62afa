//! meetgraph CLI tool
//!
//! Developer tooling for the relation engine.
//!
//! ## Commands
//!
//! - `merge <a.json> <b.json>`: merge two follow trees and print the result
//! - `resolve <batch.json> <fqid> <field>`: apply a delta batch to a store over the meeting
//!   relation table and print the records `field` of `fqid` resolves to
//! - `relations [collection]`: list the declared relation descriptors

use clap::{Parser, Subcommand};
use meetgraph_core::{
    config::{ConfigProvider, TomlConfigProvider},
    domain,
    event::DeltaBatch,
    hydrate::{Hydrator, ResolveContext},
    key::{Fqid, Id},
    request::{merge_follow, Follow},
    GraphConfig,
};
use std::{fs::read_to_string, path::PathBuf};

#[derive(Parser)]
#[command(name = "meetgraph")]
#[command(author, version, about = "Inspect relation resolution and follow-tree merging", long_about = None)]
struct Cli {
    /// Configuration file path (TOML, `[graph]` table)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge two follow trees (JSON) and print the merged tree
    Merge {
        /// First follow tree; its root idField is kept
        first: PathBuf,
        /// Second follow tree
        second: PathBuf,
    },

    /// Apply a delta batch and resolve one relation
    Resolve {
        /// JSON array of deltas
        batch: PathBuf,
        /// Source record, e.g. `meeting/1`
        fqid: Fqid,
        /// Relation field, e.g. `motions`
        field: String,
        /// Owner id for structured relations
        #[arg(long)]
        owner: Option<Id>,
        /// Active meeting, the default owner of structured user relations
        #[arg(long)]
        active_meeting: Option<Id>,
    },

    /// List relation descriptors
    Relations {
        /// Only relations declared on this collection
        collection: Option<String>,
    },
}

fn load_config(path: Option<PathBuf>) -> Result<GraphConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(TomlConfigProvider::new(path).get_graph_config()?),
        None => Ok(GraphConfig::default()),
    }
}

fn read_follow(path: &PathBuf) -> Result<Follow, Box<dyn std::error::Error>> {
    Ok(serde_json::from_str(&read_to_string(path)?)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Merge { first, second } => {
            let merged = merge_follow(&read_follow(&first)?, &read_follow(&second)?)?;
            println!("{}", serde_json::to_string_pretty(&merged)?);
            Ok(())
        }

        Commands::Resolve {
            batch,
            fqid,
            field,
            owner,
            active_meeting,
        } => {
            let batch: DeltaBatch = serde_json::from_str(&read_to_string(&batch)?)?;
            let mut store = domain::new_store(&config)?;
            let notice = store.apply(batch)?;
            tracing::info!(
                "Loaded {} records at sequence {}",
                store.len(),
                notice.sequence
            );

            let mut context = ResolveContext::new();
            if let Some(meeting) = active_meeting {
                context.set(domain::ACTIVE_MEETING, meeting);
            }
            let hydrator = Hydrator::new(&store).with_context(context);
            let Some(source) = hydrator.view(&fqid) else {
                eprintln!("Error: {fqid} is not in the batch");
                std::process::exit(1);
            };
            for related in source.try_many(&field, owner)? {
                println!("{}", related.fqid());
            }
            Ok(())
        }

        Commands::Relations { collection } => {
            let registry = domain::registry()?;
            for descriptor in registry.descriptors() {
                if collection
                    .as_deref()
                    .is_some_and(|c| !descriptor.applies_to(c))
                {
                    continue;
                }
                println!("{descriptor}");
            }
            Ok(())
        }
    }
}
