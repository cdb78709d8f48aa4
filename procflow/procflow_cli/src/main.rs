use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use procflow_core::id::{ElementId, SchemaId};
use procflow_core::utils::{init_tracing, EngineConfig};

mod commands;

use commands::Session;

/// Procflow operator CLI
///
/// Inspects, validates and publishes process schemas stored in a snapshot
/// file. Results are printed to stdout as JSON.
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Path to the engine configuration (TOML)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Snapshot file to operate on, overriding the configured one
    #[clap(long, global = true)]
    snapshot: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List active schemas
    Schemas,

    /// Validate a schema; exits non-zero when it has errors
    Validate {
        /// Schema ID
        schema: SchemaId,
    },

    /// Publish a schema after validating it
    Publish {
        /// Schema ID
        schema: SchemaId,

        /// Unpublish the other versions of the same schema first
        #[clap(long)]
        unpublish_others: bool,
    },

    /// Unpublish a schema
    Unpublish {
        /// Schema ID
        schema: SchemaId,
    },

    /// List the versions of a schema, newest first
    Versions {
        /// Schema ID
        schema: SchemaId,
    },

    /// List the elements inheriting from an element
    Children {
        /// Parent element ID
        element: ElementId,
    },

    /// List the processes upstream of an element
    Lineage {
        /// Element ID
        element: ElementId,
    },
}

fn run(cli: Cli) -> Result<bool> {
    let config = EngineConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging).context("Failed to initialize logging")?;

    let snapshot_path = cli
        .snapshot
        .unwrap_or_else(|| config.storage.snapshot_path.clone());
    let session = Session::open(&config, snapshot_path)?;

    match cli.command {
        Commands::Schemas => commands::schema::list(&session),
        Commands::Validate { schema } => commands::schema::validate(&session, &schema),
        Commands::Publish {
            schema,
            unpublish_others,
        } => commands::schema::publish(&session, &schema, unpublish_others),
        Commands::Unpublish { schema } => commands::schema::unpublish(&session, &schema),
        Commands::Versions { schema } => commands::schema::versions(&session, &schema),
        Commands::Children { element } => commands::element::children(&session, &element),
        Commands::Lineage { element } => commands::element::lineage(&session, &element),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
