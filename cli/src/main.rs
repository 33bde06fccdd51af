mod commands;
mod config;
mod store;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{
    CollectionCommand, FridgeCommand, Outcome, PlanCommand, RecipeCommand, ShoppingCommand,
};
use config::CliConfig;
use std::path::PathBuf;
use store::PantryStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nutrify")]
#[command(about = "Nutrify CLI: unit conversion, recipes, fridge, shopping list and meal plans", long_about = None)]
struct Cli {
    /// Pantry file (default: $NUTRIFY_PANTRY_FILE or ~/.nutrify/pantry.json)
    #[arg(long, global = true)]
    pantry_file: Option<PathBuf>,

    /// Do not render unit alternatives in views
    #[arg(long, global = true)]
    no_conversions: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a quantity between two units of the same group
    Convert {
        /// Amount, e.g. "2", "1.5" or "1 1/2"
        quantity: String,
        from: String,
        to: String,
    },
    /// Normalize a quantity and list it in every related unit
    Format {
        /// Amount, e.g. "2", "1.5" or "1 1/2"
        quantity: String,
        unit: String,
    },
    /// Show the group and convertible units of a unit
    Units { unit: String },
    /// Manage recipes
    #[command(subcommand)]
    Recipe(RecipeCommand),
    /// Manage recipe collections
    #[command(subcommand)]
    Collection(CollectionCommand),
    /// Manage fridge stock
    #[command(subcommand)]
    Fridge(FridgeCommand),
    /// Manage the shopping list
    #[command(subcommand)]
    Shopping(ShoppingCommand),
    /// Manage the weekly meal plan
    #[command(subcommand)]
    Plan(PlanCommand),
}

fn init_telemetry() {
    // stdout carries the JSON output, so logs go to stderr
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn main() -> Result<()> {
    init_telemetry();

    let cli = Cli::parse();
    let config = CliConfig::from_env();
    let include_conversions = config.include_conversions && !cli.no_conversions;

    let outcome = match cli.command {
        Commands::Convert { quantity, from, to } => commands::convert(&quantity, &from, &to)?,
        Commands::Format { quantity, unit } => {
            commands::format(&quantity, &unit, include_conversions)?
        }
        Commands::Units { unit } => commands::units(&unit)?,
        Commands::Recipe(command) => {
            with_pantry(&cli.pantry_file, &config, |p| command.run(p))?
        }
        Commands::Collection(command) => {
            with_pantry(&cli.pantry_file, &config, |p| command.run(p))?
        }
        Commands::Fridge(command) => {
            with_pantry(&cli.pantry_file, &config, |p| command.run(p, include_conversions))?
        }
        Commands::Shopping(command) => {
            with_pantry(&cli.pantry_file, &config, |p| command.run(p))?
        }
        Commands::Plan(command) => with_pantry(&cli.pantry_file, &config, |p| command.run(p))?,
    };

    println!("{}", serde_json::to_string_pretty(&outcome.output)?);
    Ok(())
}

/// Load the pantry, run `f` on it and save it back if `f` changed it.
fn with_pantry(
    pantry_file: &Option<PathBuf>,
    config: &CliConfig,
    f: impl FnOnce(&mut nutrify_core::Pantry) -> Result<Outcome>,
) -> Result<Outcome> {
    let path = pantry_file
        .clone()
        .unwrap_or_else(|| config.pantry_file.clone());
    let store = PantryStore::new(path);

    let mut pantry = store.load()?;
    let outcome = f(&mut pantry)?;
    if outcome.changed {
        store.save(&pantry)?;
    }
    Ok(outcome)
}
