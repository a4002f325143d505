mod cli;
mod commands;
mod config;
mod storage;

use crate::cli::ConfigCommand;
use clap::Parser;
use color_eyre::Result;
use prefvault_core::{prefs::PreferenceStore, vault::SecretVault};
use prefvault_storage::encrypted_store::EncryptedPrefs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    match cli.command.unwrap_or(cli::Command::List) {
        cli::Command::Version => print_version(),
        cli::Command::Health => run_health_check(&config).await?,
        cli::Command::Config(ConfigCommand::Init) => init_config(&config)?,
        cli::Command::Get(args) => {
            let prefs = storage::prefs_from_config(&config)?;
            match commands::get(&prefs, &args).await? {
                Some(value) => println!("{value}"),
                None => println!("{} is not set", args.name),
            }
        }
        cli::Command::Set(args) => {
            let prefs = storage::prefs_from_config(&config)?;
            commands::set(&prefs, &args).await?;
            println!("Stored {}", args.name);
        }
        cli::Command::Remove { name } => {
            let prefs = storage::prefs_from_config(&config)?;
            prefs.remove(&name).await?;
            println!("Removed {name}");
        }
        cli::Command::List => {
            let prefs = storage::prefs_from_config(&config)?;
            let entries = commands::list(&prefs).await?;
            if entries.is_empty() {
                println!("No entries yet. Add one with `prefvault set <name> <value>`.");
            }
            for (name, kind) in entries {
                println!("{name} [{kind}]");
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info to avoid noisy stdout.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("prefvault {}", env!("CARGO_PKG_VERSION"));
}

/// Runs a quick health check of the vault and preferences file.
async fn run_health_check(config: &config::Config) -> Result<()> {
    let prefs = storage::prefs_from_config(config)?;
    run_prefs_health(&prefs).await?;
    println!("Storage: ok");
    Ok(())
}

async fn run_prefs_health<V: SecretVault, S: PreferenceStore>(
    prefs: &EncryptedPrefs<V, S>,
) -> Result<()> {
    let probe_name = "health/probe";
    let payload = "ok";
    prefs.set_string(probe_name, payload, false).await?;
    let round_trip = prefs.get_string(probe_name, false).await?;
    prefs.remove(probe_name).await?;

    if round_trip.as_deref() != Some(payload) {
        color_eyre::eyre::bail!("encrypted round-trip failed");
    }
    Ok(())
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}
