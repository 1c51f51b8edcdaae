//! AspectConf CLI - inspect and exercise contract manifests

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::Workspace;
use config::OutputFormat;

#[derive(Parser)]
#[command(name = "aspectconf")]
#[command(about = "Inspect and exercise AspectConf contract manifests", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (defaults to ./aspectconf.toml)
    #[arg(long, global = true, env = "ASPECTCONF_CONFIG")]
    config: Option<PathBuf>,

    /// Contract manifest (.toml or .json)
    #[arg(long, short, global = true)]
    manifest: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the manifest's contracts, or describe one contract's properties
    Inspect {
        /// Contract to describe
        contract: Option<String>,
    },

    /// Build a configuration object and print its values
    Dump {
        /// Contract to build
        #[arg(long, short)]
        contract: Option<String>,

        /// Assignments applied through the set pipeline before dumping
        #[arg(long = "set", value_parser = commands::parse_assignment)]
        assignments: Vec<(String, String)>,

        /// Output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Print one property of a freshly built configuration object
    Get {
        /// Property name
        property: String,

        /// Contract to build
        #[arg(long, short)]
        contract: Option<String>,
    },

    /// Invoke a declared method on a freshly built configuration object
    Invoke {
        /// Method name
        method: String,

        /// String arguments
        args: Vec<String>,

        /// Contract to build
        #[arg(long, short)]
        contract: Option<String>,
    },

    /// Build every contract of the manifest and report failures
    Check,

    /// List the capabilities of the built-in extensions
    Capabilities,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let config = config::load_config(cli.config, &cwd)?;
    let manifest = cli.manifest.or(config.manifest.clone());
    let load = || -> Result<Workspace> {
        let path = manifest
            .as_deref()
            .context("no manifest given; pass --manifest or set `manifest` in aspectconf.toml")?;
        Workspace::load(path)
    };

    let output = match cli.command {
        Commands::Inspect { contract } => load()?.inspect(contract.as_deref())?,
        Commands::Dump {
            contract,
            assignments,
            format,
        } => {
            let contract = commands::pick_contract(contract, config.default_contract.clone())?;
            let format = format.unwrap_or(config.output.format);
            load()?.dump(&contract, &assignments, format, config.output.pretty)?
        }
        Commands::Get { property, contract } => {
            let contract = commands::pick_contract(contract, config.default_contract.clone())?;
            load()?.get(&contract, &property)?
        }
        Commands::Invoke {
            method,
            args,
            contract,
        } => {
            let contract = commands::pick_contract(contract, config.default_contract.clone())?;
            load()?.invoke(&contract, &method, &args)?
        }
        Commands::Check => {
            let path = manifest.as_deref().context("no manifest given")?;
            commands::check(path)?
        }
        Commands::Capabilities => commands::capabilities(),
    };

    println!("{}", output.trim_end());
    Ok(())
}
