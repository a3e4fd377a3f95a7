//! zodiac: command line access to the Zodiac OS provisioning service
//!
//! ## Commands
//!
//! - **typegen**: generate a Rust `Vault` enum from the workspace's vaults
//! - **resolve**: resolve a constellation file and print the accounts
//! - **apply**: resolve and submit a constellation file
//!
//! ## Example Usage
//!
//! ```bash
//! # Generate ./.zodiac-os/vaults.rs
//! ZODIAC_OS_WORKSPACE=acme ZODIAC_OS_API_KEY=sk-... zodiac typegen
//!
//! # Preview what a constellation resolves to
//! zodiac resolve --spec constellation.json
//!
//! # Submit it, reading the constellation from stdin
//! cat constellation.json | zodiac apply --spec -
//! ```

use std::ffi::OsString;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use zodiac_sdk::{Client, ClientOptions};

mod zodiac_cli;

use zodiac_cli::{
    constellation::{ApplyCmd, ResolveCmd},
    typegen::TypegenCmd,
};

/// Source tag attached to constellation requests made from the CLI.
const CLI_SOURCE: &str = "cli";

#[derive(Parser)]
#[command(
    name = "zodiac",
    author,
    version,
    about = "Zodiac OS account constellations",
    long_about = "Resolve and apply constellations of Safe, Roles and Delay accounts \
                  against a Zodiac OS workspace, and generate typed vault bindings."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace to operate on (default: $ZODIAC_OS_WORKSPACE)
    #[arg(long, global = true)]
    workspace: Option<String>,

    /// API key (default: $ZODIAC_OS_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Provisioning service base URL (default: $ZODIAC_OS_BASE_URL or the hosted service)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Verbose output (debug logging on stderr)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a Rust enum of the workspace's vaults
    Typegen(TypegenCmd),

    /// Resolve a constellation and print the resulting accounts
    Resolve(ResolveCmd),

    /// Resolve a constellation and submit it for provisioning
    Apply(ApplyCmd),

    #[command(external_subcommand)]
    External(Vec<OsString>),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let Cli {
        command,
        workspace,
        api_key,
        base_url,
        verbose,
    } = Cli::parse();

    if let Commands::External(args) = &command {
        let name = args
            .first()
            .map(|arg| arg.to_string_lossy().into_owned())
            .unwrap_or_default();
        bail!("Unknown command \"{name}\"");
    }

    init_tracing(verbose);

    let client = Client::new(ClientOptions {
        workspace,
        api_key,
        base_url,
        source: Some(CLI_SOURCE.to_string()),
        ..ClientOptions::default()
    })?;

    match command {
        Commands::Typegen(cmd) => cmd.execute(&client),
        Commands::Resolve(cmd) => cmd.execute(&client),
        Commands::Apply(cmd) => cmd.execute(&client),
        Commands::External(_) => Ok(()),
    }
}
