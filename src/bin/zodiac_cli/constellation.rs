//! `resolve` and `apply`: run a constellation file through the client.

use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use zodiac_sdk::{AccountSpec, Client};

#[derive(Parser, Debug)]
pub struct ResolveCmd {
    /// Constellation JSON file (an array of account specs), or `-` for stdin
    #[arg(long)]
    pub spec: PathBuf,
}

#[derive(Parser, Debug)]
pub struct ApplyCmd {
    /// Constellation JSON file (an array of account specs), or `-` for stdin
    #[arg(long)]
    pub spec: PathBuf,
}

impl ResolveCmd {
    pub fn execute(&self, client: &Client) -> Result<()> {
        let specs = read_specs(&self.spec)?;
        let resolved = client
            .resolve_constellation(&specs)
            .context("Failed to resolve constellation")?;
        println!("{}", serde_json::to_string_pretty(&resolved)?);
        Ok(())
    }
}

impl ApplyCmd {
    pub fn execute(&self, client: &Client) -> Result<()> {
        let specs = read_specs(&self.spec)?;
        let applied = client
            .apply_constellation(&specs)
            .context("Failed to apply constellation")?;
        println!("{}", serde_json::to_string_pretty(&applied)?);
        Ok(())
    }
}

/// Read a constellation from a file, or from stdin when `path` is `-`.
fn read_specs(path: &Path) -> Result<Vec<AccountSpec>> {
    let json = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read constellation from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read constellation: {}", path.display()))?
    };

    serde_json::from_str(&json).context("Failed to parse constellation JSON")
}
