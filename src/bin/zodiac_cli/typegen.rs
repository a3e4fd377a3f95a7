//! `typegen`: emit a Rust `Vault` enum for the workspace's vaults.
//!
//! The generated file lives at `<project-dir>/.zodiac-os/vaults.rs`. Each
//! vault label becomes a PascalCase variant; colliding names get a numeric
//! suffix in listing order.

use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use zodiac_sdk::{Client, Vault};

const OUTPUT_DIR: &str = ".zodiac-os";
const OUTPUT_FILE: &str = "vaults.rs";

#[derive(Parser, Debug)]
pub struct TypegenCmd {
    /// Project root; the enum is written to <DIR>/.zodiac-os/vaults.rs
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,
}

impl TypegenCmd {
    pub fn execute(&self, client: &Client) -> Result<()> {
        let vaults = client.list_vaults().context("Failed to list vaults")?;
        debug!(count = vaults.len(), "fetched vaults");

        let dir = self.project_dir.join(OUTPUT_DIR);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join(OUTPUT_FILE);
        std::fs::write(&path, render_vaults(&vaults)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        println!("Wrote {} vault(s) to {}", vaults.len(), path.display());
        Ok(())
    }
}

/// PascalCase identifier for a vault label.
fn variant_name(label: &str) -> String {
    let mut name = String::new();
    for word in label.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            name.push(first.to_ascii_uppercase());
            name.push_str(chars.as_str());
        }
    }
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) || name == "Self" {
        name.insert_str(0, "Vault");
    }
    name
}

fn variant_names(vaults: &[Vault]) -> Vec<String> {
    let mut seen = HashSet::new();
    vaults
        .iter()
        .map(|vault| {
            let base = variant_name(&vault.label);
            let mut name = base.clone();
            let mut n = 2;
            while !seen.insert(name.clone()) {
                name = format!("{base}{n}");
                n += 1;
            }
            name
        })
        .collect()
}

fn render_vaults(vaults: &[Vault]) -> Result<String, fmt::Error> {
    let names = variant_names(vaults);
    let mut out = String::new();

    writeln!(out, "// @generated by `zodiac typegen`. Do not edit.")?;
    writeln!(out)?;
    writeln!(out, "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]")?;
    writeln!(out, "pub enum Vault {{")?;
    for name in &names {
        writeln!(out, "    {name},")?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "impl Vault {{")?;
    let all = names
        .iter()
        .map(|name| format!("Vault::{name}"))
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(out, "    pub const ALL: &'static [Vault] = &[{all}];")?;

    let ids: Vec<&str> = vaults.iter().map(|v| v.id.as_str()).collect();
    let labels: Vec<&str> = vaults.iter().map(|v| v.label.as_str()).collect();
    for (accessor, values) in [("id", &ids), ("label", &labels)] {
        writeln!(out)?;
        writeln!(out, "    pub fn {accessor}(self) -> &'static str {{")?;
        writeln!(out, "        match self {{")?;
        for (name, value) in names.iter().zip(values.iter()) {
            writeln!(out, "            Vault::{name} => {value:?},")?;
        }
        writeln!(out, "        }}")?;
        writeln!(out, "    }}")?;
    }
    writeln!(out, "}}")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault(id: &str, label: &str) -> Vault {
        Vault {
            id: id.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_variant_name() {
        assert_eq!(variant_name("Main Treasury"), "MainTreasury");
        assert_eq!(variant_name("ops-multisig_v2"), "OpsMultisigV2");
        assert_eq!(variant_name("DAO"), "DAO");
        assert_eq!(variant_name("2024 grants"), "Vault2024Grants");
        assert_eq!(variant_name("  "), "Vault");
        assert_eq!(variant_name("self"), "VaultSelf");
    }

    #[test]
    fn test_colliding_labels_get_suffixes() {
        let vaults = [
            vault("v_1", "main treasury"),
            vault("v_2", "Main-Treasury"),
            vault("v_3", "main treasury"),
        ];
        assert_eq!(
            variant_names(&vaults),
            vec!["MainTreasury", "MainTreasury2", "MainTreasury3"]
        );
    }

    #[test]
    fn test_render_vaults() {
        let rendered =
            render_vaults(&[vault("v_1", "Main Treasury"), vault("v_2", "Ops \"hot\"")]).unwrap();
        assert!(rendered.starts_with("// @generated"));
        assert!(rendered.contains("pub enum Vault {\n    MainTreasury,\n    OpsHot,\n}"));
        assert!(rendered
            .contains("pub const ALL: &'static [Vault] = &[Vault::MainTreasury, Vault::OpsHot];"));
        assert!(rendered.contains("Vault::MainTreasury => \"v_1\","));
        assert!(rendered.contains(r#"Vault::OpsHot => "Ops \"hot\"","#));
    }

    #[test]
    fn test_render_no_vaults() {
        let rendered = render_vaults(&[]).unwrap();
        assert!(rendered.contains("pub enum Vault {\n}"));
        assert!(rendered.contains("pub const ALL: &'static [Vault] = &[];"));
    }
}
