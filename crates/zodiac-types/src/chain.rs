//! Static chain registry.
//!
//! Chains are addressed by the short names used in prefixed addresses
//! (`eth:0x…`, `gno:0x…`). The table is fixed at compile time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::address::ParseError;

/// Metadata for one supported chain.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ChainInfo {
    /// Short identifier used as an address prefix.
    pub short_name: &'static str,
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Human readable name.
    pub name: &'static str,
}

/// Every chain the provisioning service supports.
pub static CHAINS: [ChainInfo; 12] = [
    ChainInfo { short_name: "eth", chain_id: 1, name: "Ethereum" },
    ChainInfo { short_name: "oeth", chain_id: 10, name: "OP Mainnet" },
    ChainInfo { short_name: "bnb", chain_id: 56, name: "BNB Smart Chain" },
    ChainInfo { short_name: "gno", chain_id: 100, name: "Gnosis" },
    ChainInfo { short_name: "matic", chain_id: 137, name: "Polygon" },
    ChainInfo { short_name: "zksync", chain_id: 324, name: "zkSync Era" },
    ChainInfo { short_name: "base", chain_id: 8453, name: "Base" },
    ChainInfo { short_name: "arb1", chain_id: 42161, name: "Arbitrum One" },
    ChainInfo { short_name: "celo", chain_id: 42220, name: "Celo" },
    ChainInfo { short_name: "avax", chain_id: 43114, name: "Avalanche C-Chain" },
    ChainInfo { short_name: "basesep", chain_id: 84532, name: "Base Sepolia" },
    ChainInfo { short_name: "sep", chain_id: 11155111, name: "Sepolia" },
];

/// A chain from [`CHAINS`]. Serialized as its short name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub struct Chain(&'static ChainInfo);

impl Chain {
    /// Look a chain up by short name (`"eth"`, `"gno"`, ...).
    pub fn from_short_name(short_name: &str) -> Option<Self> {
        CHAINS
            .iter()
            .find(|info| info.short_name == short_name)
            .map(Chain)
    }

    /// Look a chain up by EIP-155 chain id.
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        CHAINS
            .iter()
            .find(|info| info.chain_id == chain_id)
            .map(Chain)
    }

    pub fn all() -> impl Iterator<Item = Chain> {
        CHAINS.iter().map(Chain)
    }

    pub fn short_name(self) -> &'static str {
        self.0.short_name
    }

    pub fn chain_id(self) -> u64 {
        self.0.chain_id
    }

    pub fn name(self) -> &'static str {
        self.0.name
    }

    pub fn info(self) -> &'static ChainInfo {
        self.0
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chain({})", self.0.short_name)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.short_name)
    }
}

impl FromStr for Chain {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_short_name(s).ok_or_else(|| ParseError::UnknownChain(s.to_string()))
    }
}

impl TryFrom<String> for Chain {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Chain> for &'static str {
    fn from(chain: Chain) -> Self {
        chain.short_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_short_name_and_id() {
        let gno = Chain::from_short_name("gno").unwrap();
        assert_eq!(gno.chain_id(), 100);
        assert_eq!(Chain::from_chain_id(100), Some(gno));
        assert!(Chain::from_short_name("GNO").is_none());
        assert!(Chain::from_short_name("solana").is_none());
    }

    #[test]
    fn test_short_names_are_unique() {
        let mut names: Vec<_> = Chain::all().map(Chain::short_name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CHAINS.len());
    }

    #[test]
    fn test_serde_uses_short_name() {
        let chain: Chain = serde_json::from_str("\"arb1\"").unwrap();
        assert_eq!(chain.chain_id(), 42161);
        assert_eq!(serde_json::to_string(&chain).unwrap(), "\"arb1\"");

        let err = serde_json::from_str::<Chain>("\"nope\"").unwrap_err();
        assert!(err.to_string().contains("unknown chain 'nope'"));
    }
}
