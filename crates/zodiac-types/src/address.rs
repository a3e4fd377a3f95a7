//! Address and reference primitives.
//!
//! This module is the canonical source for address handling in the workspace.
//! EVM addresses arrive in any case (checksummed, upper, lower):
//! - Checksummed: "0x9641d764fC13c8B624c04430C7356C1C7C8102e2"
//! - Lowercase:   "0x9641d764fc13c8b624c04430c7356c1c7c8102e2"
//!
//! An [`Address`] keeps the caller's spelling until it is normalized; the
//! canonical form is lowercase. References (`$name`) stand in for addresses
//! of accounts that do not exist yet.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::Chain;

/// Number of hex digits in an address (20 bytes).
pub const ADDRESS_HEX_LEN: usize = 40;

/// Sigil that marks a reference token.
pub const REF_SIGIL: char = '$';

/// Prefix used for externally owned accounts in prefixed addresses.
pub const EOA_PREFIX: &str = "eoa";

/// Errors from parsing address-like strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid address '{0}': expected 0x followed by 40 hex digits")]
    InvalidAddress(String),
    #[error("invalid reference '{0}': expected '$' followed by lowercase letters, digits, '_' or '-'")]
    InvalidRef(String),
    #[error("invalid prefixed address '{0}': expected '<chain>:0x…' or 'eoa:0x…'")]
    InvalidPrefixedAddress(String),
    #[error("unknown chain '{0}'")]
    UnknownChain(String),
    #[error("invalid unsigned integer '{0}': expected decimal digits")]
    InvalidUint(String),
}

/// A 20-byte hex address with `0x` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse an address, accepting any hex digit case.
    ///
    /// ```
    /// use zodiac_types::Address;
    ///
    /// let addr = Address::parse("0x9641d764fC13c8B624c04430C7356C1C7C8102e2").unwrap();
    /// assert_eq!(
    ///     addr.to_lowercase().as_str(),
    ///     "0x9641d764fc13c8b624c04430c7356c1c7c8102e2"
    /// );
    /// assert!(Address::parse("0x1234").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| ParseError::InvalidAddress(s.to_string()))?;
        if digits.len() != ADDRESS_HEX_LEN || hex::decode(digits).is_err() {
            return Err(ParseError::InvalidAddress(s.to_string()));
        }
        Ok(Self(format!("0x{digits}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical (lowercase) form of this address.
    pub fn to_lowercase(&self) -> Self {
        Self(self.0.to_ascii_lowercase())
    }

    /// True when the address is already in canonical form.
    pub fn is_normalized(&self) -> bool {
        !self.0.bytes().any(|b| b.is_ascii_uppercase())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Name of a batch-scoped reference, stored without the `$` sigil.
///
/// Serialized as the bare name (the form used when an entry *declares* a
/// ref); a leading `$` is accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    /// Validate a reference name. A single leading `$` is stripped.
    pub fn new(name: &str) -> Result<Self, ParseError> {
        let bare = name.strip_prefix(REF_SIGIL).unwrap_or(name);
        let valid = !bare.is_empty()
            && bare
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
        if !valid {
            return Err(ParseError::InvalidRef(format!("{REF_SIGIL}{bare}")));
        }
        Ok(Self(bare.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The token form used at a reference site, e.g. `$treasury`.
    pub fn token(&self) -> String {
        format!("{REF_SIGIL}{}", self.0)
    }
}

impl fmt::Display for RefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RefName {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

/// A field position that holds either a concrete address or a `$ref`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AddressOrRef {
    Address(Address),
    Ref(RefName),
}

impl AddressOrRef {
    pub fn as_address(&self) -> Option<&Address> {
        match self {
            AddressOrRef::Address(address) => Some(address),
            AddressOrRef::Ref(_) => None,
        }
    }

    pub fn as_ref_name(&self) -> Option<&RefName> {
        match self {
            AddressOrRef::Address(_) => None,
            AddressOrRef::Ref(name) => Some(name),
        }
    }

    pub fn is_ref(&self) -> bool {
        matches!(self, AddressOrRef::Ref(_))
    }
}

impl fmt::Display for AddressOrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressOrRef::Address(address) => fmt::Display::fmt(address, f),
            AddressOrRef::Ref(name) => write!(f, "{REF_SIGIL}{name}"),
        }
    }
}

impl FromStr for AddressOrRef {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with(REF_SIGIL) {
            RefName::new(s).map(AddressOrRef::Ref)
        } else {
            Address::parse(s).map(AddressOrRef::Address)
        }
    }
}

impl TryFrom<String> for AddressOrRef {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AddressOrRef> for String {
    fn from(value: AddressOrRef) -> Self {
        value.to_string()
    }
}

impl From<Address> for AddressOrRef {
    fn from(address: Address) -> Self {
        AddressOrRef::Address(address)
    }
}

impl From<RefName> for AddressOrRef {
    fn from(name: RefName) -> Self {
        AddressOrRef::Ref(name)
    }
}

/// An address qualified by its chain (`eth:0x…`) or marked as an EOA
/// (`eoa:0x…`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PrefixedAddress {
    Chain(Chain, Address),
    Eoa(Address),
}

impl PrefixedAddress {
    pub fn address(&self) -> &Address {
        match self {
            PrefixedAddress::Chain(_, address) | PrefixedAddress::Eoa(address) => address,
        }
    }

    pub fn chain(&self) -> Option<Chain> {
        match self {
            PrefixedAddress::Chain(chain, _) => Some(*chain),
            PrefixedAddress::Eoa(_) => None,
        }
    }

    /// Same prefix with the address in canonical form.
    pub fn to_lowercase(&self) -> Self {
        match self {
            PrefixedAddress::Chain(chain, address) => {
                PrefixedAddress::Chain(*chain, address.to_lowercase())
            }
            PrefixedAddress::Eoa(address) => PrefixedAddress::Eoa(address.to_lowercase()),
        }
    }
}

impl fmt::Display for PrefixedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixedAddress::Chain(chain, address) => write!(f, "{chain}:{address}"),
            PrefixedAddress::Eoa(address) => write!(f, "{EOA_PREFIX}:{address}"),
        }
    }
}

impl FromStr for PrefixedAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, address) = s
            .split_once(':')
            .ok_or_else(|| ParseError::InvalidPrefixedAddress(s.to_string()))?;
        let address = Address::parse(address)?;
        if prefix == EOA_PREFIX {
            return Ok(PrefixedAddress::Eoa(address));
        }
        let chain = Chain::from_short_name(prefix)
            .ok_or_else(|| ParseError::UnknownChain(prefix.to_string()))?;
        Ok(PrefixedAddress::Chain(chain, address))
    }
}

impl TryFrom<String> for PrefixedAddress {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PrefixedAddress> for String {
    fn from(value: PrefixedAddress) -> Self {
        value.to_string()
    }
}
