//! Roles-module schema: roles, permission targets, allowances and the
//! replace-or-merge patch type used to update keyed lists.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::address::{Address, AddressOrRef};
use crate::uint::Uint;

/// List elements identified by a unique key.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// A role definition. Members may be references while the batch is authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role<A = Address> {
    /// 0x-prefixed role key, unique within a roles module.
    pub key: String,
    pub members: Vec<A>,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// Role as authored, before references are resolved.
pub type RoleWithRef = Role<AddressOrRef>;

impl<A> Keyed for Role<A> {
    fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Clearance {
    #[default]
    None = 0,
    Target = 1,
    Function = 2,
}

impl TryFrom<u8> for Clearance {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Clearance::None),
            1 => Ok(Clearance::Target),
            2 => Ok(Clearance::Function),
            other => Err(format!("invalid clearance {other}")),
        }
    }
}

impl From<Clearance> for u8 {
    fn from(value: Clearance) -> Self {
        value as u8
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ExecutionOptions {
    #[default]
    None = 0,
    Send = 1,
    DelegateCall = 2,
    Both = 3,
}

impl TryFrom<u8> for ExecutionOptions {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ExecutionOptions::None),
            1 => Ok(ExecutionOptions::Send),
            2 => Ok(ExecutionOptions::DelegateCall),
            3 => Ok(ExecutionOptions::Both),
            other => Err(format!("invalid execution options {other}")),
        }
    }
}

impl From<ExecutionOptions> for u8 {
    fn from(value: ExecutionOptions) -> Self {
        value as u8
    }
}

/// A contract a role may call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub address: Address,
    pub clearance: Clearance,
    #[serde(default)]
    pub execution_options: ExecutionOptions,
    #[serde(default)]
    pub functions: Vec<Function>,
}

/// A scoped function on a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    /// 4-byte selector, 0x-prefixed.
    pub selector: String,
    #[serde(default)]
    pub wildcarded: bool,
    #[serde(default)]
    pub execution_options: ExecutionOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

/// A node of a parameter condition tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub param_type: u8,
    pub operator: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comp_value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub uri: String,
    pub schema: String,
}

/// A rate-limited budget that conditions can consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allowance {
    pub key: String,
    pub refill: Uint,
    #[serde(default)]
    pub max_refill: Uint,
    #[serde(default)]
    pub period: Uint,
    #[serde(default)]
    pub balance: Uint,
    #[serde(default)]
    pub timestamp: Uint,
}

impl Keyed for Allowance {
    fn key(&self) -> &str {
        &self.key
    }
}

/// Update value for a keyed list (`roles`, `allowances`).
///
/// On the wire a JSON array is a [`Patch::Replace`] and a JSON object is a
/// [`Patch::Merge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Complete list; replaces the current one.
    Replace(Vec<T>),
    /// Edits by key in caller order: `Some` upserts, `None` deletes.
    Merge(Vec<(String, Option<T>)>),
}

impl<T> Patch<T> {
    pub fn is_replace(&self) -> bool {
        matches!(self, Patch::Replace(_))
    }

    /// The complete list, if this patch replaces.
    pub fn as_complete(&self) -> Option<&[T]> {
        match self {
            Patch::Replace(items) => Some(items),
            Patch::Merge(_) => None,
        }
    }
}

impl<T> From<Vec<T>> for Patch<T> {
    fn from(items: Vec<T>) -> Self {
        Patch::Replace(items)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Replace(items) => items.serialize(serializer),
            Patch::Merge(edits) => {
                let mut map = serializer.serialize_map(Some(edits.len()))?;
                for (key, value) in edits {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PatchVisitor(PhantomData))
    }
}

struct PatchVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for PatchVisitor<T> {
    type Value = Patch<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a complete array or an object keyed by element key")
    }

    fn visit_seq<S: SeqAccess<'de>>(self, mut seq: S) -> Result<Patch<T>, S::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Patch::Replace(items))
    }

    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Patch<T>, M::Error> {
        let mut edits: Vec<(String, Option<T>)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Option<T>>()? {
            if edits.iter().any(|(existing, _)| existing.eq_ignore_ascii_case(&key)) {
                return Err(de::Error::custom(format!("duplicate key '{key}'")));
            }
            edits.push((key, value));
        }
        Ok(Patch::Merge(edits))
    }
}
