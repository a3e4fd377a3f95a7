//! Caller-authored account specifications.
//!
//! This is the loose JSON shape a caller writes: every field optional, the
//! chain still a raw string, addresses possibly `$refs`. [`crate::validate`]
//! turns a batch of these into typed lifecycle entries.

use serde::{Deserialize, Serialize};

use crate::account::{Account, AccountKind};
use crate::address::{Address, AddressOrRef};
use crate::roles::{Allowance, Patch, RoleWithRef};
use crate::uint::Uint;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SafeSpec {
    pub chain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressOrRef>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Uint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owners: Option<Vec<AddressOrRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<AddressOrRef>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RolesSpec {
    pub chain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressOrRef>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Uint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<AddressOrRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<AddressOrRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<AddressOrRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multisend: Option<Vec<Address>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Patch<RoleWithRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowances: Option<Patch<Allowance>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DelaySpec {
    pub chain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressOrRef>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Uint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<AddressOrRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<AddressOrRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<AddressOrRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<Uint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<Uint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<AddressOrRef>>,
}

/// One entry of a constellation batch as the caller wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountSpec {
    Safe(SafeSpec),
    Roles(RolesSpec),
    Delay(DelaySpec),
}

impl AccountSpec {
    pub fn kind(&self) -> AccountKind {
        match self {
            AccountSpec::Safe(_) => AccountKind::Safe,
            AccountSpec::Roles(_) => AccountKind::Roles,
            AccountSpec::Delay(_) => AccountKind::Delay,
        }
    }

    pub fn chain(&self) -> &str {
        match self {
            AccountSpec::Safe(s) => &s.chain,
            AccountSpec::Roles(s) => &s.chain,
            AccountSpec::Delay(s) => &s.chain,
        }
    }

    pub fn address(&self) -> Option<&AddressOrRef> {
        match self {
            AccountSpec::Safe(s) => s.address.as_ref(),
            AccountSpec::Roles(s) => s.address.as_ref(),
            AccountSpec::Delay(s) => s.address.as_ref(),
        }
    }

    pub fn ref_name(&self) -> Option<&str> {
        match self {
            AccountSpec::Safe(s) => s.ref_name.as_deref(),
            AccountSpec::Roles(s) => s.ref_name.as_deref(),
            AccountSpec::Delay(s) => s.ref_name.as_deref(),
        }
    }

    pub fn nonce(&self) -> Option<&Uint> {
        match self {
            AccountSpec::Safe(s) => s.nonce.as_ref(),
            AccountSpec::Roles(s) => s.nonce.as_ref(),
            AccountSpec::Delay(s) => s.nonce.as_ref(),
        }
    }
}

fn slots(items: Vec<Address>) -> Vec<AddressOrRef> {
    items.into_iter().map(AddressOrRef::Address).collect()
}

/// A resolved account re-expressed as a complete spec, e.g. to feed the
/// output of one resolve back in as the input of the next.
impl From<Account> for AccountSpec {
    fn from(account: Account) -> Self {
        match account {
            Account::Safe(a) => AccountSpec::Safe(SafeSpec {
                chain: a.chain.to_string(),
                address: Some(a.address.into()),
                ref_name: a.ref_name.map(String::from),
                nonce: a.nonce,
                threshold: Some(a.threshold),
                owners: Some(slots(a.owners)),
                modules: Some(slots(a.modules)),
            }),
            Account::Roles(a) => AccountSpec::Roles(RolesSpec {
                chain: a.chain.to_string(),
                address: Some(a.address.into()),
                ref_name: a.ref_name.map(String::from),
                nonce: a.nonce,
                owner: Some(a.owner.into()),
                target: Some(a.target.into()),
                avatar: Some(a.avatar.into()),
                multisend: Some(a.multisend),
                roles: Some(Patch::Replace(
                    a.roles
                        .into_iter()
                        .map(|role| RoleWithRef {
                            key: role.key,
                            members: slots(role.members),
                            targets: role.targets,
                            annotations: role.annotations,
                        })
                        .collect(),
                )),
                allowances: Some(Patch::Replace(a.allowances)),
            }),
            Account::Delay(a) => AccountSpec::Delay(DelaySpec {
                chain: a.chain.to_string(),
                address: Some(a.address.into()),
                ref_name: a.ref_name.map(String::from),
                nonce: a.nonce,
                owner: Some(a.owner.into()),
                target: Some(a.target.into()),
                avatar: Some(a.avatar.into()),
                cooldown: Some(a.cooldown),
                expiration: Some(a.expiration),
                modules: Some(slots(a.modules)),
            }),
        }
    }
}
