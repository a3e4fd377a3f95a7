//! Account lifecycle types.
//!
//! Three account kinds (Safe, Roles, Delay) each come in three shapes:
//! - **New**: no address yet, `nonce` required, kind config required
//! - **Update**: known address, everything else optional
//! - **Resolved**: known address and every field populated
//!
//! All shapes are generic over the type of their address slots: `A =
//! AddressOrRef` while a batch is authored, `A = Address` once references are
//! resolved.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::{Address, AddressOrRef, PrefixedAddress, RefName};
use crate::chain::Chain;
use crate::roles::{Allowance, Patch, Role};
use crate::uint::Uint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    Safe,
    Roles,
    Delay,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountKind::Safe => "SAFE",
            AccountKind::Roles => "ROLES",
            AccountKind::Delay => "DELAY",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    New,
    Update,
    Resolved,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lifecycle::New => "new",
            Lifecycle::Update => "update",
            Lifecycle::Resolved => "resolved",
        })
    }
}

// =============================================================================
// Resolved shapes
// =============================================================================

/// Safe multisig.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Safe<A = Address> {
    pub chain: Chain,
    pub address: Address,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<RefName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Uint>,
    pub threshold: u32,
    pub owners: Vec<A>,
    pub modules: Vec<A>,
}

/// Roles permission module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roles<A = Address> {
    pub chain: Chain,
    pub address: Address,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<RefName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Uint>,
    pub owner: A,
    pub target: A,
    pub avatar: A,
    pub multisend: Vec<Address>,
    pub roles: Vec<Role<A>>,
    pub allowances: Vec<Allowance>,
}

/// Delay time-lock module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delay<A = Address> {
    pub chain: Chain,
    pub address: Address,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<RefName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Uint>,
    pub owner: A,
    pub target: A,
    pub avatar: A,
    /// Seconds a queued transaction waits before it can execute.
    pub cooldown: Uint,
    /// Seconds after the cooldown during which it stays executable.
    pub expiration: Uint,
    pub modules: Vec<A>,
}

/// A fully populated account, as exchanged with the provisioning service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Account<A = Address> {
    Safe(Safe<A>),
    Roles(Roles<A>),
    Delay(Delay<A>),
}

impl<A> Account<A> {
    pub fn kind(&self) -> AccountKind {
        match self {
            Account::Safe(_) => AccountKind::Safe,
            Account::Roles(_) => AccountKind::Roles,
            Account::Delay(_) => AccountKind::Delay,
        }
    }

    pub fn chain(&self) -> Chain {
        match self {
            Account::Safe(a) => a.chain,
            Account::Roles(a) => a.chain,
            Account::Delay(a) => a.chain,
        }
    }

    pub fn address(&self) -> &Address {
        match self {
            Account::Safe(a) => &a.address,
            Account::Roles(a) => &a.address,
            Account::Delay(a) => &a.address,
        }
    }

    pub fn ref_name(&self) -> Option<&RefName> {
        match self {
            Account::Safe(a) => a.ref_name.as_ref(),
            Account::Roles(a) => a.ref_name.as_ref(),
            Account::Delay(a) => a.ref_name.as_ref(),
        }
    }

    pub fn prefixed_address(&self) -> PrefixedAddress {
        PrefixedAddress::Chain(self.chain(), self.address().clone())
    }
}

// =============================================================================
// New shapes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSafe<A = AddressOrRef> {
    pub chain: Chain,
    /// Precomputed address, if the caller already knows it.
    pub address: Option<Address>,
    pub ref_name: Option<RefName>,
    pub nonce: Uint,
    pub threshold: u32,
    pub owners: Vec<A>,
    pub modules: Vec<A>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoles<A = AddressOrRef> {
    pub chain: Chain,
    pub address: Option<Address>,
    pub ref_name: Option<RefName>,
    pub nonce: Uint,
    pub owner: A,
    pub target: A,
    pub avatar: A,
    pub multisend: Option<Vec<Address>>,
    pub roles: Option<Patch<Role<A>>>,
    pub allowances: Option<Patch<Allowance>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDelay<A = AddressOrRef> {
    pub chain: Chain,
    pub address: Option<Address>,
    pub ref_name: Option<RefName>,
    pub nonce: Uint,
    pub owner: A,
    pub target: A,
    pub avatar: A,
    pub cooldown: Uint,
    pub expiration: Uint,
    pub modules: Option<Vec<A>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewAccount<A = AddressOrRef> {
    Safe(NewSafe<A>),
    Roles(NewRoles<A>),
    Delay(NewDelay<A>),
}

impl<A> NewAccount<A> {
    pub fn kind(&self) -> AccountKind {
        match self {
            NewAccount::Safe(_) => AccountKind::Safe,
            NewAccount::Roles(_) => AccountKind::Roles,
            NewAccount::Delay(_) => AccountKind::Delay,
        }
    }

    pub fn chain(&self) -> Chain {
        match self {
            NewAccount::Safe(a) => a.chain,
            NewAccount::Roles(a) => a.chain,
            NewAccount::Delay(a) => a.chain,
        }
    }

    pub fn nonce(&self) -> &Uint {
        match self {
            NewAccount::Safe(a) => &a.nonce,
            NewAccount::Roles(a) => &a.nonce,
            NewAccount::Delay(a) => &a.nonce,
        }
    }

    pub fn address(&self) -> Option<&Address> {
        match self {
            NewAccount::Safe(a) => a.address.as_ref(),
            NewAccount::Roles(a) => a.address.as_ref(),
            NewAccount::Delay(a) => a.address.as_ref(),
        }
    }

    pub fn ref_name(&self) -> Option<&RefName> {
        match self {
            NewAccount::Safe(a) => a.ref_name.as_ref(),
            NewAccount::Roles(a) => a.ref_name.as_ref(),
            NewAccount::Delay(a) => a.ref_name.as_ref(),
        }
    }
}

// =============================================================================
// Update shapes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSafe<A = AddressOrRef> {
    pub chain: Chain,
    pub address: Address,
    pub ref_name: Option<RefName>,
    pub threshold: Option<u32>,
    pub owners: Option<Vec<A>>,
    pub modules: Option<Vec<A>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRoles<A = AddressOrRef> {
    pub chain: Chain,
    pub address: Address,
    pub ref_name: Option<RefName>,
    pub owner: Option<A>,
    pub target: Option<A>,
    pub avatar: Option<A>,
    pub multisend: Option<Vec<Address>>,
    pub roles: Option<Patch<Role<A>>>,
    pub allowances: Option<Patch<Allowance>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDelay<A = AddressOrRef> {
    pub chain: Chain,
    pub address: Address,
    pub ref_name: Option<RefName>,
    pub owner: Option<A>,
    pub target: Option<A>,
    pub avatar: Option<A>,
    pub cooldown: Option<Uint>,
    pub expiration: Option<Uint>,
    pub modules: Option<Vec<A>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateAccount<A = AddressOrRef> {
    Safe(UpdateSafe<A>),
    Roles(UpdateRoles<A>),
    Delay(UpdateDelay<A>),
}

impl<A> UpdateAccount<A> {
    pub fn kind(&self) -> AccountKind {
        match self {
            UpdateAccount::Safe(_) => AccountKind::Safe,
            UpdateAccount::Roles(_) => AccountKind::Roles,
            UpdateAccount::Delay(_) => AccountKind::Delay,
        }
    }

    pub fn chain(&self) -> Chain {
        match self {
            UpdateAccount::Safe(a) => a.chain,
            UpdateAccount::Roles(a) => a.chain,
            UpdateAccount::Delay(a) => a.chain,
        }
    }

    pub fn address(&self) -> &Address {
        match self {
            UpdateAccount::Safe(a) => &a.address,
            UpdateAccount::Roles(a) => &a.address,
            UpdateAccount::Delay(a) => &a.address,
        }
    }

    pub fn ref_name(&self) -> Option<&RefName> {
        match self {
            UpdateAccount::Safe(a) => a.ref_name.as_ref(),
            UpdateAccount::Roles(a) => a.ref_name.as_ref(),
            UpdateAccount::Delay(a) => a.ref_name.as_ref(),
        }
    }
}

// =============================================================================
// Batch entries
// =============================================================================

/// One validated entry of a constellation batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEntry<A = AddressOrRef> {
    New(NewAccount<A>),
    Update(UpdateAccount<A>),
    Resolved(Account<A>),
}

impl<A> AccountEntry<A> {
    pub fn lifecycle(&self) -> Lifecycle {
        match self {
            AccountEntry::New(_) => Lifecycle::New,
            AccountEntry::Update(_) => Lifecycle::Update,
            AccountEntry::Resolved(_) => Lifecycle::Resolved,
        }
    }

    pub fn kind(&self) -> AccountKind {
        match self {
            AccountEntry::New(a) => a.kind(),
            AccountEntry::Update(a) => a.kind(),
            AccountEntry::Resolved(a) => a.kind(),
        }
    }

    pub fn chain(&self) -> Chain {
        match self {
            AccountEntry::New(a) => a.chain(),
            AccountEntry::Update(a) => a.chain(),
            AccountEntry::Resolved(a) => a.chain(),
        }
    }

    /// The address the caller supplied, if any. New entries usually have none.
    pub fn known_address(&self) -> Option<&Address> {
        match self {
            AccountEntry::New(a) => a.address(),
            AccountEntry::Update(a) => Some(a.address()),
            AccountEntry::Resolved(a) => Some(a.address()),
        }
    }

    pub fn ref_name(&self) -> Option<&RefName> {
        match self {
            AccountEntry::New(a) => a.ref_name(),
            AccountEntry::Update(a) => a.ref_name(),
            AccountEntry::Resolved(a) => a.ref_name(),
        }
    }
}
