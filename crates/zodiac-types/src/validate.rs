//! Batch validation: authored specs into typed lifecycle entries.
//!
//! Each entry is classified as
//! 1. **Resolved** when it has a concrete address and every field of its kind,
//!    with `roles`/`allowances` given as complete arrays;
//! 2. **New** when it carries a `nonce`;
//! 3. **Update** when it carries an `address`;
//!
//! and rejected with [`ValidationError::MissingNonce`] otherwise. All checks
//! are local to the batch; nothing here touches the network.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::account::{
    Account, AccountEntry, AccountKind, Delay, NewAccount, NewDelay, NewRoles, NewSafe, Roles,
    Safe, UpdateAccount, UpdateDelay, UpdateRoles, UpdateSafe,
};
use crate::address::{Address, AddressOrRef, ParseError, RefName};
use crate::chain::Chain;
use crate::roles::{Keyed, Patch};
use crate::spec::{AccountSpec, DelaySpec, RolesSpec, SafeSpec};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("accounts[{index}].chain: unknown chain '{chain}'")]
    UnknownChain { index: usize, chain: String },

    #[error("accounts[{index}].nonce: new {kind} accounts require a nonce; pass an address to update an existing account")]
    MissingNonce { index: usize, kind: AccountKind },

    #[error("accounts[{index}].{field}: required for new {kind} accounts")]
    MissingField {
        index: usize,
        kind: AccountKind,
        field: &'static str,
    },

    #[error("accounts[{index}].address: '{token}' is a reference; an account's own address must be concrete")]
    TransitiveRef { index: usize, token: String },

    #[error("accounts[{index}].ref: {source}")]
    InvalidRef { index: usize, source: ParseError },

    #[error("accounts[{index}].ref: '{name}' is already declared by accounts[{first}]")]
    DuplicateRef {
        index: usize,
        first: usize,
        name: String,
    },

    #[error("accounts[{index}].{field}: duplicate key '{key}'")]
    DuplicateKey {
        index: usize,
        field: &'static str,
        key: String,
    },

    #[error("accounts[{index}].{field}[\"{key}\"]: element key '{element}' does not match")]
    KeyMismatch {
        index: usize,
        field: &'static str,
        key: String,
        element: String,
    },

    #[error("accounts[{index}].threshold: must be at least 1")]
    InvalidThreshold { index: usize },
}

impl ValidationError {
    /// Position of the offending entry in the batch.
    pub fn index(&self) -> usize {
        match self {
            ValidationError::UnknownChain { index, .. }
            | ValidationError::MissingNonce { index, .. }
            | ValidationError::MissingField { index, .. }
            | ValidationError::TransitiveRef { index, .. }
            | ValidationError::InvalidRef { index, .. }
            | ValidationError::DuplicateRef { index, .. }
            | ValidationError::DuplicateKey { index, .. }
            | ValidationError::KeyMismatch { index, .. }
            | ValidationError::InvalidThreshold { index } => *index,
        }
    }
}

/// A validated batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub entries: Vec<AccountEntry>,
    /// Declared ref name to the index of the declaring entry.
    pub refs: BTreeMap<RefName, usize>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn validate_batch(specs: &[AccountSpec]) -> Result<Batch, ValidationError> {
    let mut entries = Vec::with_capacity(specs.len());
    let mut refs = BTreeMap::new();

    for (index, spec) in specs.iter().enumerate() {
        let entry = validate_entry(index, spec)?;
        if let Some(name) = entry.ref_name() {
            if let Some(&first) = refs.get(name) {
                return Err(ValidationError::DuplicateRef {
                    index,
                    first,
                    name: name.to_string(),
                });
            }
            refs.insert(name.clone(), index);
        }
        entries.push(entry);
    }

    Ok(Batch { entries, refs })
}

/// Fields shared by every kind, already checked.
struct Header {
    index: usize,
    kind: AccountKind,
    chain: Chain,
    address: Option<Address>,
    ref_name: Option<RefName>,
}

impl Header {
    fn require<T: Clone>(
        &self,
        field: &'static str,
        value: &Option<T>,
    ) -> Result<T, ValidationError> {
        value.clone().ok_or(ValidationError::MissingField {
            index: self.index,
            kind: self.kind,
            field,
        })
    }

    fn missing_nonce(&self) -> ValidationError {
        ValidationError::MissingNonce {
            index: self.index,
            kind: self.kind,
        }
    }
}

fn validate_entry(index: usize, spec: &AccountSpec) -> Result<AccountEntry, ValidationError> {
    let chain = Chain::from_short_name(spec.chain()).ok_or_else(|| ValidationError::UnknownChain {
        index,
        chain: spec.chain().to_string(),
    })?;

    let address = match spec.address() {
        None => None,
        Some(AddressOrRef::Address(address)) => Some(address.clone()),
        Some(AddressOrRef::Ref(name)) => {
            return Err(ValidationError::TransitiveRef {
                index,
                token: name.token(),
            })
        }
    };

    let ref_name = spec
        .ref_name()
        .map(RefName::new)
        .transpose()
        .map_err(|source| ValidationError::InvalidRef { index, source })?;

    let header = Header {
        index,
        kind: spec.kind(),
        chain,
        address,
        ref_name,
    };

    match spec {
        AccountSpec::Safe(s) => safe_entry(header, s),
        AccountSpec::Roles(s) => roles_entry(header, s),
        AccountSpec::Delay(s) => delay_entry(header, s),
    }
}

fn safe_entry(h: Header, s: &SafeSpec) -> Result<AccountEntry, ValidationError> {
    if s.threshold == Some(0) {
        return Err(ValidationError::InvalidThreshold { index: h.index });
    }

    if let (Some(address), Some(threshold), Some(owners), Some(modules)) =
        (&h.address, s.threshold, &s.owners, &s.modules)
    {
        return Ok(AccountEntry::Resolved(Account::Safe(Safe {
            chain: h.chain,
            address: address.clone(),
            ref_name: h.ref_name.clone(),
            nonce: s.nonce.clone(),
            threshold,
            owners: owners.clone(),
            modules: modules.clone(),
        })));
    }

    if let Some(nonce) = &s.nonce {
        return Ok(AccountEntry::New(NewAccount::Safe(NewSafe {
            chain: h.chain,
            address: h.address.clone(),
            ref_name: h.ref_name.clone(),
            nonce: nonce.clone(),
            threshold: h.require("threshold", &s.threshold)?,
            owners: h.require("owners", &s.owners)?,
            modules: h.require("modules", &s.modules)?,
        })));
    }

    let address = h.address.clone().ok_or_else(|| h.missing_nonce())?;
    Ok(AccountEntry::Update(UpdateAccount::Safe(UpdateSafe {
        chain: h.chain,
        address,
        ref_name: h.ref_name,
        threshold: s.threshold,
        owners: s.owners.clone(),
        modules: s.modules.clone(),
    })))
}

fn roles_entry(h: Header, s: &RolesSpec) -> Result<AccountEntry, ValidationError> {
    check_keys(h.index, "roles", &s.roles)?;
    check_keys(h.index, "allowances", &s.allowances)?;

    let complete_roles = s.roles.as_ref().and_then(Patch::as_complete);
    let complete_allowances = s.allowances.as_ref().and_then(Patch::as_complete);
    if let (
        Some(address),
        Some(owner),
        Some(target),
        Some(avatar),
        Some(multisend),
        Some(roles),
        Some(allowances),
    ) = (
        &h.address,
        &s.owner,
        &s.target,
        &s.avatar,
        &s.multisend,
        complete_roles,
        complete_allowances,
    ) {
        return Ok(AccountEntry::Resolved(Account::Roles(Roles {
            chain: h.chain,
            address: address.clone(),
            ref_name: h.ref_name.clone(),
            nonce: s.nonce.clone(),
            owner: owner.clone(),
            target: target.clone(),
            avatar: avatar.clone(),
            multisend: multisend.clone(),
            roles: roles.to_vec(),
            allowances: allowances.to_vec(),
        })));
    }

    if let Some(nonce) = &s.nonce {
        return Ok(AccountEntry::New(NewAccount::Roles(NewRoles {
            chain: h.chain,
            address: h.address.clone(),
            ref_name: h.ref_name.clone(),
            nonce: nonce.clone(),
            owner: h.require("owner", &s.owner)?,
            target: h.require("target", &s.target)?,
            avatar: h.require("avatar", &s.avatar)?,
            multisend: s.multisend.clone(),
            roles: s.roles.clone(),
            allowances: s.allowances.clone(),
        })));
    }

    let address = h.address.clone().ok_or_else(|| h.missing_nonce())?;
    Ok(AccountEntry::Update(UpdateAccount::Roles(UpdateRoles {
        chain: h.chain,
        address,
        ref_name: h.ref_name,
        owner: s.owner.clone(),
        target: s.target.clone(),
        avatar: s.avatar.clone(),
        multisend: s.multisend.clone(),
        roles: s.roles.clone(),
        allowances: s.allowances.clone(),
    })))
}

fn delay_entry(h: Header, s: &DelaySpec) -> Result<AccountEntry, ValidationError> {
    if let (
        Some(address),
        Some(owner),
        Some(target),
        Some(avatar),
        Some(cooldown),
        Some(expiration),
        Some(modules),
    ) = (
        &h.address,
        &s.owner,
        &s.target,
        &s.avatar,
        &s.cooldown,
        &s.expiration,
        &s.modules,
    ) {
        return Ok(AccountEntry::Resolved(Account::Delay(Delay {
            chain: h.chain,
            address: address.clone(),
            ref_name: h.ref_name.clone(),
            nonce: s.nonce.clone(),
            owner: owner.clone(),
            target: target.clone(),
            avatar: avatar.clone(),
            cooldown: cooldown.clone(),
            expiration: expiration.clone(),
            modules: modules.clone(),
        })));
    }

    if let Some(nonce) = &s.nonce {
        return Ok(AccountEntry::New(NewAccount::Delay(NewDelay {
            chain: h.chain,
            address: h.address.clone(),
            ref_name: h.ref_name.clone(),
            nonce: nonce.clone(),
            owner: h.require("owner", &s.owner)?,
            target: h.require("target", &s.target)?,
            avatar: h.require("avatar", &s.avatar)?,
            cooldown: h.require("cooldown", &s.cooldown)?,
            expiration: h.require("expiration", &s.expiration)?,
            modules: s.modules.clone(),
        })));
    }

    let address = h.address.clone().ok_or_else(|| h.missing_nonce())?;
    Ok(AccountEntry::Update(UpdateAccount::Delay(UpdateDelay {
        chain: h.chain,
        address,
        ref_name: h.ref_name,
        owner: s.owner.clone(),
        target: s.target.clone(),
        avatar: s.avatar.clone(),
        cooldown: s.cooldown.clone(),
        expiration: s.expiration.clone(),
        modules: s.modules.clone(),
    })))
}

/// Element keys must be unique within a complete list and must match their
/// map key within a merge patch. Keys are hex, so case is ignored.
fn check_keys<T: Keyed>(
    index: usize,
    field: &'static str,
    patch: &Option<Patch<T>>,
) -> Result<(), ValidationError> {
    let mut seen: Vec<String> = Vec::new();
    let mut mark = |key: &str| {
        let key = key.to_ascii_lowercase();
        if seen.contains(&key) {
            return Err(ValidationError::DuplicateKey { index, field, key });
        }
        seen.push(key);
        Ok(())
    };

    match patch {
        None => Ok(()),
        Some(Patch::Replace(items)) => items.iter().try_for_each(|item| mark(item.key())),
        Some(Patch::Merge(edits)) => {
            for (key, value) in edits {
                mark(key)?;
                if let Some(element) = value {
                    if !element.key().eq_ignore_ascii_case(key) {
                        return Err(ValidationError::KeyMismatch {
                            index,
                            field,
                            key: key.clone(),
                            element: element.key().to_string(),
                        });
                    }
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const A: &str = "0x1111111111111111111111111111111111111111";
    const B: &str = "0x2222222222222222222222222222222222222222";

    fn batch(value: Value) -> Result<Batch, ValidationError> {
        let specs: Vec<AccountSpec> = serde_json::from_value(value).unwrap();
        validate_batch(&specs)
    }

    #[test]
    fn test_classification() {
        let batch = batch(json!([
            { "type": "SAFE", "chain": "eth", "nonce": "7", "threshold": 1, "owners": [A], "modules": [] },
            { "type": "SAFE", "chain": "eth", "address": A, "threshold": 2 },
            { "type": "SAFE", "chain": "eth", "address": B, "threshold": 1, "owners": [A], "modules": [] },
        ]))
        .unwrap();

        let kinds: Vec<_> = batch.entries.iter().map(|e| e.lifecycle().to_string()).collect();
        assert_eq!(kinds, ["new", "update", "resolved"]);
    }

    #[test]
    fn test_new_entry_requires_nonce() {
        let err = batch(json!([
            { "type": "DELAY", "chain": "gno", "owner": A, "target": A, "avatar": A, "cooldown": 1, "expiration": 2 }
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingNonce {
                index: 0,
                kind: AccountKind::Delay
            }
        );
        assert!(err.to_string().starts_with("accounts[0].nonce:"));
    }

    #[test]
    fn test_new_entry_requires_kind_config() {
        let err = batch(json!([
            { "type": "ROLES", "chain": "gno", "nonce": "0", "owner": A, "avatar": A }
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                index: 0,
                kind: AccountKind::Roles,
                field: "target"
            }
        );
    }

    #[test]
    fn test_duplicate_refs_are_rejected() {
        let err = batch(json!([
            { "type": "SAFE", "chain": "eth", "ref": "ops", "nonce": "1", "threshold": 1, "owners": [A], "modules": [] },
            { "type": "SAFE", "chain": "eth", "ref": "$ops", "nonce": "2", "threshold": 1, "owners": [A], "modules": [] },
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateRef {
                index: 1,
                first: 0,
                name: "ops".to_string()
            }
        );
    }

    #[test]
    fn test_ref_table_records_declaring_entry() {
        let batch = batch(json!([
            { "type": "SAFE", "chain": "eth", "address": A, "threshold": 3 },
            { "type": "SAFE", "chain": "eth", "ref": "$vault", "nonce": "1", "threshold": 1, "owners": [A], "modules": [] },
        ]))
        .unwrap();
        assert_eq!(batch.refs.get(&RefName::new("vault").unwrap()), Some(&1));
    }

    #[test]
    fn test_invalid_ref_name() {
        let err = batch(json!([
            { "type": "SAFE", "chain": "eth", "ref": "Treasury", "address": A }
        ]))
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRef { index: 0, .. }));
    }

    #[test]
    fn test_ref_in_address_is_transitive() {
        let err = batch(json!([
            { "type": "SAFE", "chain": "eth", "address": "$other", "threshold": 1 }
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::TransitiveRef {
                index: 0,
                token: "$other".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_chain() {
        let err = batch(json!([{ "type": "SAFE", "chain": "mainnet", "address": A }])).unwrap_err();
        assert_eq!(err.index(), 0);
        assert_eq!(err.to_string(), "accounts[0].chain: unknown chain 'mainnet'");
    }

    #[test]
    fn test_zero_threshold() {
        let err = batch(json!([{ "type": "SAFE", "chain": "eth", "address": A, "threshold": 0 }]))
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidThreshold { index: 0 });
    }

    #[test]
    fn test_role_keys_are_checked() {
        let role = |key: &str| json!({ "key": key, "members": [] });

        let err = batch(json!([
            { "type": "ROLES", "chain": "eth", "address": A, "roles": [role("0xaa"), role("0xAA")] }
        ]))
        .unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateKey { field: "roles", .. }));

        let err = batch(json!([
            { "type": "ROLES", "chain": "eth", "address": A, "roles": { "0xaa": role("0xbb") } }
        ]))
        .unwrap_err();
        assert!(matches!(err, ValidationError::KeyMismatch { field: "roles", .. }));
    }

    #[test]
    fn test_merge_patch_keeps_roles_entry_an_update() {
        let batch = batch(json!([{
            "type": "ROLES", "chain": "eth", "address": A,
            "owner": A, "target": A, "avatar": A, "multisend": [],
            "roles": { "0x01": null }, "allowances": []
        }]))
        .unwrap();
        assert!(matches!(batch.entries[0], AccountEntry::Update(UpdateAccount::Roles(_))));
    }
}
