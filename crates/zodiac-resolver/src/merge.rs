//! Merging lifecycle entries into fully resolved accounts.
//!
//! - **Update + baseline**: every supplied field replaces the baseline's.
//!   `roles` and `allowances` replace when given as an array and upsert or
//!   delete by key when given as a map. All other lists replace.
//! - **New**: merged against the kind defaults (empty roles, allowances and
//!   modules, [`DEFAULT_MULTISEND`]), or against the baseline when the
//!   derived address is already deployed.
//! - **Resolved**: passed through.
//!
//! An update without a baseline only succeeds if it supplies every field.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use zodiac_types::{
    Account, AccountEntry, AccountKind, Address, Chain, Delay, Keyed, NewAccount, Patch,
    PrefixedAddress, Roles, Safe, UpdateAccount,
};

use crate::refs::AddressedEntry;

/// MultiSend contracts a new Roles module trusts when none are given.
pub const DEFAULT_MULTISEND: [&str; 2] = [
    "0x9641d764fc13c8b624c04430c7356c1c7c8102e2",
    "0x38869bf66a61cf6bdb996a6ae40d5853fd43b526",
];

pub fn default_multisend() -> Vec<Address> {
    DEFAULT_MULTISEND
        .iter()
        .filter_map(|address| Address::parse(address).ok())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("{account}: no current state to update; `{field}` must be supplied")]
    MissingBaseline {
        account: PrefixedAddress,
        field: &'static str,
    },

    #[error("{account}: expected a {expected} account but the current account is a {found}")]
    KindMismatch {
        account: PrefixedAddress,
        expected: AccountKind,
        found: AccountKind,
    },
}

/// Current accounts keyed by lowercase prefixed address.
#[derive(Debug, Default, Clone)]
pub struct BaselineSet {
    accounts: HashMap<PrefixedAddress, Account>,
}

impl BaselineSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, account: Account) {
        self.accounts
            .insert(account.prefixed_address().to_lowercase(), account);
    }

    pub fn get(&self, chain: Chain, address: &Address) -> Option<&Account> {
        self.accounts
            .get(&PrefixedAddress::Chain(chain, address.to_lowercase()))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl FromIterator<Account> for BaselineSet {
    fn from_iter<I: IntoIterator<Item = Account>>(iter: I) -> Self {
        let mut set = Self::new();
        for account in iter {
            set.insert(account);
        }
        set
    }
}

/// Apply a keyed-list patch to `current`.
///
/// Keys compare case-insensitively. Baseline order is kept and new keys are
/// appended in patch order.
pub fn apply_patch<T: Keyed + Clone>(current: &[T], patch: &Patch<T>) -> Vec<T> {
    let edits = match patch {
        Patch::Replace(items) => return items.clone(),
        Patch::Merge(edits) => edits,
    };

    let mut out = current.to_vec();
    for (key, value) in edits {
        let position = out
            .iter()
            .position(|item| item.key().eq_ignore_ascii_case(key));
        match (position, value) {
            (Some(i), Some(value)) => out[i] = value.clone(),
            (Some(i), None) => {
                out.remove(i);
            }
            (None, Some(value)) => out.push(value.clone()),
            (None, None) => {}
        }
    }
    out
}

/// Resolve the field from the update, falling back to the baseline.
fn pick<T: Clone>(
    account: &PrefixedAddress,
    field: &'static str,
    update: &Option<T>,
    baseline: Option<&T>,
) -> Result<T, MergeError> {
    update
        .clone()
        .or_else(|| baseline.cloned())
        .ok_or_else(|| MergeError::MissingBaseline {
            account: account.clone(),
            field,
        })
}

fn patched<T: Keyed + Clone>(
    account: &PrefixedAddress,
    field: &'static str,
    patch: &Option<Patch<T>>,
    baseline: Option<&[T]>,
) -> Result<Vec<T>, MergeError> {
    match (patch, baseline) {
        (Some(patch), baseline) => Ok(apply_patch(baseline.unwrap_or_default(), patch)),
        (None, Some(baseline)) => Ok(baseline.to_vec()),
        (None, None) => Err(MergeError::MissingBaseline {
            account: account.clone(),
            field,
        }),
    }
}

fn check_baseline(
    account: &PrefixedAddress,
    kind: AccountKind,
    baseline: Option<&Account>,
) -> Result<(), MergeError> {
    let Some(baseline) = baseline else {
        return Ok(());
    };
    if baseline.kind() != kind {
        return Err(MergeError::KindMismatch {
            account: account.clone(),
            expected: kind,
            found: baseline.kind(),
        });
    }
    Ok(())
}

/// Merge a partial update onto the current account at its address.
pub fn merge_update(
    update: &UpdateAccount<Address>,
    baseline: Option<&Account>,
) -> Result<Account, MergeError> {
    let account = PrefixedAddress::Chain(update.chain(), update.address().clone());
    check_baseline(&account, update.kind(), baseline)?;

    Ok(match update {
        UpdateAccount::Safe(u) => {
            let base = match baseline {
                Some(Account::Safe(b)) => Some(b),
                _ => None,
            };
            Account::Safe(Safe {
                chain: u.chain,
                address: u.address.clone(),
                ref_name: u.ref_name.clone().or_else(|| base.and_then(|b| b.ref_name.clone())),
                nonce: base.and_then(|b| b.nonce.clone()),
                threshold: pick(&account, "threshold", &u.threshold, base.map(|b| &b.threshold))?,
                owners: pick(&account, "owners", &u.owners, base.map(|b| &b.owners))?,
                modules: pick(&account, "modules", &u.modules, base.map(|b| &b.modules))?,
            })
        }
        UpdateAccount::Roles(u) => {
            let base = match baseline {
                Some(Account::Roles(b)) => Some(b),
                _ => None,
            };
            Account::Roles(Roles {
                chain: u.chain,
                address: u.address.clone(),
                ref_name: u.ref_name.clone().or_else(|| base.and_then(|b| b.ref_name.clone())),
                nonce: base.and_then(|b| b.nonce.clone()),
                owner: pick(&account, "owner", &u.owner, base.map(|b| &b.owner))?,
                target: pick(&account, "target", &u.target, base.map(|b| &b.target))?,
                avatar: pick(&account, "avatar", &u.avatar, base.map(|b| &b.avatar))?,
                multisend: pick(&account, "multisend", &u.multisend, base.map(|b| &b.multisend))?,
                roles: patched(&account, "roles", &u.roles, base.map(|b| b.roles.as_slice()))?,
                allowances: patched(
                    &account,
                    "allowances",
                    &u.allowances,
                    base.map(|b| b.allowances.as_slice()),
                )?,
            })
        }
        UpdateAccount::Delay(u) => {
            let base = match baseline {
                Some(Account::Delay(b)) => Some(b),
                _ => None,
            };
            Account::Delay(Delay {
                chain: u.chain,
                address: u.address.clone(),
                ref_name: u.ref_name.clone().or_else(|| base.and_then(|b| b.ref_name.clone())),
                nonce: base.and_then(|b| b.nonce.clone()),
                owner: pick(&account, "owner", &u.owner, base.map(|b| &b.owner))?,
                target: pick(&account, "target", &u.target, base.map(|b| &b.target))?,
                avatar: pick(&account, "avatar", &u.avatar, base.map(|b| &b.avatar))?,
                cooldown: pick(&account, "cooldown", &u.cooldown, base.map(|b| &b.cooldown))?,
                expiration: pick(
                    &account,
                    "expiration",
                    &u.expiration,
                    base.map(|b| &b.expiration),
                )?,
                modules: pick(&account, "modules", &u.modules, base.map(|b| &b.modules))?,
            })
        }
    })
}

/// Complete a new account at `address`.
pub fn merge_new(
    new: &NewAccount<Address>,
    address: &Address,
    baseline: Option<&Account>,
) -> Result<Account, MergeError> {
    let account = PrefixedAddress::Chain(new.chain(), address.clone());
    check_baseline(&account, new.kind(), baseline)?;

    Ok(match new {
        NewAccount::Safe(n) => Account::Safe(Safe {
            chain: n.chain,
            address: address.clone(),
            ref_name: n.ref_name.clone(),
            nonce: Some(n.nonce.clone()),
            threshold: n.threshold,
            owners: n.owners.clone(),
            modules: n.modules.clone(),
        }),
        NewAccount::Roles(n) => {
            let base = match baseline {
                Some(Account::Roles(b)) => Some(b),
                _ => None,
            };
            let base_roles = base.map(|b| b.roles.as_slice()).unwrap_or_default();
            let base_allowances = base.map(|b| b.allowances.as_slice()).unwrap_or_default();
            Account::Roles(Roles {
                chain: n.chain,
                address: address.clone(),
                ref_name: n.ref_name.clone(),
                nonce: Some(n.nonce.clone()),
                owner: n.owner.clone(),
                target: n.target.clone(),
                avatar: n.avatar.clone(),
                multisend: n
                    .multisend
                    .clone()
                    .or_else(|| base.map(|b| b.multisend.clone()))
                    .unwrap_or_else(default_multisend),
                roles: match &n.roles {
                    Some(patch) => apply_patch(base_roles, patch),
                    None => base_roles.to_vec(),
                },
                allowances: match &n.allowances {
                    Some(patch) => apply_patch(base_allowances, patch),
                    None => base_allowances.to_vec(),
                },
            })
        }
        NewAccount::Delay(n) => {
            let base = match baseline {
                Some(Account::Delay(b)) => Some(b),
                _ => None,
            };
            Account::Delay(Delay {
                chain: n.chain,
                address: address.clone(),
                ref_name: n.ref_name.clone(),
                nonce: Some(n.nonce.clone()),
                owner: n.owner.clone(),
                target: n.target.clone(),
                avatar: n.avatar.clone(),
                cooldown: n.cooldown.clone(),
                expiration: n.expiration.clone(),
                modules: n
                    .modules
                    .clone()
                    .or_else(|| base.map(|b| b.modules.clone()))
                    .unwrap_or_default(),
            })
        }
    })
}

/// Merge every addressed entry into a resolved account, in batch order.
pub fn merge_entries(
    entries: &[AddressedEntry],
    baselines: &BaselineSet,
) -> Result<Vec<Account>, MergeError> {
    let mut accounts = Vec::with_capacity(entries.len());
    for addressed in entries {
        let baseline = baselines.get(addressed.entry.chain(), &addressed.address);
        let account = match &addressed.entry {
            AccountEntry::New(new) => merge_new(new, &addressed.address, baseline)?,
            AccountEntry::Update(update) => merge_update(update, baseline)?,
            AccountEntry::Resolved(account) => account.clone(),
        };
        debug!(
            index = addressed.index,
            lifecycle = %addressed.entry.lifecycle(),
            account = %account.prefixed_address(),
            has_baseline = baseline.is_some(),
            "merged entry"
        );
        accounts.push(account);
    }
    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use zodiac_types::{NewRoles, Role, UpdateRoles, UpdateSafe};

    const ROLES: &str = "0x2222222222222222222222222222222222222222";
    const SAFE: &str = "0x1111111111111111111111111111111111111111";
    const MEMBER: &str = "0x3333333333333333333333333333333333333333";

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn eth() -> Chain {
        Chain::from_short_name("eth").unwrap()
    }

    fn role(key: &str) -> Role {
        Role {
            key: key.to_string(),
            members: vec![addr(MEMBER)],
            targets: vec![],
            annotations: vec![],
        }
    }

    fn baseline_roles(keys: &[&str]) -> Account {
        let roles: Vec<Value> = keys
            .iter()
            .map(|key| json!({ "key": key, "members": [MEMBER] }))
            .collect();
        serde_json::from_value(json!({
            "type": "ROLES",
            "chain": "eth",
            "address": ROLES,
            "nonce": "4",
            "owner": SAFE,
            "target": SAFE,
            "avatar": SAFE,
            "multisend": [],
            "roles": roles,
            "allowances": []
        }))
        .unwrap()
    }

    fn roles_update(roles: Option<Patch<Role>>) -> UpdateAccount<Address> {
        UpdateAccount::Roles(UpdateRoles {
            chain: eth(),
            address: addr(ROLES),
            ref_name: None,
            owner: None,
            target: None,
            avatar: None,
            multisend: None,
            roles,
            allowances: None,
        })
    }

    fn role_keys(account: &Account) -> Vec<String> {
        let Account::Roles(roles) = account else {
            panic!("expected roles account");
        };
        roles.roles.iter().map(|r| r.key.clone()).collect()
    }

    #[test]
    fn test_array_replaces_and_map_upserts() {
        let baseline = baseline_roles(&["0x01", "0x02"]);

        let replaced = merge_update(
            &roles_update(Some(Patch::Replace(vec![role("0x09")]))),
            Some(&baseline),
        )
        .unwrap();
        assert_eq!(role_keys(&replaced), ["0x09"]);

        let merged = merge_update(
            &roles_update(Some(Patch::Merge(vec![
                ("0x02".to_string(), None),
                ("0x03".to_string(), Some(role("0x03"))),
            ]))),
            Some(&baseline),
        )
        .unwrap();
        assert_eq!(role_keys(&merged), ["0x01", "0x03"]);
    }

    #[test]
    fn test_patch_keys_ignore_case() {
        let current = vec![role("0xab"), role("0xcd")];
        let mut replacement = role("0xAB");
        replacement.members.clear();
        let patch = Patch::Merge(vec![("0xAB".to_string(), Some(replacement))]);
        let out = apply_patch(&current, &patch);
        assert_eq!(out.len(), 2);
        assert!(out[0].members.is_empty());
        assert_eq!(out[1].key, "0xcd");
    }

    #[test]
    fn test_update_keeps_untouched_fields() {
        let baseline = baseline_roles(&["0x01"]);
        let merged = merge_update(&roles_update(None), Some(&baseline)).unwrap();
        assert_eq!(merged, baseline);
    }

    #[test]
    fn test_update_without_baseline_needs_every_field() {
        let partial = UpdateAccount::Safe(UpdateSafe {
            chain: eth(),
            address: addr(SAFE),
            ref_name: None,
            threshold: Some(2),
            owners: None,
            modules: Some(vec![]),
        });
        let err = merge_update(&partial, None).unwrap_err();
        assert_eq!(
            err,
            MergeError::MissingBaseline {
                account: PrefixedAddress::Chain(eth(), addr(SAFE)),
                field: "owners"
            }
        );

        let UpdateAccount::Safe(mut complete) = partial else {
            unreachable!()
        };
        complete.owners = Some(vec![addr(MEMBER)]);
        let merged = merge_update(&UpdateAccount::Safe(complete), None).unwrap();
        assert_eq!(merged.kind(), AccountKind::Safe);
    }

    #[test]
    fn test_keyed_map_without_baseline_applies_to_empty_list() {
        let update = UpdateAccount::Roles(UpdateRoles {
            chain: eth(),
            address: addr(ROLES),
            ref_name: None,
            owner: Some(addr(SAFE)),
            target: Some(addr(SAFE)),
            avatar: Some(addr(SAFE)),
            multisend: Some(vec![]),
            roles: Some(Patch::Merge(vec![("0x05".to_string(), Some(role("0x05")))])),
            allowances: Some(Patch::Merge(vec![])),
        });
        let merged = merge_update(&update, None).unwrap();
        assert_eq!(role_keys(&merged), ["0x05"]);
    }

    #[test]
    fn test_kind_mismatch() {
        let baseline = baseline_roles(&[]);
        let update = UpdateAccount::Safe(UpdateSafe {
            chain: eth(),
            address: addr(ROLES),
            ref_name: None,
            threshold: Some(1),
            owners: None,
            modules: None,
        });
        let err = merge_update(&update, Some(&baseline)).unwrap_err();
        assert!(matches!(
            err,
            MergeError::KindMismatch {
                expected: AccountKind::Safe,
                found: AccountKind::Roles,
                ..
            }
        ));
    }

    #[test]
    fn test_new_roles_gets_defaults() {
        let new = NewAccount::Roles(NewRoles {
            chain: eth(),
            address: None,
            ref_name: None,
            nonce: 9u64.into(),
            owner: addr(SAFE),
            target: addr(SAFE),
            avatar: addr(SAFE),
            multisend: None,
            roles: Some(Patch::Merge(vec![("0x01".to_string(), Some(role("0x01")))])),
            allowances: None,
        });
        let account = merge_new(&new, &addr(ROLES), None).unwrap();
        let Account::Roles(roles) = &account else {
            panic!("expected roles account");
        };
        assert_eq!(roles.multisend, default_multisend());
        assert_eq!(roles.multisend.len(), 2);
        assert!(roles.allowances.is_empty());
        assert_eq!(roles.nonce, Some(9u64.into()));
        assert_eq!(role_keys(&account), ["0x01"]);
    }

    #[test]
    fn test_baselines_are_found_case_insensitively() {
        let mixed: Account = serde_json::from_value(json!({
            "type": "SAFE",
            "chain": "eth",
            "address": "0xABCDEF0000000000000000000000000000ABCDEF",
            "threshold": 1,
            "owners": [MEMBER],
            "modules": []
        }))
        .unwrap();
        let baselines: BaselineSet = [mixed].into_iter().collect();
        let lower = addr("0xabcdef0000000000000000000000000000abcdef");
        assert!(baselines.get(eth(), &lower).is_some());
        assert!(baselines.get(Chain::from_short_name("gno").unwrap(), &lower).is_none());
    }

    #[test]
    fn test_same_address_on_another_chain_is_not_a_baseline() {
        let mut on_gno = serde_json::to_value(baseline_roles(&["0x01"])).unwrap();
        on_gno["chain"] = json!("gno");
        let baselines: BaselineSet =
            [serde_json::from_value::<Account>(on_gno).unwrap()].into_iter().collect();

        let entries = [AddressedEntry {
            index: 0,
            address: addr(ROLES),
            entry: AccountEntry::Update(roles_update(None)),
        }];
        let err = merge_entries(&entries, &baselines).unwrap_err();
        assert_eq!(
            err,
            MergeError::MissingBaseline {
                account: PrefixedAddress::Chain(eth(), addr(ROLES)),
                field: "owner"
            }
        );
    }
}
