//! Zodiac Resolver
//!
//! Turns a validated constellation batch into fully addressed, fully
//! populated accounts.
//!
//! This crate provides:
//! - [`refs`]: the ref table and single-pass `$ref` substitution
//! - [`merge`]: replace-vs-merge of partial updates onto current state
//! - [`normalize`]: the canonical lowercase form
//!
//! # Pipeline
//!
//! [`resolve_batch`] runs the stages in order:
//! 1. normalize the current accounts (baselines)
//! 2. resolve refs against entry addresses
//! 3. merge entries onto baselines or defaults
//! 4. normalize the result
//!
//! Every stage takes its inputs by reference and builds new values.

pub mod merge;
pub mod normalize;
pub mod refs;

use thiserror::Error;
use tracing::info;

use zodiac_types::{Account, Batch};

pub use merge::{
    apply_patch, merge_entries, merge_new, merge_update, BaselineSet, MergeError, DEFAULT_MULTISEND,
};
pub use normalize::{normalize_account, normalize_accounts};
pub use refs::{resolve_refs, AddressDerivation, AddressedEntry, RefTable, ResolveError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Merge(#[from] MergeError),
}

/// Resolve a validated batch against the current state of its accounts.
pub fn resolve_batch(
    batch: &Batch,
    derivation: &impl AddressDerivation,
    current: &[Account],
) -> Result<Vec<Account>, EngineError> {
    let baselines: BaselineSet = normalize_accounts(current).into_iter().collect();
    let entries = resolve_refs(batch, derivation)?;
    let merged = merge_entries(&entries, &baselines)?;
    let accounts = normalize_accounts(&merged);

    info!(
        accounts = accounts.len(),
        baselines = baselines.len(),
        refs = batch.refs.len(),
        "resolved constellation"
    );
    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use serde_json::json;
    use zodiac_types::{validate_batch, AccountSpec, Address};

    const SAFE: &str = "0x1111111111111111111111111111111111111111";
    const ROLES_UPPER: &str = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    const MEMBER_UPPER: &str = "0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";

    #[test]
    fn test_new_safe_and_roles_update_end_to_end() {
        let specs: Vec<AccountSpec> = serde_json::from_value(json!([
            {
                "type": "SAFE", "chain": "eth", "ref": "vault", "nonce": "0",
                "threshold": 1, "owners": [MEMBER_UPPER], "modules": [ROLES_UPPER]
            },
            {
                "type": "ROLES", "chain": "eth", "address": ROLES_UPPER,
                "avatar": "$vault", "target": "$vault",
                "roles": { "0xAB": { "key": "0xAB", "members": ["$vault"] } }
            }
        ]))
        .unwrap();
        let batch = validate_batch(&specs).unwrap();

        let current: Account = serde_json::from_value(json!({
            "type": "ROLES",
            "chain": "eth",
            "address": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "owner": MEMBER_UPPER,
            "target": MEMBER_UPPER,
            "avatar": MEMBER_UPPER,
            "multisend": [],
            "roles": [{ "key": "0xab", "members": [MEMBER_UPPER] }],
            "allowances": []
        }))
        .unwrap();

        let derived: HashMap<usize, Address> = [(0, Address::parse(SAFE).unwrap())].into();
        let accounts = resolve_batch(&batch, &derived, &[current]).unwrap();

        let out = serde_json::to_value(&accounts).unwrap();
        assert_eq!(out[0]["address"], SAFE);
        assert_eq!(out[0]["modules"][0], ROLES_UPPER.to_lowercase());
        assert_eq!(out[1]["owner"], MEMBER_UPPER.to_lowercase());
        assert_eq!(out[1]["avatar"], SAFE);
        // Upsert matched the baseline role despite the key's case.
        assert_eq!(out[1]["roles"].as_array().unwrap().len(), 1);
        assert_eq!(out[1]["roles"][0]["key"], "0xab");
        assert_eq!(out[1]["roles"][0]["members"][0], SAFE);
    }

    #[test]
    fn test_stage_errors_are_wrapped() {
        let specs: Vec<AccountSpec> = serde_json::from_value(json!([
            { "type": "DELAY", "chain": "gno", "address": SAFE, "cooldown": "60" }
        ]))
        .unwrap();
        let batch = validate_batch(&specs).unwrap();
        let err = resolve_batch(&batch, &HashMap::<usize, Address>::new(), &[]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Merge(MergeError::MissingBaseline { field: "owner", .. })
        ));
    }
}
