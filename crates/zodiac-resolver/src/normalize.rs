//! Canonical lowercase form for account trees.
//!
//! Addresses and hex leaves arrive in any case (checksummed, upper, lower).
//! Comparisons between caller input and current state only happen after both
//! sides went through [`normalize_account`]:
//! - every address, including role members, target addresses and multisend
//! - role and allowance keys
//! - function selectors and condition comp values
//!
//! Normalization is total and idempotent.

use std::convert::Infallible;

use zodiac_types::walk::{SlotVisitor, Visitor};
use zodiac_types::{Account, Address, AddressOrRef, FieldPath};

/// Visitor that lowercases every address and hex leaf.
#[derive(Debug, Default, Clone, Copy)]
pub struct Lowercase;

impl Visitor for Lowercase {
    type Error = Infallible;

    fn address(&mut self, _path: &FieldPath, value: &Address) -> Result<Address, Infallible> {
        Ok(value.to_lowercase())
    }

    fn hex(&mut self, _path: &FieldPath, value: &str) -> Result<String, Infallible> {
        Ok(value.to_ascii_lowercase())
    }
}

impl SlotVisitor<Address, Address> for Lowercase {
    fn slot(&mut self, _path: &FieldPath, value: &Address) -> Result<Address, Infallible> {
        Ok(value.to_lowercase())
    }
}

/// Refs are already lowercase by construction; only concrete addresses change.
impl SlotVisitor<AddressOrRef, AddressOrRef> for Lowercase {
    fn slot(
        &mut self,
        _path: &FieldPath,
        value: &AddressOrRef,
    ) -> Result<AddressOrRef, Infallible> {
        Ok(match value {
            AddressOrRef::Address(address) => AddressOrRef::Address(address.to_lowercase()),
            AddressOrRef::Ref(name) => AddressOrRef::Ref(name.clone()),
        })
    }
}

/// Lowercase every address and hex leaf of a resolved account.
///
/// # Examples
///
/// ```
/// use zodiac_resolver::normalize::normalize_account;
/// use zodiac_types::Account;
///
/// let account: Account = serde_json::from_value(serde_json::json!({
///     "type": "SAFE",
///     "chain": "eth",
///     "address": "0x9641D764FC13C8B624C04430C7356C1C7C8102E2",
///     "threshold": 1,
///     "owners": ["0xABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD"],
///     "modules": []
/// }))
/// .unwrap();
///
/// let normalized = normalize_account(&account);
/// assert_eq!(
///     normalized.address().as_str(),
///     "0x9641d764fc13c8b624c04430c7356c1c7c8102e2"
/// );
/// ```
pub fn normalize_account(account: &Account) -> Account {
    match account.walk(&FieldPath::entry(0), &mut Lowercase) {
        Ok(normalized) => normalized,
        Err(never) => match never {},
    }
}

pub fn normalize_accounts(accounts: &[Account]) -> Vec<Account> {
    accounts.iter().map(normalize_account).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn roles_account(address: &str, member: &str, key: &str, selector: &str) -> Value {
        json!({
            "type": "ROLES",
            "chain": "gno",
            "address": address,
            "owner": address,
            "target": address,
            "avatar": address,
            "multisend": ["0x38869BF66A61CF6BDB996A6AE40D5853FD43B526"],
            "roles": [{
                "key": key,
                "members": [member],
                "targets": [{
                    "address": member,
                    "clearance": 2,
                    "functions": [{
                        "selector": selector,
                        "condition": { "paramType": 1, "operator": 16, "compValue": "0xABCDEF" }
                    }]
                }]
            }],
            "allowances": [{ "key": key, "refill": "10" }]
        })
    }

    fn parse(value: Value) -> Account {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalization_lowercases_every_leaf() {
        let account = parse(roles_account(
            "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
            "0xBbBbBbBbBbBbBbBbBbBbBbBbBbBbBbBbBbBbBbBb",
            "0x00000000000000000000000000000000000000000000000000000000000000FF",
            "0xA9059CBB",
        ));
        let mut value = serde_json::to_value(normalize_account(&account)).unwrap();
        value.as_object_mut().unwrap().remove("type");
        let normalized = value.to_string();
        assert!(!normalized.contains(|c: char| ('A'..='F').contains(&c)));
        assert!(normalized.contains("0xa9059cbb"));
        assert!(normalized.contains("0xabcdef"));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let account = parse(roles_account(
            "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
            "0xBbBbBbBbBbBbBbBbBbBbBbBbBbBbBbBbBbBbBbBb",
            "0xFF",
            "0xA9059CBB",
        ));
        let once = normalize_account(&account);
        assert_eq!(normalize_account(&once), once);
    }

    #[test]
    fn test_case_variants_normalize_equal() {
        let upper = parse(roles_account(
            "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
            "0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB",
            "0xFF",
            "0xA9059CBB",
        ));
        let lower = parse(roles_account(
            "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
            "0xff",
            "0xa9059cbb",
        ));
        assert_ne!(upper, lower);
        assert_eq!(normalize_account(&upper), normalize_account(&lower));
    }
}
