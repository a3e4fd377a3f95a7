//! Structural walker over account trees.
//!
//! Every account shape has a `walk` method that rebuilds it leaf by leaf
//! through a [`Visitor`]. Address slots (`A`, the positions that may hold a
//! `$ref`) go through [`SlotVisitor::slot`] and may change type; plain
//! addresses and hex leaves keep their type. Reference substitution and
//! lowercasing are both visitors, so there is one traversal to keep in sync
//! with the schema.

use std::fmt;

use crate::account::{
    Account, AccountEntry, Delay, NewAccount, NewDelay, NewRoles, NewSafe, Roles, Safe,
    UpdateAccount, UpdateDelay, UpdateRoles, UpdateSafe,
};
use crate::address::Address;
use crate::roles::{Allowance, Condition, Function, Patch, Role, Target};

/// Location of a leaf within a batch, e.g. `accounts[1].roles[0].members[2]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(String);

impl FieldPath {
    /// Root path of batch entry `index`.
    pub fn entry(index: usize) -> Self {
        Self(format!("accounts[{index}]"))
    }

    pub fn field(&self, name: &str) -> Self {
        Self(format!("{}.{name}", self.0))
    }

    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{index}]", self.0))
    }

    /// Entry of a keyed-map patch.
    pub fn key(&self, key: &str) -> Self {
        Self(format!("{}[{key:?}]", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Callbacks for leaves whose type never changes. Defaults copy the leaf.
pub trait Visitor {
    type Error;

    fn address(&mut self, _path: &FieldPath, value: &Address) -> Result<Address, Self::Error> {
        Ok(value.clone())
    }

    /// Hex-encoded leaves: role and allowance keys, selectors, comp values.
    fn hex(&mut self, _path: &FieldPath, value: &str) -> Result<String, Self::Error> {
        Ok(value.to_string())
    }
}

/// Maps address slots of type `A` to type `B`.
pub trait SlotVisitor<A, B>: Visitor {
    fn slot(&mut self, path: &FieldPath, value: &A) -> Result<B, Self::Error>;
}

fn walk_each<T, U, V, F>(
    path: &FieldPath,
    items: &[T],
    v: &mut V,
    mut f: F,
) -> Result<Vec<U>, V::Error>
where
    V: Visitor,
    F: FnMut(&T, &FieldPath, &mut V) -> Result<U, V::Error>,
{
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        out.push(f(item, &path.index(i), v)?);
    }
    Ok(out)
}

fn walk_opt<T, U, V, F>(
    path: &FieldPath,
    value: &Option<T>,
    v: &mut V,
    mut f: F,
) -> Result<Option<U>, V::Error>
where
    V: Visitor,
    F: FnMut(&T, &FieldPath, &mut V) -> Result<U, V::Error>,
{
    match value {
        Some(inner) => f(inner, path, v).map(Some),
        None => Ok(None),
    }
}

fn walk_patch<T, U, V, F>(
    path: &FieldPath,
    patch: &Patch<T>,
    v: &mut V,
    mut f: F,
) -> Result<Patch<U>, V::Error>
where
    V: Visitor,
    F: FnMut(&T, &FieldPath, &mut V) -> Result<U, V::Error>,
{
    match patch {
        Patch::Replace(items) => walk_each(path, items, v, f).map(Patch::Replace),
        Patch::Merge(edits) => {
            let mut out = Vec::with_capacity(edits.len());
            for (key, value) in edits {
                let entry_path = path.key(key);
                let key = v.hex(&entry_path, key)?;
                let value = walk_opt(&entry_path, value, v, &mut f)?;
                out.push((key, value));
            }
            Ok(Patch::Merge(out))
        }
    }
}

fn slots<A, B, V: SlotVisitor<A, B>>(
    path: &FieldPath,
    items: &[A],
    v: &mut V,
) -> Result<Vec<B>, V::Error> {
    walk_each(path, items, v, |item, p, v| v.slot(p, item))
}

fn addresses<V: Visitor>(
    path: &FieldPath,
    items: &[Address],
    v: &mut V,
) -> Result<Vec<Address>, V::Error> {
    walk_each(path, items, v, |item, p, v| v.address(p, item))
}

// =============================================================================
// Roles schema
// =============================================================================

impl<A> Role<A> {
    pub fn walk<B, V: SlotVisitor<A, B>>(
        &self,
        path: &FieldPath,
        v: &mut V,
    ) -> Result<Role<B>, V::Error> {
        Ok(Role {
            key: v.hex(&path.field("key"), &self.key)?,
            members: slots(&path.field("members"), &self.members, v)?,
            targets: walk_each(&path.field("targets"), &self.targets, v, Target::walk)?,
            annotations: self.annotations.clone(),
        })
    }
}

impl Target {
    pub fn walk<V: Visitor>(&self, path: &FieldPath, v: &mut V) -> Result<Target, V::Error> {
        Ok(Target {
            address: v.address(&path.field("address"), &self.address)?,
            clearance: self.clearance,
            execution_options: self.execution_options,
            functions: walk_each(&path.field("functions"), &self.functions, v, Function::walk)?,
        })
    }
}

impl Function {
    pub fn walk<V: Visitor>(&self, path: &FieldPath, v: &mut V) -> Result<Function, V::Error> {
        Ok(Function {
            selector: v.hex(&path.field("selector"), &self.selector)?,
            wildcarded: self.wildcarded,
            execution_options: self.execution_options,
            condition: walk_opt(&path.field("condition"), &self.condition, v, Condition::walk)?,
        })
    }
}

impl Condition {
    pub fn walk<V: Visitor>(&self, path: &FieldPath, v: &mut V) -> Result<Condition, V::Error> {
        let comp_value = match &self.comp_value {
            Some(value) => Some(v.hex(&path.field("compValue"), value)?),
            None => None,
        };
        Ok(Condition {
            param_type: self.param_type,
            operator: self.operator,
            comp_value,
            children: walk_each(&path.field("children"), &self.children, v, Condition::walk)?,
        })
    }
}

impl Allowance {
    pub fn walk<V: Visitor>(&self, path: &FieldPath, v: &mut V) -> Result<Allowance, V::Error> {
        Ok(Allowance {
            key: v.hex(&path.field("key"), &self.key)?,
            ..self.clone()
        })
    }
}

fn roles_list<A, B, V: SlotVisitor<A, B>>(
    path: &FieldPath,
    roles: &[Role<A>],
    v: &mut V,
) -> Result<Vec<Role<B>>, V::Error> {
    walk_each(path, roles, v, |role, p, v| role.walk(p, v))
}

fn roles_patch<A, B, V: SlotVisitor<A, B>>(
    path: &FieldPath,
    patch: &Option<Patch<Role<A>>>,
    v: &mut V,
) -> Result<Option<Patch<Role<B>>>, V::Error> {
    walk_opt(path, patch, v, |patch, p, v| {
        walk_patch(p, patch, v, |role, p, v| role.walk(p, v))
    })
}

fn allowances_patch<V: Visitor>(
    path: &FieldPath,
    patch: &Option<Patch<Allowance>>,
    v: &mut V,
) -> Result<Option<Patch<Allowance>>, V::Error> {
    walk_opt(path, patch, v, |patch, p, v| walk_patch(p, patch, v, Allowance::walk))
}

// =============================================================================
// Resolved shapes
// =============================================================================

impl<A> Safe<A> {
    pub fn walk<B, V: SlotVisitor<A, B>>(
        &self,
        path: &FieldPath,
        v: &mut V,
    ) -> Result<Safe<B>, V::Error> {
        Ok(Safe {
            chain: self.chain,
            address: v.address(&path.field("address"), &self.address)?,
            ref_name: self.ref_name.clone(),
            nonce: self.nonce.clone(),
            threshold: self.threshold,
            owners: slots(&path.field("owners"), &self.owners, v)?,
            modules: slots(&path.field("modules"), &self.modules, v)?,
        })
    }
}

impl<A> Roles<A> {
    pub fn walk<B, V: SlotVisitor<A, B>>(
        &self,
        path: &FieldPath,
        v: &mut V,
    ) -> Result<Roles<B>, V::Error> {
        Ok(Roles {
            chain: self.chain,
            address: v.address(&path.field("address"), &self.address)?,
            ref_name: self.ref_name.clone(),
            nonce: self.nonce.clone(),
            owner: v.slot(&path.field("owner"), &self.owner)?,
            target: v.slot(&path.field("target"), &self.target)?,
            avatar: v.slot(&path.field("avatar"), &self.avatar)?,
            multisend: addresses(&path.field("multisend"), &self.multisend, v)?,
            roles: roles_list(&path.field("roles"), &self.roles, v)?,
            allowances: walk_each(&path.field("allowances"), &self.allowances, v, Allowance::walk)?,
        })
    }
}

impl<A> Delay<A> {
    pub fn walk<B, V: SlotVisitor<A, B>>(
        &self,
        path: &FieldPath,
        v: &mut V,
    ) -> Result<Delay<B>, V::Error> {
        Ok(Delay {
            chain: self.chain,
            address: v.address(&path.field("address"), &self.address)?,
            ref_name: self.ref_name.clone(),
            nonce: self.nonce.clone(),
            owner: v.slot(&path.field("owner"), &self.owner)?,
            target: v.slot(&path.field("target"), &self.target)?,
            avatar: v.slot(&path.field("avatar"), &self.avatar)?,
            cooldown: self.cooldown.clone(),
            expiration: self.expiration.clone(),
            modules: slots(&path.field("modules"), &self.modules, v)?,
        })
    }
}

impl<A> Account<A> {
    pub fn walk<B, V: SlotVisitor<A, B>>(
        &self,
        path: &FieldPath,
        v: &mut V,
    ) -> Result<Account<B>, V::Error> {
        Ok(match self {
            Account::Safe(a) => Account::Safe(a.walk(path, v)?),
            Account::Roles(a) => Account::Roles(a.walk(path, v)?),
            Account::Delay(a) => Account::Delay(a.walk(path, v)?),
        })
    }
}

// =============================================================================
// New shapes
// =============================================================================

fn own_address<V: Visitor>(
    path: &FieldPath,
    address: &Option<Address>,
    v: &mut V,
) -> Result<Option<Address>, V::Error> {
    walk_opt(&path.field("address"), address, v, |a, p, v| v.address(p, a))
}

impl<A> NewSafe<A> {
    pub fn walk<B, V: SlotVisitor<A, B>>(
        &self,
        path: &FieldPath,
        v: &mut V,
    ) -> Result<NewSafe<B>, V::Error> {
        Ok(NewSafe {
            chain: self.chain,
            address: own_address(path, &self.address, v)?,
            ref_name: self.ref_name.clone(),
            nonce: self.nonce.clone(),
            threshold: self.threshold,
            owners: slots(&path.field("owners"), &self.owners, v)?,
            modules: slots(&path.field("modules"), &self.modules, v)?,
        })
    }
}

impl<A> NewRoles<A> {
    pub fn walk<B, V: SlotVisitor<A, B>>(
        &self,
        path: &FieldPath,
        v: &mut V,
    ) -> Result<NewRoles<B>, V::Error> {
        Ok(NewRoles {
            chain: self.chain,
            address: own_address(path, &self.address, v)?,
            ref_name: self.ref_name.clone(),
            nonce: self.nonce.clone(),
            owner: v.slot(&path.field("owner"), &self.owner)?,
            target: v.slot(&path.field("target"), &self.target)?,
            avatar: v.slot(&path.field("avatar"), &self.avatar)?,
            multisend: walk_opt(&path.field("multisend"), &self.multisend, v, |m, p, v| {
                addresses(p, m, v)
            })?,
            roles: roles_patch(&path.field("roles"), &self.roles, v)?,
            allowances: allowances_patch(&path.field("allowances"), &self.allowances, v)?,
        })
    }
}

impl<A> NewDelay<A> {
    pub fn walk<B, V: SlotVisitor<A, B>>(
        &self,
        path: &FieldPath,
        v: &mut V,
    ) -> Result<NewDelay<B>, V::Error> {
        Ok(NewDelay {
            chain: self.chain,
            address: own_address(path, &self.address, v)?,
            ref_name: self.ref_name.clone(),
            nonce: self.nonce.clone(),
            owner: v.slot(&path.field("owner"), &self.owner)?,
            target: v.slot(&path.field("target"), &self.target)?,
            avatar: v.slot(&path.field("avatar"), &self.avatar)?,
            cooldown: self.cooldown.clone(),
            expiration: self.expiration.clone(),
            modules: walk_opt(&path.field("modules"), &self.modules, v, |m, p, v| slots(p, m, v))?,
        })
    }
}

impl<A> NewAccount<A> {
    pub fn walk<B, V: SlotVisitor<A, B>>(
        &self,
        path: &FieldPath,
        v: &mut V,
    ) -> Result<NewAccount<B>, V::Error> {
        Ok(match self {
            NewAccount::Safe(a) => NewAccount::Safe(a.walk(path, v)?),
            NewAccount::Roles(a) => NewAccount::Roles(a.walk(path, v)?),
            NewAccount::Delay(a) => NewAccount::Delay(a.walk(path, v)?),
        })
    }
}

// =============================================================================
// Update shapes
// =============================================================================

fn opt_slot<A, B, V: SlotVisitor<A, B>>(
    path: &FieldPath,
    value: &Option<A>,
    v: &mut V,
) -> Result<Option<B>, V::Error> {
    walk_opt(path, value, v, |a, p, v| v.slot(p, a))
}

fn opt_slots<A, B, V: SlotVisitor<A, B>>(
    path: &FieldPath,
    value: &Option<Vec<A>>,
    v: &mut V,
) -> Result<Option<Vec<B>>, V::Error> {
    walk_opt(path, value, v, |items, p, v| slots(p, items, v))
}

impl<A> UpdateSafe<A> {
    pub fn walk<B, V: SlotVisitor<A, B>>(
        &self,
        path: &FieldPath,
        v: &mut V,
    ) -> Result<UpdateSafe<B>, V::Error> {
        Ok(UpdateSafe {
            chain: self.chain,
            address: v.address(&path.field("address"), &self.address)?,
            ref_name: self.ref_name.clone(),
            threshold: self.threshold,
            owners: opt_slots(&path.field("owners"), &self.owners, v)?,
            modules: opt_slots(&path.field("modules"), &self.modules, v)?,
        })
    }
}

impl<A> UpdateRoles<A> {
    pub fn walk<B, V: SlotVisitor<A, B>>(
        &self,
        path: &FieldPath,
        v: &mut V,
    ) -> Result<UpdateRoles<B>, V::Error> {
        Ok(UpdateRoles {
            chain: self.chain,
            address: v.address(&path.field("address"), &self.address)?,
            ref_name: self.ref_name.clone(),
            owner: opt_slot(&path.field("owner"), &self.owner, v)?,
            target: opt_slot(&path.field("target"), &self.target, v)?,
            avatar: opt_slot(&path.field("avatar"), &self.avatar, v)?,
            multisend: walk_opt(&path.field("multisend"), &self.multisend, v, |m, p, v| {
                addresses(p, m, v)
            })?,
            roles: roles_patch(&path.field("roles"), &self.roles, v)?,
            allowances: allowances_patch(&path.field("allowances"), &self.allowances, v)?,
        })
    }
}

impl<A> UpdateDelay<A> {
    pub fn walk<B, V: SlotVisitor<A, B>>(
        &self,
        path: &FieldPath,
        v: &mut V,
    ) -> Result<UpdateDelay<B>, V::Error> {
        Ok(UpdateDelay {
            chain: self.chain,
            address: v.address(&path.field("address"), &self.address)?,
            ref_name: self.ref_name.clone(),
            owner: opt_slot(&path.field("owner"), &self.owner, v)?,
            target: opt_slot(&path.field("target"), &self.target, v)?,
            avatar: opt_slot(&path.field("avatar"), &self.avatar, v)?,
            cooldown: self.cooldown.clone(),
            expiration: self.expiration.clone(),
            modules: opt_slots(&path.field("modules"), &self.modules, v)?,
        })
    }
}

impl<A> UpdateAccount<A> {
    pub fn walk<B, V: SlotVisitor<A, B>>(
        &self,
        path: &FieldPath,
        v: &mut V,
    ) -> Result<UpdateAccount<B>, V::Error> {
        Ok(match self {
            UpdateAccount::Safe(a) => UpdateAccount::Safe(a.walk(path, v)?),
            UpdateAccount::Roles(a) => UpdateAccount::Roles(a.walk(path, v)?),
            UpdateAccount::Delay(a) => UpdateAccount::Delay(a.walk(path, v)?),
        })
    }
}

impl<A> AccountEntry<A> {
    pub fn walk<B, V: SlotVisitor<A, B>>(
        &self,
        path: &FieldPath,
        v: &mut V,
    ) -> Result<AccountEntry<B>, V::Error> {
        Ok(match self {
            AccountEntry::New(a) => AccountEntry::New(a.walk(path, v)?),
            AccountEntry::Update(a) => AccountEntry::Update(a.walk(path, v)?),
            AccountEntry::Resolved(a) => AccountEntry::Resolved(a.walk(path, v)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressOrRef;
    use crate::chain::Chain;
    use crate::uint::Uint;

    /// Records slot paths and renders refs as `<name>` placeholders.
    #[derive(Default)]
    struct Recorder {
        slots: Vec<String>,
        hex: Vec<String>,
    }

    impl Visitor for Recorder {
        type Error = String;

        fn hex(&mut self, path: &FieldPath, value: &str) -> Result<String, String> {
            self.hex.push(path.to_string());
            Ok(value.to_uppercase())
        }
    }

    impl SlotVisitor<AddressOrRef, String> for Recorder {
        fn slot(&mut self, path: &FieldPath, value: &AddressOrRef) -> Result<String, String> {
            self.slots.push(path.to_string());
            match value {
                AddressOrRef::Ref(name) if name.as_str() == "broken" => Err(format!("bad {path}")),
                other => Ok(other.to_string()),
            }
        }
    }

    fn addr(n: u8) -> Address {
        Address::parse(&format!("0x{}", format!("{n:02x}").repeat(20))).unwrap()
    }

    fn slot(s: &str) -> AddressOrRef {
        s.parse().unwrap()
    }

    fn update_roles() -> UpdateRoles {
        UpdateRoles {
            chain: Chain::from_short_name("eth").unwrap(),
            address: addr(1),
            ref_name: None,
            owner: Some(slot("$safe")),
            target: None,
            avatar: None,
            multisend: None,
            roles: Some(Patch::Merge(vec![
                (
                    "0xab".to_string(),
                    Some(Role {
                        key: "0xab".to_string(),
                        members: vec![AddressOrRef::Address(addr(2)), slot("$ops")],
                        targets: vec![],
                        annotations: vec![],
                    }),
                ),
                ("0xcd".to_string(), None),
            ])),
            allowances: Some(Patch::Replace(vec![Allowance {
                key: "0xee".to_string(),
                refill: Uint::from(1u64),
                max_refill: Uint::zero(),
                period: Uint::zero(),
                balance: Uint::zero(),
                timestamp: Uint::zero(),
            }])),
        }
    }

    #[test]
    fn test_paths_cover_nested_members() {
        let entry = AccountEntry::Update(UpdateAccount::Roles(update_roles()));
        let mut recorder = Recorder::default();
        let walked: AccountEntry<String> = entry.walk(&FieldPath::entry(3), &mut recorder).unwrap();

        assert_eq!(
            recorder.slots,
            [
                "accounts[3].owner",
                "accounts[3].roles[\"0xab\"].members[0]",
                "accounts[3].roles[\"0xab\"].members[1]",
            ]
        );
        assert!(recorder.hex.contains(&"accounts[3].allowances[0].key".to_string()));

        let AccountEntry::Update(UpdateAccount::Roles(roles)) = walked else {
            panic!("shape changed");
        };
        assert_eq!(roles.owner.as_deref(), Some("$safe"));
        let Some(Patch::Merge(edits)) = roles.roles else {
            panic!("patch kind changed");
        };
        assert_eq!(edits[0].0, "0XAB");
        assert!(edits[1].1.is_none());
    }

    #[test]
    fn test_first_error_stops_the_walk() {
        let mut roles = update_roles();
        roles.owner = Some(slot("$broken"));
        let mut recorder = Recorder::default();
        let err = roles.walk::<String, _>(&FieldPath::entry(0), &mut recorder).unwrap_err();
        assert_eq!(err, "bad accounts[0].owner");
        assert_eq!(recorder.slots.len(), 1);
    }
}
