//! Reference resolution.
//!
//! Entries declare a ref (`"ref": "ops"`) and other fields use it (`"$ops"`).
//! Resolution runs in three steps:
//! 1. compute every entry's concrete address (own address for updates and
//!    resolved entries; supplied or derived address for new ones)
//! 2. build the ref table from the declared refs
//! 3. substitute every address slot in a single pass
//!
//! Refs may be used before the entry that declares them and an entry may
//! reference itself. There is no fixpoint iteration: an entry's own address
//! never depends on a ref.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use zodiac_types::walk::{SlotVisitor, Visitor};
use zodiac_types::{
    AccountEntry, AccountKind, Address, AddressOrRef, Batch, FieldPath, NewAccount, RefName,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("{path}: unresolved reference '{token}'")]
    UnresolvedRef { token: String, path: FieldPath },

    #[error("accounts[{index}]: no derived address for new {kind} account")]
    MissingDerivedAddress { index: usize, kind: AccountKind },
}

/// Source of the deterministic addresses of new accounts.
///
/// The client answers from the remote resolve response; tests use a map or
/// a closure.
pub trait AddressDerivation {
    fn derived_address(&self, index: usize, entry: &NewAccount) -> Option<Address>;
}

impl AddressDerivation for HashMap<usize, Address> {
    fn derived_address(&self, index: usize, _entry: &NewAccount) -> Option<Address> {
        self.get(&index).cloned()
    }
}

impl<F> AddressDerivation for F
where
    F: Fn(usize, &NewAccount) -> Option<Address>,
{
    fn derived_address(&self, index: usize, entry: &NewAccount) -> Option<Address> {
        self(index, entry)
    }
}

/// Declared ref name to concrete address.
#[derive(Debug, Default, Clone)]
pub struct RefTable {
    addresses: HashMap<RefName, Address>,
}

impl RefTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: RefName, address: Address) {
        self.addresses.insert(name, address);
    }

    pub fn get(&self, name: &RefName) -> Option<&Address> {
        self.addresses.get(name)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// A batch entry with its concrete address and no refs left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressedEntry {
    pub index: usize,
    pub address: Address,
    pub entry: AccountEntry<Address>,
}

struct Substitute<'a> {
    table: &'a RefTable,
}

impl Visitor for Substitute<'_> {
    type Error = ResolveError;
}

impl SlotVisitor<AddressOrRef, Address> for Substitute<'_> {
    fn slot(&mut self, path: &FieldPath, value: &AddressOrRef) -> Result<Address, ResolveError> {
        match value {
            AddressOrRef::Address(address) => Ok(address.clone()),
            AddressOrRef::Ref(name) => {
                self.table
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ResolveError::UnresolvedRef {
                        token: name.token(),
                        path: path.clone(),
                    })
            }
        }
    }
}

/// Concrete address of every entry, in batch order.
pub fn entry_addresses(
    batch: &Batch,
    derivation: &impl AddressDerivation,
) -> Result<Vec<Address>, ResolveError> {
    batch
        .entries
        .iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            AccountEntry::New(new) => new
                .address()
                .cloned()
                .or_else(|| derivation.derived_address(index, new))
                .ok_or(ResolveError::MissingDerivedAddress {
                    index,
                    kind: new.kind(),
                }),
            AccountEntry::Update(update) => Ok(update.address().clone()),
            AccountEntry::Resolved(account) => Ok(account.address().clone()),
        })
        .collect()
}

/// Replace every ref in `batch` with the address of the entry declaring it.
pub fn resolve_refs(
    batch: &Batch,
    derivation: &impl AddressDerivation,
) -> Result<Vec<AddressedEntry>, ResolveError> {
    let addresses = entry_addresses(batch, derivation)?;

    let mut table = RefTable::new();
    for (name, &index) in &batch.refs {
        if let Some(address) = addresses.get(index) {
            table.register(name.clone(), address.clone());
        }
    }
    debug!(entries = batch.len(), refs = table.len(), "resolving references");

    let mut substitute = Substitute { table: &table };
    batch
        .entries
        .iter()
        .zip(addresses)
        .enumerate()
        .map(|(index, (entry, address))| {
            let entry = entry.walk(&FieldPath::entry(index), &mut substitute)?;
            Ok(AddressedEntry {
                index,
                address,
                entry,
            })
        })
        .collect()
}
