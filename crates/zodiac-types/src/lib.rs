//! Core types for Zodiac OS account constellations.
//!
//! This crate provides:
//! - [`chain`]: the static chain registry
//! - [`address`]: addresses, `$refs` and prefixed addresses
//! - [`uint`]: arbitrary-precision integers serialized as decimal strings
//! - [`roles`]: the Roles-module schema and keyed-list patches
//! - [`account`]: Safe / Roles / Delay accounts in their New, Update and
//!   Resolved shapes
//! - [`spec`]: the loose shape callers author
//! - [`validate`]: classification of authored batches
//! - [`walk`]: the structural walker used for ref substitution and
//!   normalization

pub mod account;
pub mod address;
pub mod chain;
pub mod roles;
pub mod spec;
pub mod uint;
pub mod validate;
pub mod walk;

pub use account::{
    Account, AccountEntry, AccountKind, Delay, Lifecycle, NewAccount, NewDelay, NewRoles, NewSafe,
    Roles, Safe, UpdateAccount, UpdateDelay, UpdateRoles, UpdateSafe,
};
pub use address::{Address, AddressOrRef, ParseError, PrefixedAddress, RefName};
pub use chain::{Chain, ChainInfo};
pub use roles::{
    Allowance, Annotation, Clearance, Condition, ExecutionOptions, Function, Keyed, Patch, Role,
    RoleWithRef, Target,
};
pub use spec::{AccountSpec, DelaySpec, RolesSpec, SafeSpec};
pub use uint::Uint;
pub use validate::{validate_batch, Batch, ValidationError};
pub use walk::FieldPath;
