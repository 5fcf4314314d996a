//! Result-mapping plan: the `DomainResult`/`Fetch` tree describing which
//! row-buffer slots feed which positions of the assembled object graph.
//!
//! The tree is owned by the compiled query and immutable after SQL AST build
//! time; runtime `Initializer`s are derived from it per execution.

use crate::domain_model::{FetchTiming, NavigablePath};
use crate::type_registry::BasicTypeId;

/// A top-level selected value.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainResult {
    Scalar(ScalarResult),
    Entity(EntityResult),
    Embedded(EmbeddedFetch),
}

impl DomainResult {
    pub fn navigable_path(&self) -> &NavigablePath {
        match self {
            DomainResult::Scalar(s) => &s.navigable_path,
            DomainResult::Entity(e) => &e.navigable_path,
            DomainResult::Embedded(e) => &e.navigable_path,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarResult {
    pub navigable_path: NavigablePath,
    pub value_slot: usize,
    pub type_id: BasicTypeId,
}

/// A selected or fetched entity: identifier slot, basic attribute slots, and
/// the sub-fetches hanging off it.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityResult {
    pub navigable_path: NavigablePath,
    pub entity_name: String,
    pub id_attribute: String,
    pub id_slot: usize,
    pub id_type: BasicTypeId,
    pub attributes: Vec<BasicAttributeResult>,
    pub fetches: Vec<Fetch>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicAttributeResult {
    pub attribute_name: String,
    pub value_slot: usize,
    pub type_id: BasicTypeId,
}

/// An association or embedded sub-value attached to a parent result.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch {
    Embedded(EmbeddedFetch),
    Entity(EntityFetch),
    Collection(CollectionFetch),
}

impl Fetch {
    pub fn navigable_path(&self) -> &NavigablePath {
        match self {
            Fetch::Embedded(f) => &f.navigable_path,
            Fetch::Entity(f) => &f.navigable_path,
            Fetch::Collection(f) => &f.navigable_path,
        }
    }

    /// Whether this fetch can produce a non-scalar (object) result. Gates
    /// identity-graph bookkeeping for the containing composite.
    pub fn is_non_scalar(&self) -> bool {
        match self {
            Fetch::Embedded(f) => f.contains_any_non_scalar_fetch,
            Fetch::Entity(_) | Fetch::Collection(_) => true,
        }
    }
}

/// Composite value fetch. The embedded value has no table of its own; its
/// columns ride on the owning entity's table group, and it may contain
/// association sub-fetches of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedFetch {
    pub navigable_path: NavigablePath,
    pub embeddable_name: String,
    pub attribute_name: String,
    pub attributes: Vec<BasicAttributeResult>,
    pub fetches: Vec<Fetch>,
    /// Recorded at construction time, after the child fetches are built:
    /// true when any child fetch yields a non-scalar result. A purely
    /// scalar composite is assembled as an immutable tuple and skips
    /// identity bookkeeping.
    pub contains_any_non_scalar_fetch: bool,
}

/// To-one association fetch. Join-fetched associations carry the full
/// target [`EntityResult`]; otherwise only the foreign-key slot is read and
/// materialization is delayed.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityFetch {
    pub navigable_path: NavigablePath,
    pub attribute_name: String,
    pub target_entity: String,
    pub timing: FetchTiming,
    pub key_slot: usize,
    pub key_type: BasicTypeId,
    pub full: Option<Box<EntityResult>>,
}

/// To-many association fetch. Join-fetched collections carry the element
/// [`EntityResult`]; otherwise the owner key is enough to load them later.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionFetch {
    pub navigable_path: NavigablePath,
    pub attribute_name: String,
    pub target_entity: String,
    pub timing: FetchTiming,
    pub owner_key_slot: usize,
    pub element: Option<Box<EntityResult>>,
}
