//! Per-execution state: initializer memoization and the identity map.
//!
//! One context is allocated per statement execution, owned by that
//! execution's result sequence, and discarded with it. Contexts are never
//! shared across threads, so the lookup-or-create operations need no
//! synchronization.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use log::trace;
use uuid::Uuid;

use crate::domain_model::NavigablePath;
use crate::type_registry::DomainValue;

use super::executor::{ManagedInstance, ManagedInstanceFactory};
use super::initializer::Initializer;

/// Identity-map key: entity name plus identifier value. Hashes float ids by
/// bit pattern so the relation stays reflexive.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityKey {
    pub entity_name: String,
    pub id: DomainValue,
}

impl Eq for IdentityKey {}

impl Hash for IdentityKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entity_name.hash(state);
        match &self.id {
            DomainValue::Null => 0u8.hash(state),
            DomainValue::Boolean(b) => b.hash(state),
            DomainValue::Integer(i) => i.hash(state),
            DomainValue::Float(x) => x.to_bits().hash(state),
            DomainValue::String(s) => s.hash(state),
            DomainValue::Date(d) => d.hash(state),
            DomainValue::Time(t) => t.hash(state),
            DomainValue::Timestamp(ts) => ts.hash(state),
            DomainValue::Uuid(u) => u.hash(state),
        }
    }
}

pub struct ExecutionContext {
    pub execution_id: Uuid,
    initializers: HashMap<NavigablePath, Rc<Initializer>>,
    identity_map: HashMap<IdentityKey, ManagedInstance>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext {
    pub fn new() -> Self {
        ExecutionContext {
            execution_id: Uuid::new_v4(),
            initializers: HashMap::new(),
            identity_map: HashMap::new(),
        }
    }

    /// Resolve-or-create: exactly one initializer exists per distinct
    /// navigable path within this context. This is what prevents duplicate
    /// sub-object construction when the same association is reachable via
    /// multiple result paths.
    pub fn initializer_for(
        &mut self,
        path: &NavigablePath,
        create: impl FnOnce() -> Initializer,
    ) -> Rc<Initializer> {
        if let Some(existing) = self.initializers.get(path) {
            return Rc::clone(existing);
        }
        trace!(
            "execution {}: creating initializer for path '{}'",
            self.execution_id,
            path
        );
        let initializer = Rc::new(create());
        self.initializers.insert(path.clone(), Rc::clone(&initializer));
        initializer
    }

    /// Resolve an entity instance by logical row key: the same key always
    /// yields the same instance within one execution. Returns the instance
    /// and whether it was created by this call.
    pub fn resolve_instance(
        &mut self,
        entity_name: &str,
        id: DomainValue,
        factory: &dyn ManagedInstanceFactory,
    ) -> (ManagedInstance, bool) {
        let key = IdentityKey {
            entity_name: entity_name.to_string(),
            id: id.clone(),
        };
        if let Some(existing) = self.identity_map.get(&key) {
            return (Rc::clone(existing), false);
        }
        let instance = factory.instantiate(entity_name, id);
        self.identity_map.insert(key, Rc::clone(&instance));
        (instance, true)
    }
}
