//! Runtime initializers: given a row of raw column values, produce or
//! resolve the value a result/fetch node describes, honoring laziness and
//! identity.

use std::cell::RefCell;
use std::rc::Rc;

use crate::translator::result_plan::{EmbeddedFetch, EntityResult, Fetch, ScalarResult};
use crate::type_registry::{self, BasicTypeId, DomainValue, SqlValue};

use super::context::ExecutionContext;
use super::errors::ExecutionError;
use super::executor::{ManagedInstance, ManagedInstanceFactory};

/// A value produced by result assembly.
#[derive(Debug, Clone)]
pub enum AssembledValue {
    Null,
    Scalar(DomainValue),
    Entity(ManagedInstance),
    Embedded {
        embeddable_name: String,
        values: Vec<(String, AssembledValue)>,
    },
    /// Join-fetched collection; shared so later rows append in place.
    Collection(Rc<RefCell<Vec<AssembledValue>>>),
    /// Lazy to-one association: only the target key was read. Not resolved
    /// unless explicitly accessed by the caller.
    Delayed {
        target_entity: String,
        key: DomainValue,
    },
    /// Lazy to-many association: loadable later by the owner's key.
    LazyCollection {
        target_entity: String,
        owner_key: DomainValue,
    },
}

impl AssembledValue {
    pub fn as_scalar(&self) -> Option<&DomainValue> {
        match self {
            AssembledValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&ManagedInstance> {
        match self {
            AssembledValue::Entity(e) => Some(e),
            _ => None,
        }
    }
}

/// Runtime counterpart of one result/fetch node. Owned by one execution
/// context (memoized there by navigable path) and discarded with it.
#[derive(Debug)]
pub enum Initializer {
    Scalar(ScalarResult),
    Entity(EntityResult),
    Embedded(EmbeddedFetch),
}

impl Initializer {
    pub fn resolve(
        &self,
        row: &[SqlValue],
        ctx: &mut ExecutionContext,
        factory: &dyn ManagedInstanceFactory,
    ) -> Result<AssembledValue, ExecutionError> {
        match self {
            Initializer::Scalar(scalar) => {
                let raw = read_slot(row, scalar.value_slot)?;
                let value = type_registry::descriptor(scalar.type_id).wrap(raw)?;
                Ok(match value {
                    DomainValue::Null => AssembledValue::Null,
                    v => AssembledValue::Scalar(v),
                })
            }
            Initializer::Entity(entity) => resolve_entity(entity, row, ctx, factory),
            Initializer::Embedded(embedded) => resolve_embedded(embedded, row, ctx, factory),
        }
    }
}

fn read_slot(row: &[SqlValue], slot: usize) -> Result<&SqlValue, ExecutionError> {
    row.get(slot).ok_or(ExecutionError::RowShapeMismatch {
        expected: slot + 1,
        found: row.len(),
    })
}

fn wrap_basic(
    row: &[SqlValue],
    slot: usize,
    type_id: BasicTypeId,
) -> Result<DomainValue, ExecutionError> {
    let raw = read_slot(row, slot)?;
    Ok(type_registry::descriptor(type_id).wrap(raw)?)
}

fn resolve_entity(
    plan: &EntityResult,
    row: &[SqlValue],
    ctx: &mut ExecutionContext,
    factory: &dyn ManagedInstanceFactory,
) -> Result<AssembledValue, ExecutionError> {
    let id = wrap_basic(row, plan.id_slot, plan.id_type)?;
    if id.is_null() {
        return Ok(AssembledValue::Null);
    }

    let (instance, created) = ctx.resolve_instance(&plan.entity_name, id.clone(), factory);
    if created {
        // The instance is registered in the identity map before its state
        // is filled, so cyclic fetch graphs resolve back to it instead of
        // recursing forever.
        let mut state: Vec<(String, AssembledValue)> = Vec::new();
        for attribute in &plan.attributes {
            let value = wrap_basic(row, attribute.value_slot, attribute.type_id)?;
            state.push((
                attribute.attribute_name.clone(),
                match value {
                    DomainValue::Null => AssembledValue::Null,
                    v => AssembledValue::Scalar(v),
                },
            ));
        }
        for fetch in &plan.fetches {
            let (name, value) = resolve_fetch(fetch, row, ctx, factory, &id)?;
            state.push((name, value));
        }
        let mut borrowed = instance.borrow_mut();
        for (name, value) in state {
            borrowed.set_attribute(name, value);
        }
    } else {
        // Re-encountered owner (repeated row): only join-fetched
        // collections still accumulate.
        for fetch in &plan.fetches {
            if let Fetch::Collection(collection) = fetch {
                if let Some(element_plan) = &collection.element {
                    append_collection_element(
                        &instance,
                        &collection.attribute_name,
                        element_plan,
                        row,
                        ctx,
                        factory,
                    )?;
                }
            }
        }
    }
    Ok(AssembledValue::Entity(instance))
}

fn resolve_fetch(
    fetch: &Fetch,
    row: &[SqlValue],
    ctx: &mut ExecutionContext,
    factory: &dyn ManagedInstanceFactory,
    owner_id: &DomainValue,
) -> Result<(String, AssembledValue), ExecutionError> {
    match fetch {
        Fetch::Embedded(embedded) => {
            let initializer = ctx.initializer_for(&embedded.navigable_path, || {
                Initializer::Embedded(embedded.clone())
            });
            let value = initializer.resolve(row, ctx, factory)?;
            Ok((embedded.attribute_name.clone(), value))
        }
        Fetch::Entity(entity_fetch) => {
            let value = match &entity_fetch.full {
                Some(full) => {
                    let initializer = ctx.initializer_for(&entity_fetch.navigable_path, || {
                        Initializer::Entity((**full).clone())
                    });
                    initializer.resolve(row, ctx, factory)?
                }
                None => {
                    let key = wrap_basic(row, entity_fetch.key_slot, entity_fetch.key_type)?;
                    if key.is_null() {
                        AssembledValue::Null
                    } else {
                        // Delayed: materialization happens only if the
                        // caller explicitly asks for it.
                        AssembledValue::Delayed {
                            target_entity: entity_fetch.target_entity.clone(),
                            key,
                        }
                    }
                }
            };
            Ok((entity_fetch.attribute_name.clone(), value))
        }
        Fetch::Collection(collection) => {
            let value = match &collection.element {
                Some(element_plan) => {
                    let elements = Rc::new(RefCell::new(Vec::new()));
                    let initializer = ctx.initializer_for(&collection.navigable_path, || {
                        Initializer::Entity((**element_plan).clone())
                    });
                    let element = initializer.resolve(row, ctx, factory)?;
                    if !matches!(element, AssembledValue::Null) {
                        elements.borrow_mut().push(element);
                    }
                    AssembledValue::Collection(elements)
                }
                None => AssembledValue::LazyCollection {
                    target_entity: collection.target_entity.clone(),
                    owner_key: owner_id.clone(),
                },
            };
            Ok((collection.attribute_name.clone(), value))
        }
    }
}

fn append_collection_element(
    owner: &ManagedInstance,
    attribute_name: &str,
    element_plan: &EntityResult,
    row: &[SqlValue],
    ctx: &mut ExecutionContext,
    factory: &dyn ManagedInstanceFactory,
) -> Result<(), ExecutionError> {
    let initializer = ctx.initializer_for(&element_plan.navigable_path, || {
        Initializer::Entity(element_plan.clone())
    });
    let element = initializer.resolve(row, ctx, factory)?;
    let AssembledValue::Entity(element_instance) = element else {
        return Ok(());
    };

    let handle = owner
        .borrow()
        .attribute(attribute_name)
        .and_then(|value| match value {
            AssembledValue::Collection(handle) => Some(Rc::clone(handle)),
            _ => None,
        });
    if let Some(handle) = handle {
        let already_present = handle.borrow().iter().any(|existing| {
            matches!(existing, AssembledValue::Entity(e) if Rc::ptr_eq(e, &element_instance))
        });
        if !already_present {
            handle
                .borrow_mut()
                .push(AssembledValue::Entity(element_instance));
        }
    }
    Ok(())
}

fn resolve_embedded(
    plan: &EmbeddedFetch,
    row: &[SqlValue],
    ctx: &mut ExecutionContext,
    factory: &dyn ManagedInstanceFactory,
) -> Result<AssembledValue, ExecutionError> {
    let mut values: Vec<(String, AssembledValue)> = Vec::new();
    let mut all_null = true;
    for attribute in &plan.attributes {
        let value = wrap_basic(row, attribute.value_slot, attribute.type_id)?;
        if !value.is_null() {
            all_null = false;
        }
        values.push((
            attribute.attribute_name.clone(),
            match value {
                DomainValue::Null => AssembledValue::Null,
                v => AssembledValue::Scalar(v),
            },
        ));
    }

    // When `contains_any_non_scalar_fetch` is set, the sub-fetches below go
    // through the identity machinery like any entity fetch; a purely scalar
    // composite stays an immutable tuple and never touches the identity map.
    for fetch in &plan.fetches {
        let (name, value) = resolve_fetch(fetch, row, ctx, factory, &DomainValue::Null)?;
        if !matches!(value, AssembledValue::Null) {
            all_null = false;
        }
        values.push((name, value));
    }

    if all_null {
        // Every mapped column was null: the composite itself is absent.
        return Ok(AssembledValue::Null);
    }
    Ok(AssembledValue::Embedded {
        embeddable_name: plan.embeddable_name.clone(),
        values,
    })
}
