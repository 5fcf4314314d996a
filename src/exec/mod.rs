//! Execution and result assembly: binds parameters, runs the rendered
//! statement through the executor collaborator, and assembles returned rows
//! into domain object graphs.

use std::collections::HashMap;

use log::debug;

use crate::sqm::nodes::ParameterLabel;
use crate::translator::result_plan::DomainResult;
use crate::type_registry::{self, DomainValue, SqlValue};

pub mod context;
pub(crate) mod errors;
pub mod executor;
pub mod initializer;
pub mod results;

pub use context::ExecutionContext;
pub use errors::ExecutionError;
pub use executor::{
    ColumnMetadata, DefaultInstanceFactory, EntityInstance, ExecutionOptions, ManagedInstance,
    ManagedInstanceFactory, RowCursor, StatementExecutor,
};
pub use initializer::{AssembledValue, Initializer};
pub use results::ResultSequence;

/// Parameter values supplied per execution of a compiled statement.
#[derive(Debug, Clone, Default)]
pub struct ParameterBindings {
    named: HashMap<String, DomainValue>,
    positional: HashMap<u32, DomainValue>,
}

impl ParameterBindings {
    pub fn new() -> Self {
        ParameterBindings::default()
    }

    pub fn bind(mut self, name: impl Into<String>, value: DomainValue) -> Self {
        self.named.insert(name.into(), value);
        self
    }

    pub fn bind_positional(mut self, position: u32, value: DomainValue) -> Self {
        self.positional.insert(position, value);
        self
    }

    pub fn get(&self, label: &ParameterLabel) -> Option<&DomainValue> {
        match label {
            ParameterLabel::Named(name) => self.named.get(name),
            ParameterLabel::Positional(n) => self.positional.get(n),
        }
    }
}

/// Produce the ordered relational parameter list for a rendered statement.
pub fn bind_parameters(
    labels: &[ParameterLabel],
    bindings: &ParameterBindings,
) -> Result<Vec<SqlValue>, ExecutionError> {
    let mut bound = Vec::with_capacity(labels.len());
    for label in labels {
        let value = bindings
            .get(label)
            .ok_or_else(|| ExecutionError::MissingParameterBinding(label.to_string()))?;
        bound.push(type_registry::disassemble(value));
    }
    Ok(bound)
}

/// Execute a rendered select and return its lazy result sequence.
pub fn execute_select<'f>(
    executor: &dyn StatementExecutor,
    sql: &str,
    params: &[SqlValue],
    options: &ExecutionOptions,
    plan: Vec<DomainResult>,
    factory: &'f dyn ManagedInstanceFactory,
) -> Result<ResultSequence<'f>, ExecutionError> {
    debug!("executing select: {}", sql);
    let cursor = executor.execute_query(sql, params, options)?;
    Ok(ResultSequence::new(cursor, plan, factory))
}

#[derive(Debug, thiserror::Error)]
pub enum NaturalIdResolutionError {
    #[error(transparent)]
    Key(#[from] crate::cache::CacheKeyError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Resolve a natural id to a primary identifier through the second-level
/// cache region: a hit short-circuits the database round-trip, a miss falls
/// through to `loader` and populates the region with its result.
pub fn resolve_natural_id(
    provider: &dyn crate::cache::CacheRegionProvider,
    region: &str,
    model: &crate::domain_model::DomainModel,
    entity_name: &str,
    tenant: Option<&str>,
    values: &[DomainValue],
    loader: impl FnOnce() -> Result<Option<DomainValue>, ExecutionError>,
) -> Result<Option<DomainValue>, NaturalIdResolutionError> {
    let key = crate::cache::NaturalIdCacheKey::new(model, entity_name, tenant, values)?;
    let cache_key = crate::cache::SecondLevelCacheKey::NaturalId(key);

    if let Some(cached) = provider.get(region, &cache_key) {
        if let Ok(id) = serde_json::from_value::<DomainValue>(cached) {
            debug!("natural-id cache hit for {}", entity_name);
            return Ok(Some(id));
        }
    }

    let loaded = loader()?;
    if let Some(id) = &loaded {
        if let Ok(json) = serde_json::to_value(id) {
            provider.put(region, cache_key, json);
        }
    }
    Ok(loaded)
}
