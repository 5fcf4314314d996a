//! Collaborator traits around statement execution. The core never opens
//! connections itself; it hands rendered SQL and bound parameters to an
//! executor supplied by the owning unit of work and reads rows back through
//! a cursor.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::type_registry::{DomainValue, SqlColumnType, SqlValue};

use super::errors::ExecutionError;
use super::initializer::AssembledValue;

/// Column metadata as reported by the executed statement. Positions are
/// 1-based, matching what drivers report.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    pub jdbc_position: usize,
    pub label: String,
    pub column_type: SqlColumnType,
}

/// Execution-scoped options passed down from the owning unit of work. The
/// pipeline defines no timeout policy of its own.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    pub timeout: Option<Duration>,
    pub tenant: Option<String>,
}

/// Forward-only row cursor over an executed statement.
pub trait RowCursor {
    fn columns(&self) -> &[ColumnMetadata];

    /// Advance and return the next raw row, in column-position order.
    fn next_row(&mut self) -> Result<Option<Vec<SqlValue>>, ExecutionError>;

    /// Release the underlying resource. Called when the result sequence is
    /// exhausted, abandoned, or dropped.
    fn close(&mut self) {}
}

/// Executes rendered statements against a transaction-scoped connection.
/// Blocking: the single suspension point of the pipeline.
pub trait StatementExecutor {
    fn execute_query(
        &self,
        sql: &str,
        params: &[SqlValue],
        options: &ExecutionOptions,
    ) -> Result<Box<dyn RowCursor>, ExecutionError>;

    fn execute_update(
        &self,
        sql: &str,
        params: &[SqlValue],
        options: &ExecutionOptions,
    ) -> Result<u64, ExecutionError>;
}

/// A materialized entity instance. Execution contexts are single-threaded,
/// so instances are shared by `Rc` within one materialization.
#[derive(Debug)]
pub struct EntityInstance {
    pub entity_name: String,
    pub id: DomainValue,
    state: Vec<(String, AssembledValue)>,
}

pub type ManagedInstance = Rc<RefCell<EntityInstance>>;

impl EntityInstance {
    pub fn attribute(&self, name: &str) -> Option<&AssembledValue> {
        self.state
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn set_attribute(&mut self, name: String, value: AssembledValue) {
        if let Some(entry) = self.state.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.state.push((name, value));
        }
    }

    pub fn attributes(&self) -> &[(String, AssembledValue)] {
        &self.state
    }
}

/// Produces live domain-object instances. The core never allocates domain
/// objects directly; result assembly calls through this trait.
pub trait ManagedInstanceFactory {
    fn instantiate(&self, entity_name: &str, id: DomainValue) -> ManagedInstance;
}

/// Plain factory building bare instances; enough for tests and for callers
/// without bytecode-enhanced models.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultInstanceFactory;

impl ManagedInstanceFactory for DefaultInstanceFactory {
    fn instantiate(&self, entity_name: &str, id: DomainValue) -> ManagedInstance {
        Rc::new(RefCell::new(EntityInstance {
            entity_name: entity_name.to_string(),
            id,
            state: Vec::new(),
        }))
    }
}
