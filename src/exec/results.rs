//! The lazy result sequence: a single-pass, non-restartable, pull-based
//! sequence of assembled tuples over an open cursor.

use log::debug;

use crate::translator::result_plan::DomainResult;
use crate::type_registry::SqlValue;
use crate::utils::row_position;

use super::context::ExecutionContext;
use super::errors::ExecutionError;
use super::executor::{ManagedInstanceFactory, RowCursor};
use super::initializer::{AssembledValue, Initializer};

/// Lazily materializing sequence of result tuples. Consuming it advances
/// the underlying cursor; previously-yielded tuples cannot be re-fetched by
/// re-iterating. Dropping the sequence releases the cursor.
pub struct ResultSequence<'f> {
    cursor: Box<dyn RowCursor>,
    plan: Vec<DomainResult>,
    ctx: ExecutionContext,
    factory: &'f dyn ManagedInstanceFactory,
    row_buffer: Vec<SqlValue>,
    finished: bool,
}

impl<'f> ResultSequence<'f> {
    pub fn new(
        cursor: Box<dyn RowCursor>,
        plan: Vec<DomainResult>,
        factory: &'f dyn ManagedInstanceFactory,
    ) -> Self {
        ResultSequence {
            cursor,
            plan,
            ctx: ExecutionContext::new(),
            factory,
            row_buffer: Vec::new(),
            finished: false,
        }
    }

    /// Abandon the sequence, releasing the cursor. Further iteration yields
    /// nothing.
    pub fn cancel(&mut self) {
        if !self.finished {
            self.finished = true;
            self.cursor.close();
            debug!("execution {}: result sequence canceled", self.ctx.execution_id);
        }
    }

    fn fill_row_buffer(&mut self, raw_row: Vec<SqlValue>) -> Result<(), ExecutionError> {
        let columns = self.cursor.columns();
        if raw_row.len() < columns.len() {
            return Err(ExecutionError::RowShapeMismatch {
                expected: columns.len(),
                found: raw_row.len(),
            });
        }
        // The raw row arrives in column order; each value lands in the slot
        // derived from its reported 1-based position through the shared
        // translation helper.
        self.row_buffer.clear();
        self.row_buffer.resize(columns.len(), SqlValue::Null);
        for (index, value) in raw_row.into_iter().enumerate().take(columns.len()) {
            let slot = row_position::values_array_position(columns[index].jdbc_position);
            self.row_buffer[slot] = value;
        }
        Ok(())
    }

    fn assemble_tuple(&mut self) -> Result<Vec<AssembledValue>, ExecutionError> {
        let mut tuple = Vec::with_capacity(self.plan.len());
        for result in &self.plan {
            let initializer = self.ctx.initializer_for(result.navigable_path(), || {
                match result {
                    DomainResult::Scalar(scalar) => Initializer::Scalar(scalar.clone()),
                    DomainResult::Entity(entity) => Initializer::Entity(entity.clone()),
                    DomainResult::Embedded(embedded) => Initializer::Embedded(embedded.clone()),
                }
            });
            tuple.push(initializer.resolve(&self.row_buffer, &mut self.ctx, self.factory)?);
        }
        Ok(tuple)
    }
}

impl Iterator for ResultSequence<'_> {
    type Item = Result<Vec<AssembledValue>, ExecutionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let raw_row = match self.cursor.next_row() {
            Ok(Some(row)) => row,
            Ok(None) => {
                self.finished = true;
                self.cursor.close();
                return None;
            }
            Err(err) => {
                // Abort cleanly: release the cursor, yield the error once.
                self.finished = true;
                self.cursor.close();
                return Some(Err(err));
            }
        };
        if let Err(err) = self.fill_row_buffer(raw_row) {
            self.finished = true;
            self.cursor.close();
            return Some(Err(err));
        }
        match self.assemble_tuple() {
            Ok(tuple) => Some(Ok(tuple)),
            Err(err) => {
                self.finished = true;
                self.cursor.close();
                Some(Err(err))
            }
        }
    }
}

impl Drop for ResultSequence<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.cursor.close();
        }
    }
}
