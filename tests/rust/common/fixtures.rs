//! Shared test fixtures: a small HR domain model and an in-memory
//! executor/cursor pair standing in for the connection layer.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use relmap::domain_model::{
    AttributeMapping, ColumnMapping, DomainModel, EmbeddableMapping, EntityMapping, FetchTiming,
    IdMapping, NaturalIdMapping, TableMapping,
};
use relmap::exec::{
    ColumnMetadata, ExecutionError, ExecutionOptions, RowCursor, StatementExecutor,
};
use relmap::type_registry::{BasicTypeId, SqlColumnType, SqlValue};

/// Employees with an embedded address, a lazy to-one department, and a lazy
/// to-many project collection; employees have a `name` natural id.
pub fn hr_model() -> Arc<DomainModel> {
    DomainModel::builder()
        .embeddable(EmbeddableMapping {
            embeddable_name: "Address".to_string(),
            attributes: vec![
                AttributeMapping::basic(
                    "street",
                    "street",
                    SqlColumnType::Varchar,
                    BasicTypeId::String,
                ),
                AttributeMapping::basic(
                    "city",
                    "city",
                    SqlColumnType::Varchar,
                    BasicTypeId::String,
                ),
            ],
        })
        .entity(EntityMapping {
            entity_name: "Employee".to_string(),
            table: TableMapping::new("employees"),
            id: IdMapping {
                attribute_name: "id".to_string(),
                column: ColumnMapping::new("id", SqlColumnType::BigInt),
                type_id: BasicTypeId::Integer,
            },
            attributes: vec![
                AttributeMapping::basic(
                    "name",
                    "name",
                    SqlColumnType::Varchar,
                    BasicTypeId::String,
                ),
                AttributeMapping::basic(
                    "salary",
                    "salary",
                    SqlColumnType::BigInt,
                    BasicTypeId::Integer,
                ),
                AttributeMapping::embedded("address", "Address"),
                AttributeMapping::to_one(
                    "department",
                    "Department",
                    "department_id",
                    SqlColumnType::BigInt,
                    FetchTiming::Lazy,
                ),
                AttributeMapping::to_many(
                    "projects",
                    "Project",
                    "employee_id",
                    FetchTiming::Lazy,
                ),
            ],
            natural_id: Some(NaturalIdMapping {
                attribute_names: vec!["name".to_string()],
            }),
        })
        .entity(EntityMapping {
            entity_name: "Department".to_string(),
            table: TableMapping::new("departments"),
            id: IdMapping {
                attribute_name: "id".to_string(),
                column: ColumnMapping::new("id", SqlColumnType::BigInt),
                type_id: BasicTypeId::Integer,
            },
            attributes: vec![AttributeMapping::basic(
                "name",
                "name",
                SqlColumnType::Varchar,
                BasicTypeId::String,
            )],
            natural_id: None,
        })
        .entity(EntityMapping {
            entity_name: "Project".to_string(),
            table: TableMapping::new("projects"),
            id: IdMapping {
                attribute_name: "id".to_string(),
                column: ColumnMapping::new("id", SqlColumnType::BigInt),
                type_id: BasicTypeId::Integer,
            },
            attributes: vec![AttributeMapping::basic(
                "title",
                "title",
                SqlColumnType::Varchar,
                BasicTypeId::String,
            )],
            natural_id: None,
        })
        .build()
        .expect("fixture model must build")
}

/// Cursor over canned rows. The shared `closed` flag lets tests observe
/// cursor release after the sequence is exhausted or dropped.
pub struct VecCursor {
    columns: Vec<ColumnMetadata>,
    rows: std::vec::IntoIter<Vec<SqlValue>>,
    closed: Rc<Cell<bool>>,
}

impl RowCursor for VecCursor {
    fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<SqlValue>>, ExecutionError> {
        Ok(self.rows.next())
    }

    fn close(&mut self) {
        self.closed.set(true);
    }
}

/// In-memory executor: replays canned rows for every query and records the
/// SQL and parameters it saw.
pub struct InMemoryExecutor {
    columns: Vec<ColumnMetadata>,
    rows: Vec<Vec<SqlValue>>,
    pub executed: RefCell<Vec<(String, Vec<SqlValue>)>>,
    pub last_cursor_closed: RefCell<Option<Rc<Cell<bool>>>>,
    pub update_count: u64,
}

impl InMemoryExecutor {
    pub fn new(column_types: &[SqlColumnType], rows: Vec<Vec<SqlValue>>) -> Self {
        let columns = column_types
            .iter()
            .enumerate()
            .map(|(i, t)| ColumnMetadata {
                jdbc_position: i + 1,
                label: format!("c{}", i),
                column_type: *t,
            })
            .collect();
        InMemoryExecutor {
            columns,
            rows,
            executed: RefCell::new(Vec::new()),
            last_cursor_closed: RefCell::new(None),
            update_count: 0,
        }
    }

    pub fn with_update_count(mut self, count: u64) -> Self {
        self.update_count = count;
        self
    }

    pub fn last_sql(&self) -> Option<String> {
        self.executed.borrow().last().map(|(sql, _)| sql.clone())
    }
}

impl StatementExecutor for InMemoryExecutor {
    fn execute_query(
        &self,
        sql: &str,
        params: &[SqlValue],
        _options: &ExecutionOptions,
    ) -> Result<Box<dyn RowCursor>, ExecutionError> {
        self.executed
            .borrow_mut()
            .push((sql.to_string(), params.to_vec()));
        let closed = Rc::new(Cell::new(false));
        *self.last_cursor_closed.borrow_mut() = Some(Rc::clone(&closed));
        Ok(Box::new(VecCursor {
            columns: self.columns.clone(),
            rows: self.rows.clone().into_iter(),
            closed,
        }))
    }

    fn execute_update(
        &self,
        sql: &str,
        params: &[SqlValue],
        _options: &ExecutionOptions,
    ) -> Result<u64, ExecutionError> {
        self.executed
            .borrow_mut()
            .push((sql.to_string(), params.to_vec()));
        Ok(self.update_count)
    }
}

pub fn varchar(s: &str) -> SqlValue {
    SqlValue::Varchar(s.to_string())
}

pub fn bigint(i: i64) -> SqlValue {
    SqlValue::BigInt(i)
}

/// Initialize test logging once; safe to call from every test.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
