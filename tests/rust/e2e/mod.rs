//! End-to-end tests: compile an EQL statement, execute it against the
//! in-memory executor, and assert on the assembled object graphs.

use std::rc::Rc;

#[path = "../common/fixtures.rs"]
mod fixtures;

use fixtures::{bigint, hr_model, init_test_logging, varchar, InMemoryExecutor};
use relmap::config::EngineConfig;
use relmap::engine::QueryEngine;
use relmap::exec::{AssembledValue, DefaultInstanceFactory, ParameterBindings};
use relmap::type_registry::{DomainValue, SqlColumnType, SqlValue};

fn engine() -> QueryEngine {
    init_test_logging();
    QueryEngine::new(hr_model(), EngineConfig::default())
}

const EMPLOYEE_COLUMNS: &[SqlColumnType] = &[
    SqlColumnType::BigInt,  // id
    SqlColumnType::Varchar, // name
    SqlColumnType::BigInt,  // salary
    SqlColumnType::Varchar, // street
    SqlColumnType::Varchar, // city
    SqlColumnType::BigInt,  // department_id
];

fn employee_row(id: i64, name: &str, salary: i64, dept: i64) -> Vec<SqlValue> {
    vec![
        bigint(id),
        varchar(name),
        bigint(salary),
        varchar("main st"),
        varchar("springfield"),
        bigint(dept),
    ]
}

#[test]
fn test_entity_select_assembles_graph_with_lazy_associations() {
    let engine = engine();
    let compiled = engine.compile("SELECT e FROM Employee e").unwrap();
    let executor = InMemoryExecutor::new(
        EMPLOYEE_COLUMNS,
        vec![employee_row(1, "alice", 100, 10)],
    );
    let factory = DefaultInstanceFactory;

    let mut results = engine
        .execute(&compiled, &ParameterBindings::new(), &executor, &factory)
        .unwrap();

    let tuple = results.next().unwrap().unwrap();
    let employee = tuple[0].as_entity().unwrap().borrow();
    assert_eq!(employee.entity_name, "Employee");
    assert_eq!(employee.id, DomainValue::Integer(1));
    assert_eq!(
        employee.attribute("name").unwrap().as_scalar(),
        Some(&DomainValue::String("alice".to_string()))
    );

    // Embedded composite assembled in place.
    let AssembledValue::Embedded { values, .. } = employee.attribute("address").unwrap() else {
        panic!("expected an embedded address");
    };
    assert_eq!(
        values.iter().find(|(n, _)| n == "city").unwrap().1.as_scalar(),
        Some(&DomainValue::String("springfield".to_string()))
    );

    // Lazy to-one: delayed, key only - not resolved unless accessed.
    let AssembledValue::Delayed { target_entity, key } =
        employee.attribute("department").unwrap()
    else {
        panic!("expected a delayed department");
    };
    assert_eq!(target_entity, "Department");
    assert_eq!(key, &DomainValue::Integer(10));

    // Lazy to-many: loadable by owner key.
    assert!(matches!(
        employee.attribute("projects").unwrap(),
        AssembledValue::LazyCollection { .. }
    ));
}

#[test]
fn test_join_fetch_materializes_association_and_shares_instances() {
    let engine = engine();
    let compiled = engine
        .compile("SELECT e FROM Employee e JOIN FETCH e.department d")
        .unwrap();

    let mut columns = EMPLOYEE_COLUMNS.to_vec();
    columns.push(SqlColumnType::BigInt); // d.id
    columns.push(SqlColumnType::Varchar); // d.name
    let mut row_alice = employee_row(1, "alice", 100, 10);
    row_alice.extend([bigint(10), varchar("eng")]);
    let mut row_bob = employee_row(2, "bob", 90, 10);
    row_bob.extend([bigint(10), varchar("eng")]);

    let executor = InMemoryExecutor::new(&columns, vec![row_alice, row_bob]);
    let factory = DefaultInstanceFactory;
    let results = engine
        .execute(&compiled, &ParameterBindings::new(), &executor, &factory)
        .unwrap();
    let tuples: Vec<_> = results.map(|r| r.unwrap()).collect();
    assert_eq!(tuples.len(), 2);

    let alice = tuples[0][0].as_entity().unwrap();
    let bob = tuples[1][0].as_entity().unwrap();
    assert!(!Rc::ptr_eq(alice, bob));

    let alice_dept = alice
        .borrow()
        .attribute("department")
        .unwrap()
        .as_entity()
        .cloned()
        .unwrap();
    let bob_dept = bob
        .borrow()
        .attribute("department")
        .unwrap()
        .as_entity()
        .cloned()
        .unwrap();
    // Same logical row key resolves to the same instance within one
    // execution.
    assert!(Rc::ptr_eq(&alice_dept, &bob_dept));
    assert_eq!(
        alice_dept.borrow().attribute("name").unwrap().as_scalar(),
        Some(&DomainValue::String("eng".to_string()))
    );
}

#[test]
fn test_join_fetched_collection_accumulates_across_rows() {
    let engine = engine();
    let compiled = engine
        .compile("SELECT e FROM Employee e JOIN FETCH e.projects p")
        .unwrap();

    let mut columns = EMPLOYEE_COLUMNS.to_vec();
    columns.push(SqlColumnType::BigInt); // p.id
    columns.push(SqlColumnType::Varchar); // p.title
    let mut row_one = employee_row(1, "alice", 100, 10);
    row_one.extend([bigint(101), varchar("apollo")]);
    let mut row_two = employee_row(1, "alice", 100, 10);
    row_two.extend([bigint(102), varchar("zeus")]);

    let executor = InMemoryExecutor::new(&columns, vec![row_one, row_two]);
    let factory = DefaultInstanceFactory;
    let results = engine
        .execute(&compiled, &ParameterBindings::new(), &executor, &factory)
        .unwrap();
    let tuples: Vec<_> = results.map(|r| r.unwrap()).collect();
    assert_eq!(tuples.len(), 2);

    // Both rows resolve to the one employee instance...
    let first = tuples[0][0].as_entity().unwrap();
    let second = tuples[1][0].as_entity().unwrap();
    assert!(Rc::ptr_eq(first, second));

    // ...whose collection accumulated both elements.
    let borrowed = first.borrow();
    let AssembledValue::Collection(projects) = borrowed.attribute("projects").unwrap() else {
        panic!("expected a materialized collection");
    };
    let titles: Vec<DomainValue> = projects
        .borrow()
        .iter()
        .map(|p| {
            p.as_entity()
                .unwrap()
                .borrow()
                .attribute("title")
                .unwrap()
                .as_scalar()
                .cloned()
                .unwrap()
        })
        .collect();
    assert_eq!(
        titles,
        vec![
            DomainValue::String("apollo".to_string()),
            DomainValue::String("zeus".to_string()),
        ]
    );
}

#[test]
fn test_scalar_tuples_and_parameter_binding() {
    let engine = engine();
    let compiled = engine
        .compile("SELECT e.name, e.salary FROM Employee e WHERE e.salary > :min")
        .unwrap();
    let executor = InMemoryExecutor::new(
        &[SqlColumnType::Varchar, SqlColumnType::BigInt],
        vec![vec![varchar("alice"), bigint(100)]],
    );
    let factory = DefaultInstanceFactory;
    let bindings = ParameterBindings::new().bind("min", DomainValue::Integer(50));

    let results = engine
        .execute(&compiled, &bindings, &executor, &factory)
        .unwrap();
    let tuples: Vec<_> = results.map(|r| r.unwrap()).collect();
    assert_eq!(tuples.len(), 1);
    assert_eq!(
        tuples[0][0].as_scalar(),
        Some(&DomainValue::String("alice".to_string()))
    );
    assert_eq!(tuples[0][1].as_scalar(), Some(&DomainValue::Integer(100)));

    let executed = executor.executed.borrow();
    assert_eq!(executed[0].1, vec![SqlValue::BigInt(50)]);
}

#[test]
fn test_result_sequence_is_single_pass() {
    let engine = engine();
    let compiled = engine.compile("SELECT e FROM Employee e").unwrap();
    let executor = InMemoryExecutor::new(
        EMPLOYEE_COLUMNS,
        vec![
            employee_row(1, "alice", 100, 10),
            employee_row(2, "bob", 90, 10),
        ],
    );
    let factory = DefaultInstanceFactory;
    let mut results = engine
        .execute(&compiled, &ParameterBindings::new(), &executor, &factory)
        .unwrap();

    let consumed = results.by_ref().count();
    assert_eq!(consumed, 2);
    // Fully consumed: re-iterating yields nothing - the sequence is not
    // restartable.
    assert!(results.next().is_none());
    assert!(results.next().is_none());

    // The cursor was released on exhaustion.
    let closed = executor.last_cursor_closed.borrow();
    assert!(closed.as_ref().unwrap().get());
}

#[test]
fn test_dropping_the_sequence_releases_the_cursor() {
    let engine = engine();
    let compiled = engine.compile("SELECT e FROM Employee e").unwrap();
    let executor = InMemoryExecutor::new(
        EMPLOYEE_COLUMNS,
        vec![
            employee_row(1, "alice", 100, 10),
            employee_row(2, "bob", 90, 10),
        ],
    );
    let factory = DefaultInstanceFactory;
    {
        let mut results = engine
            .execute(&compiled, &ParameterBindings::new(), &executor, &factory)
            .unwrap();
        // Abandon after one tuple.
        let _ = results.next();
    }
    let closed = executor.last_cursor_closed.borrow();
    assert!(closed.as_ref().unwrap().get());
}

#[test]
fn test_null_foreign_key_yields_null_association() {
    let engine = engine();
    let compiled = engine.compile("SELECT e FROM Employee e").unwrap();
    let mut row = employee_row(1, "alice", 100, 0);
    row[5] = SqlValue::Null;
    let executor = InMemoryExecutor::new(EMPLOYEE_COLUMNS, vec![row]);
    let factory = DefaultInstanceFactory;

    let mut results = engine
        .execute(&compiled, &ParameterBindings::new(), &executor, &factory)
        .unwrap();
    let tuple = results.next().unwrap().unwrap();
    let employee = tuple[0].as_entity().unwrap().borrow();
    assert!(matches!(
        employee.attribute("department").unwrap(),
        AssembledValue::Null
    ));
}
