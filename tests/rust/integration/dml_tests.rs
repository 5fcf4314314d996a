//! DML compilation: update/insert/delete lowering, diagnostic regeneration,
//! and execution through the executor collaborator.

use super::fixtures::{hr_model, InMemoryExecutor};
use relmap::config::EngineConfig;
use relmap::engine::QueryEngine;
use relmap::exec::ParameterBindings;
use relmap::sqm::nodes::SqmStatement;
use relmap::type_registry::DomainValue;

fn engine() -> QueryEngine {
    QueryEngine::new(hr_model(), EngineConfig::default())
}

#[test]
fn test_update_renders_assignments_in_order() {
    let compiled = engine()
        .compile("UPDATE Employee e SET e.salary = e.salary * 2, e.name = :name WHERE e.id = :id")
        .unwrap();
    assert_eq!(
        compiled.rendered.sql,
        "update employees set salary = (employees.salary * 2), name = ? \
         where employees.id = ?"
    );
}

#[test]
fn test_update_statement_regenerates_set_clause() {
    let compiled = engine()
        .compile("UPDATE Employee e SET e.salary = e.salary * 2, e.name = :name")
        .unwrap();
    let SqmStatement::Update(update) = &compiled.statement else {
        panic!("expected an update");
    };
    assert_eq!(
        update.to_string(),
        "update Employee e set e.salary = e.salary * 2, e.name = :name"
    );
}

#[test]
fn test_insert_values_render_tuples_in_order() {
    let compiled = engine()
        .compile("INSERT INTO Employee (name, salary) VALUES ('alice', 100), ('bob', 200)")
        .unwrap();
    assert_eq!(
        compiled.rendered.sql,
        "insert into employees (name, salary) values ('alice', 100), ('bob', 200)"
    );

    let SqmStatement::Insert(insert) = &compiled.statement else {
        panic!("expected an insert");
    };
    assert_eq!(
        insert.to_string(),
        "insert into Employee (name, salary) values ('alice', 100), ('bob', 200)"
    );
}

#[test]
fn test_insert_tuple_arity_is_checked() {
    let err = engine()
        .compile("INSERT INTO Employee (name, salary) VALUES ('alice')")
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("2 target columns"), "message: {}", message);
}

#[test]
fn test_delete_with_predicate() {
    let compiled = engine()
        .compile("DELETE FROM Employee e WHERE e.salary < 100")
        .unwrap();
    assert_eq!(
        compiled.rendered.sql,
        "delete from employees where employees.salary < 100"
    );
}

#[test]
fn test_association_assignment_writes_the_foreign_key() {
    let compiled = engine()
        .compile("UPDATE Employee e SET e.department = :dept")
        .unwrap();
    assert_eq!(
        compiled.rendered.sql,
        "update employees set department_id = ?"
    );
}

#[test]
fn test_execute_update_binds_parameters_in_order() {
    let engine = engine();
    let compiled = engine
        .compile("UPDATE Employee e SET e.name = :name WHERE e.id = :id")
        .unwrap();
    let executor = InMemoryExecutor::new(&[], Vec::new()).with_update_count(3);
    let bindings = ParameterBindings::new()
        .bind("name", DomainValue::String("carol".to_string()))
        .bind("id", DomainValue::Integer(7));

    let affected = engine
        .execute_update(&compiled, &bindings, &executor)
        .unwrap();
    assert_eq!(affected, 3);

    let executed = executor.executed.borrow();
    let (_, params) = &executed[0];
    assert_eq!(
        params,
        &vec![
            relmap::type_registry::SqlValue::Varchar("carol".to_string()),
            relmap::type_registry::SqlValue::BigInt(7),
        ]
    );
}

#[test]
fn test_missing_binding_fails_before_execution() {
    let engine = engine();
    let compiled = engine
        .compile("UPDATE Employee e SET e.name = :name")
        .unwrap();
    let executor = InMemoryExecutor::new(&[], Vec::new());
    let err = engine
        .execute_update(&compiled, &ParameterBindings::new(), &executor)
        .unwrap_err();
    assert!(err.to_string().contains(":name"), "got: {}", err);
    assert!(executor.executed.borrow().is_empty());
}

#[test]
fn test_null_literal_typed_by_assignment_target() {
    let compiled = engine()
        .compile("UPDATE Employee e SET e.name = NULL")
        .unwrap();
    assert_eq!(compiled.rendered.sql, "update employees set name = null");
}
