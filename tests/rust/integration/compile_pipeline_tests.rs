use super::fixtures::hr_model;
use relmap::config::EngineConfig;
use relmap::engine::{EngineError, QueryEngine};
use relmap::sqm::nodes::ParameterLabel;
use relmap::sqm::SemanticError;
use serial_test::serial;

fn engine() -> QueryEngine {
    QueryEngine::new(hr_model(), EngineConfig::default())
}

#[test]
fn test_scalar_select_renders_aliased_columns() {
    let compiled = engine()
        .compile("SELECT e.name FROM Employee e WHERE e.salary > :min")
        .unwrap();
    assert_eq!(
        compiled.rendered.sql,
        "select e1.name from employees e1 where e1.salary > ?"
    );
    assert_eq!(
        compiled.rendered.parameters,
        vec![ParameterLabel::Named("min".to_string())]
    );
}

#[test]
fn test_repeated_stems_get_distinct_aliases() {
    // Two joins against the same logical table: departments joined twice.
    let compiled = engine()
        .compile(
            "SELECT e.name, d.name, m.name FROM Employee e \
             JOIN e.department d JOIN e.department m",
        )
        .unwrap();
    let sql = &compiled.rendered.sql;
    assert!(sql.contains("departments d1"), "sql: {}", sql);
    // The second explicit join navigates the same path; it reuses the
    // registered group rather than joining again.
    assert!(!sql.contains("departments d2"), "sql: {}", sql);
}

#[test]
fn test_explicit_join_renders_on_clause() {
    let compiled = engine()
        .compile("SELECT d.name FROM Employee e JOIN e.department d WHERE e.salary > 1")
        .unwrap();
    assert_eq!(
        compiled.rendered.sql,
        "select d1.name from employees e1 \
         join departments d1 on e1.department_id = d1.id \
         where e1.salary > 1"
    );
}

#[test]
fn test_implicit_join_for_association_navigation() {
    // Navigating through the association without declaring a join derives
    // the join during lowering.
    let compiled = engine()
        .compile("SELECT e.department.name FROM Employee e")
        .unwrap();
    assert_eq!(
        compiled.rendered.sql,
        "select d1.name from employees e1 \
         join departments d1 on e1.department_id = d1.id"
    );
}

#[test]
fn test_join_fetch_selects_owner_and_target() {
    let compiled = engine()
        .compile("SELECT e FROM Employee e JOIN FETCH e.department d")
        .unwrap();
    assert_eq!(
        compiled.rendered.sql,
        "select e1.id, e1.name, e1.salary, e1.street, e1.city, e1.department_id, \
         d1.id, d1.name \
         from employees e1 join departments d1 on e1.department_id = d1.id"
    );
    // One top-level result: the employee entity.
    assert_eq!(compiled.translation.result_plan.len(), 1);
}

#[test]
fn test_offset_and_fetch_render_atomically() {
    let compiled = engine()
        .compile(
            "SELECT e.name FROM Employee e ORDER BY e.name \
             OFFSET 10 ROWS FETCH FIRST 5 PERCENT ROWS WITH TIES",
        )
        .unwrap();
    assert!(compiled
        .rendered
        .sql
        .ends_with("order by e1.name offset 10 rows fetch first 5 percent rows with ties"));
}

#[test]
fn test_limit_is_rows_only_shorthand() {
    let compiled = engine()
        .compile("SELECT e.name FROM Employee e LIMIT 3")
        .unwrap();
    assert!(compiled.rendered.sql.ends_with("fetch first 3 rows only"));
}

#[test]
fn test_positional_sort_binds_to_second_item() {
    let compiled = engine()
        .compile("SELECT e.name, e.salary FROM Employee e ORDER BY 2 DESC")
        .unwrap();
    assert!(compiled.rendered.sql.ends_with("order by 2 desc"));
}

#[test]
fn test_positional_sort_out_of_range_is_rejected() {
    let err = engine()
        .compile("SELECT e.name, e.salary FROM Employee e ORDER BY 4")
        .unwrap_err();
    assert!(matches!(err, EngineError::Translation(_)), "got: {}", err);
}

#[test]
fn test_union_preserves_operand_order() {
    let compiled = engine()
        .compile(
            "SELECT e.name FROM Employee e UNION ALL \
             SELECT d.name FROM Department d UNION ALL \
             SELECT p.title FROM Project p",
        )
        .unwrap();
    let sql = &compiled.rendered.sql;
    let employees = sql.find("from employees").unwrap();
    let departments = sql.find("from departments").unwrap();
    let projects = sql.find("from projects").unwrap();
    assert!(employees < departments && departments < projects, "sql: {}", sql);
}

#[test]
fn test_positional_sort_over_union_resolves_against_first_branch() {
    let compiled = engine()
        .compile(
            "SELECT e.name FROM Employee e UNION SELECT d.name FROM Department d ORDER BY 1",
        )
        .unwrap();
    assert!(compiled.rendered.sql.ends_with("order by 1"));

    let err = engine()
        .compile(
            "SELECT e.name FROM Employee e UNION SELECT d.name FROM Department d ORDER BY 2",
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::Translation(_)));
}

#[test]
fn test_illegal_path_dereference_is_an_interpretation_error() {
    let err = engine()
        .compile("SELECT e.name.length FROM Employee e")
        .unwrap_err();
    let EngineError::Semantic(semantic) = err else {
        panic!("expected a semantic error");
    };
    assert!(matches!(
        semantic,
        SemanticError::IllegalPathDereference { .. }
    ));
    let message = semantic.to_string();
    assert!(message.contains("e.name.length"), "message: {}", message);
}

#[test]
fn test_unknown_attribute_names_the_owner() {
    let err = engine()
        .compile("SELECT e.wages FROM Employee e")
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("wages"), "message: {}", message);
    assert!(message.contains("Employee"), "message: {}", message);
}

#[test]
fn test_function_arity_failure_at_compile_time() {
    let err = engine()
        .compile("SELECT substring(e.name) FROM Employee e")
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("between 2 and 3"), "message: {}", message);
    assert!(message.contains("found 1"), "message: {}", message);
}

#[test]
fn test_function_type_failure_at_compile_time() {
    let err = engine()
        .compile("SELECT upper(e.salary) FROM Employee e")
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("character"), "message: {}", message);
}

#[test]
fn test_unknown_function_is_rejected() {
    let err = engine()
        .compile("SELECT frobnicate(e.name) FROM Employee e")
        .unwrap_err();
    assert!(err.to_string().contains("frobnicate"));
}

// Serialized: the engine reads the cache configuration from the
// environment, which the config tests mutate.
#[test]
#[serial]
fn test_compiled_query_cache_round_trip() {
    let engine = engine();
    let first = engine.compile("SELECT e.name  FROM   Employee e").unwrap();
    // Different whitespace, same normalized key.
    let second = engine.compile("SELECT e.name FROM Employee e").unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    let metrics = engine.cache_metrics();
    assert_eq!(metrics.hits, 1);
    assert_eq!(metrics.misses, 1);
}

#[test]
#[serial]
fn test_failed_compilation_publishes_nothing() {
    let engine = engine();
    let query = "SELECT e.nonexistent FROM Employee e";
    assert!(engine.compile(query).is_err());
    assert!(engine.compile(query).is_err());
    // Two misses, no hit: the failure never reached the cache.
    let metrics = engine.cache_metrics();
    assert_eq!(metrics.hits, 0);
    assert_eq!(metrics.size, 0);
}

#[test]
fn test_aggregate_functions_compile() {
    let compiled = engine()
        .compile("SELECT count(e.id), max(e.salary) FROM Employee e")
        .unwrap();
    assert_eq!(
        compiled.rendered.sql,
        "select count(e1.id), max(e1.salary) from employees e1"
    );
}

#[test]
fn test_entity_comparison_compares_identifiers() {
    let compiled = engine()
        .compile("SELECT e.name FROM Employee e JOIN e.department d WHERE e.department = d")
        .unwrap();
    assert!(
        compiled.rendered.sql.contains("where e1.department_id = d1.id"),
        "sql: {}",
        compiled.rendered.sql
    );
}

#[test]
fn test_parameter_order_follows_textual_occurrence() {
    let compiled = engine()
        .compile(
            "SELECT e.name FROM Employee e \
             WHERE e.salary > :min AND e.name LIKE :pattern AND e.salary < :max",
        )
        .unwrap();
    let labels: Vec<String> = compiled
        .rendered
        .parameters
        .iter()
        .map(|l| l.to_string())
        .collect();
    assert_eq!(labels, vec![":min", ":pattern", ":max"]);
}
