//! The criteria builder must produce the same compiled artifacts as the
//! textual front-end, and enforce the same navigation rules.

use super::fixtures::hr_model;
use relmap::config::EngineConfig;
use relmap::engine::QueryEngine;
use relmap::sqm::criteria::CriteriaQuery;
use relmap::sqm::nodes::{ComparisonOp, FetchClauseKind, JoinKind, SqmStatement};
use relmap::sqm::SemanticError;
use relmap::type_registry::DomainValue;

#[test]
fn test_criteria_matches_textual_compilation() {
    let model = hr_model();
    let config = EngineConfig::default();
    let engine = QueryEngine::new(model.clone(), config.clone());

    let query = CriteriaQuery::from_root(&model, &config, "Employee", "e").unwrap();
    let salary = query.path("e.salary").unwrap();
    let predicate = CriteriaQuery::compare(
        ComparisonOp::Gt,
        salary,
        CriteriaQuery::literal(DomainValue::Integer(1000)).unwrap(),
    )
    .unwrap();
    let criteria = query.select("e.name").unwrap().restrict(predicate).build();

    let from_criteria = engine
        .compile_sqm(SqmStatement::Select(criteria))
        .unwrap();
    let from_text = engine
        .compile("SELECT e.name FROM Employee e WHERE e.salary > 1000")
        .unwrap();
    assert_eq!(from_criteria.rendered.sql, from_text.rendered.sql);
}

#[test]
fn test_criteria_join_fetch_and_paging() {
    let model = hr_model();
    let config = EngineConfig::default();
    let engine = QueryEngine::new(model.clone(), config.clone());

    let criteria = CriteriaQuery::from_root(&model, &config, "Employee", "e")
        .unwrap()
        .join("e.department", "d", JoinKind::Inner, true)
        .unwrap()
        .offset(4)
        .fetch_first(2, FetchClauseKind::RowsOnly)
        .build();

    let compiled = engine.compile_sqm(SqmStatement::Select(criteria)).unwrap();
    let from_text = engine
        .compile(
            "SELECT e FROM Employee e JOIN FETCH e.department d \
             OFFSET 4 ROWS FETCH FIRST 2 ROWS ONLY",
        )
        .unwrap();
    assert_eq!(compiled.rendered.sql, from_text.rendered.sql);
}

#[test]
fn test_navigating_a_terminal_scalar_is_rejected() {
    let model = hr_model();
    let config = EngineConfig::default();
    let query = CriteriaQuery::from_root(&model, &config, "Employee", "e").unwrap();

    let name = query.path("e.name").unwrap();
    let err = query.navigate(&name, "length").unwrap_err();
    assert!(matches!(err, SemanticError::IllegalPathDereference { .. }));
}

#[test]
fn test_navigating_an_entity_type_literal_is_always_rejected() {
    let model = hr_model();
    let config = EngineConfig::default();
    let query = CriteriaQuery::from_root(&model, &config, "Employee", "e").unwrap();

    let type_literal = relmap::sqm::nodes::SqmExpression::EntityType {
        alias: "e".to_string(),
        entity_name: "Employee".to_string(),
    };
    let err = query.navigate(&type_literal, "name").unwrap_err();
    assert!(matches!(
        err,
        SemanticError::EntityTypeLiteralDereference { .. }
    ));
}

#[test]
fn test_navigation_extends_association_paths() {
    let model = hr_model();
    let config = EngineConfig::default();
    let query = CriteriaQuery::from_root(&model, &config, "Employee", "e").unwrap();

    let department = query.path("e.department").unwrap();
    let name = query.navigate(&department, "name").unwrap();
    let relmap::sqm::nodes::SqmExpression::Path(path) = name else {
        panic!("expected a path");
    };
    assert_eq!(path.navigable_path.full_path(), "e.department.name");
}

#[test]
fn test_plural_path_rejected_outside_joins() {
    let model = hr_model();
    let config = EngineConfig::default();
    let query = CriteriaQuery::from_root(&model, &config, "Employee", "e").unwrap();
    let err = query.path("e.projects").unwrap_err();
    assert!(matches!(err, SemanticError::PluralPathNotAllowed { .. }));
}
