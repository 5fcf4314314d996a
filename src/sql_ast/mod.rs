//! Dialect-neutral SQL AST: query specs, set-operation groups, table
//! groups, selections, and sort clauses. Built by the translator from an
//! SQM tree, rendered to text by a renderer strategy.

pub mod alias;
pub(crate) mod errors;
pub mod expression;
pub mod from_clause;
pub mod sort;

pub use alias::{SqlAliasBase, SqlAliasBaseManager};
pub use errors::SqlAstError;
pub use expression::{SqlExpression, SqlSelection};
pub use from_clause::{SqlJoinKind, TableGroup, TableGroupJoin, TableReference};
pub use sort::{resolve_positional_sort, SortKey, SortSpecification};

use crate::sqm::nodes::{FetchClauseKind, ParameterLabel, SetOperator};
use crate::type_registry::SqlValue;

/// A limit expression together with how it counts rows. The pair is one
/// value on purpose: a limit without a declared kind cannot exist.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchExpression {
    pub expression: SqlExpression,
    pub kind: FetchClauseKind,
}

/// A simple query spec: select list, from clause, restriction.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub distinct: bool,
    pub selections: Vec<SqlSelection>,
    pub from: TableGroup,
    pub predicate: Option<SqlExpression>,
}

/// Union-family combination of query parts, in operand order.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryGroup {
    pub operator: SetOperator,
    pub parts: Vec<QueryPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryPartKind {
    Spec(QuerySpec),
    Group(QueryGroup),
}

/// A query part: either a simple spec or a set operation over sub-parts.
/// Tracks whether it is the statement root (positional sort items resolve
/// against the root only) and owns the part-level sort/offset/fetch
/// clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPart {
    root: bool,
    pub kind: QueryPartKind,
    pub sorts: Vec<SortSpecification>,
    offset: Option<SqlExpression>,
    fetch: Option<FetchExpression>,
}

impl QueryPart {
    pub fn new(kind: QueryPartKind, root: bool) -> Self {
        QueryPart {
            root,
            kind,
            sorts: Vec::new(),
            offset: None,
            fetch: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    /// Offset and limit are assigned atomically; the limit travels with its
    /// fetch-clause kind inside [`FetchExpression`].
    pub fn set_offset_fetch(
        &mut self,
        offset: Option<SqlExpression>,
        fetch: Option<FetchExpression>,
    ) {
        self.offset = offset;
        self.fetch = fetch;
    }

    pub fn offset(&self) -> Option<&SqlExpression> {
        self.offset.as_ref()
    }

    pub fn fetch(&self) -> Option<&FetchExpression> {
        self.fetch.as_ref()
    }

    /// Visit every leaf query spec in a stable left-to-right order matching
    /// the original statement's operand order.
    pub fn for_each_query_spec(&self, f: &mut dyn FnMut(&QuerySpec)) {
        match &self.kind {
            QueryPartKind::Spec(spec) => f(spec),
            QueryPartKind::Group(group) => {
                for part in &group.parts {
                    part.for_each_query_spec(f);
                }
            }
        }
    }

    /// The leftmost leaf query spec (shape-defining member of a group).
    pub fn first_query_spec(&self) -> Option<&QuerySpec> {
        match &self.kind {
            QueryPartKind::Spec(spec) => Some(spec),
            QueryPartKind::Group(group) => {
                group.parts.first().and_then(|part| part.first_query_spec())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub query_part: QueryPart,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table: TableReference,
    pub assignments: Vec<(String, SqlExpression)>,
    pub predicate: Option<SqlExpression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: TableReference,
    pub columns: Vec<String>,
    pub tuples: Vec<Vec<SqlExpression>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table: TableReference,
    pub predicate: Option<SqlExpression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlStatement {
    Select(SelectStatement),
    Update(UpdateStatement),
    Insert(InsertStatement),
    Delete(DeleteStatement),
}

/// Convenience constructors used by the translator and by tests.
pub fn integer_literal(value: i64) -> SqlExpression {
    SqlExpression::Literal(SqlValue::BigInt(value))
}

pub fn parameter(label: ParameterLabel) -> SqlExpression {
    SqlExpression::Parameter(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::NavigablePath;

    fn spec_selecting(names: &[&str]) -> QuerySpec {
        let selections = names
            .iter()
            .enumerate()
            .map(|(i, name)| SqlSelection {
                jdbc_position: i + 1,
                values_array_position: i,
                expression: SqlExpression::ColumnReference {
                    table_alias: "t1".into(),
                    column_name: (*name).to_string(),
                },
            })
            .collect();
        QuerySpec {
            distinct: false,
            selections,
            from: TableGroup::new(
                NavigablePath::root("e"),
                TableReference {
                    table_name: "t".into(),
                    identification_variable: "t1".into(),
                },
            ),
            predicate: None,
        }
    }

    fn leaf(names: &[&str], root: bool) -> QueryPart {
        QueryPart::new(QueryPartKind::Spec(spec_selecting(names)), root)
    }

    #[test]
    fn test_for_each_query_spec_visits_left_to_right() {
        // ((a UNION b) EXCEPT c) - leaves must be visited a, b, c.
        let inner = QueryPart::new(
            QueryPartKind::Group(QueryGroup {
                operator: SetOperator::Union,
                parts: vec![leaf(&["a"], false), leaf(&["b"], false)],
            }),
            false,
        );
        let outer = QueryPart::new(
            QueryPartKind::Group(QueryGroup {
                operator: SetOperator::Except,
                parts: vec![inner, leaf(&["c"], false)],
            }),
            true,
        );

        let mut visited = Vec::new();
        outer.for_each_query_spec(&mut |spec| {
            if let SqlExpression::ColumnReference { column_name, .. } =
                &spec.selections[0].expression
            {
                visited.push(column_name.clone());
            }
        });
        assert_eq!(visited, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_positional_sort_resolves_against_root() {
        let root = leaf(&["x", "y", "z"], true);
        let resolved = resolve_positional_sort(&root, 2).unwrap();
        assert_eq!(
            resolved,
            SqlExpression::ColumnReference {
                table_alias: "t1".into(),
                column_name: "y".into(),
            }
        );
    }

    #[test]
    fn test_positional_sort_out_of_range() {
        let root = leaf(&["x", "y", "z"], true);
        assert_eq!(
            resolve_positional_sort(&root, 4),
            Err(SqlAstError::PositionalSortOutOfRange {
                position: 4,
                selections: 3,
            })
        );
        assert!(resolve_positional_sort(&root, 0).is_err());
    }

    #[test]
    fn test_positional_sort_rejected_on_nested_part() {
        let nested = leaf(&["x"], false);
        assert_eq!(
            resolve_positional_sort(&nested, 1),
            Err(SqlAstError::PositionalSortInNestedQueryPart)
        );
    }

    #[test]
    fn test_offset_and_fetch_travel_together() {
        let mut part = leaf(&["x"], true);
        part.set_offset_fetch(
            Some(integer_literal(10)),
            Some(FetchExpression {
                expression: integer_literal(5),
                kind: crate::sqm::nodes::FetchClauseKind::PercentWithTies,
            }),
        );
        assert!(part.offset().is_some());
        assert_eq!(
            part.fetch().unwrap().kind,
            crate::sqm::nodes::FetchClauseKind::PercentWithTies
        );
    }
}
