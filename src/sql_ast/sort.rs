use super::errors::SqlAstError;
use super::expression::SqlExpression;
use super::QueryPart;

#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Expression(SqlExpression),
    /// 1-based reference into the root query part's select list.
    SelectedPosition(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortSpecification {
    pub key: SortKey,
    pub descending: bool,
}

/// Resolve a positional sort item against a query part's select list.
///
/// Only the statement root is a valid resolution target: a positional item
/// is only meaningful relative to the outermost select list, so resolving
/// against a nested set-operation branch is rejected rather than guessed.
/// For a root that is itself a set operation, the leftmost leaf query spec
/// supplies the select-list shape (all members share it).
pub fn resolve_positional_sort(
    part: &QueryPart,
    position: u64,
) -> Result<SqlExpression, SqlAstError> {
    if !part.is_root() {
        return Err(SqlAstError::PositionalSortInNestedQueryPart);
    }
    let spec = part
        .first_query_spec()
        .ok_or(SqlAstError::EmptyQueryGroup)?;
    let selections = &spec.selections;
    if position == 0 || position as usize > selections.len() {
        return Err(SqlAstError::PositionalSortOutOfRange {
            position,
            selections: selections.len(),
        });
    }
    Ok(selections[position as usize - 1].expression.clone())
}
