use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SqlAstError {
    #[error("Positional sort item {position} is out of range (the select list has {selections} items)")]
    PositionalSortOutOfRange { position: u64, selections: usize },
    #[error("Positional sort items resolve against the root query part only; a nested set-operation branch cannot carry one")]
    PositionalSortInNestedQueryPart,
    #[error("No table group registered for path '{0}' (joins must be wired before fetches)")]
    NoTableGroup(String),
    #[error("Query group has no leaf query spec")]
    EmptyQueryGroup,
}
