use thiserror::Error;

use crate::domain_model::errors::DomainModelError;
use crate::sql_ast::SqlAstError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranslationError {
    #[error("Unknown identification variable '{0}' during lowering")]
    UnknownAlias(String),
    #[error("Path '{path}' is not translatable in a DML statement (only columns of the target table)")]
    UnsupportedDmlPath { path: String },
    #[error("Plural path '{0}' cannot be lowered as a value expression")]
    PluralValuePath(String),
    #[error("Embedded value '{path}' cannot be used as a comparison operand")]
    EmbeddedValueExpression { path: String },
    #[error("Sort expression over a set operation must match a selected item of the first branch")]
    SortNotInSelectList,
    #[error(transparent)]
    Type(#[from] crate::type_registry::TypeRegistryError),
    #[error(transparent)]
    DomainModel(#[from] DomainModelError),
    #[error(transparent)]
    SqlAst(#[from] SqlAstError),
}
