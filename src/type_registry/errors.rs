use thiserror::Error;

/// Conversion failures are mapping-configuration defects: never retried,
/// always surfaced to the caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeRegistryError {
    #[error("Unknown unwrap: cannot adapt domain value of kind '{actual}' to relational type '{requested}'")]
    UnknownUnwrap { actual: String, requested: String },
    #[error("Unknown wrap: cannot adapt relational value of kind '{actual}' to domain type '{requested}'")]
    UnknownWrap { actual: String, requested: String },
    #[error("No type descriptor registered for basic type '{0}'")]
    NoDescriptor(String),
}
